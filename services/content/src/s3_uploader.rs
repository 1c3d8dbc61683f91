use crate::config::SpacesConfig;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Uploads user images to an S3-compatible bucket and returns public URLs
pub struct ImageUploader {
    client: S3Client,
    bucket: String,
    acl: ObjectCannedAcl,
    public_base_url: String,
    max_upload_bytes: usize,
}

impl ImageUploader {
    /// Create a new uploader using credentials from the environment
    pub async fn new(config: &SpacesConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder =
            S3ConfigBuilder::from(&aws_config).endpoint_url(&config.endpoint_url);

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint_url,
            "Image uploader initialized"
        );

        Self::from_client(client, config)
    }

    /// Wrap an already configured client
    pub fn from_client(client: S3Client, config: &SpacesConfig) -> Result<Self> {
        let public_base_url = match config.public_base_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => public_base_url(&config.endpoint_url, &config.bucket, config.force_path_style)
                .context("Invalid Spaces endpoint URL")?,
        };

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            acl: ObjectCannedAcl::from(config.acl.as_str()),
            public_base_url,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Upload one image and return its public URL
    #[instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn upload_image(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let key = generate_object_key(content_type);

        debug!(key = %key, "Uploading image");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .acl(self.acl.clone())
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .context("Failed to upload image to Spaces")?;

        let url = self.object_url(&key);

        info!(key = %key, url = %url, "Image uploaded successfully");

        Ok(url)
    }

    /// Public URL for an object key
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Object key: millisecond timestamp plus a random suffix.
/// Format: {unix_millis}_{uuid}.{ext}
fn generate_object_key(content_type: &str) -> String {
    format!(
        "{}_{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension_for(content_type)
    )
}

/// File extension for an image content type
fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Virtual-hosted URL `https://{bucket}.{host}` or path-style `{endpoint}/{bucket}`
fn public_base_url(endpoint_url: &str, bucket: &str, path_style: bool) -> Result<String> {
    let endpoint = endpoint_url.trim_end_matches('/');

    if path_style {
        return Ok(format!("{}/{}", endpoint, bucket));
    }

    let (scheme, host) = endpoint
        .split_once("://")
        .context("Endpoint URL has no scheme")?;

    if host.is_empty() {
        anyhow::bail!("Endpoint URL has no host");
    }

    Ok(format!("{}://{}.{}", scheme, bucket, host))
}
