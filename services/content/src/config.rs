use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the content service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Object storage configuration
    #[serde(default)]
    pub spaces: SpacesConfig,
    /// Rating aggregation configuration
    #[serde(default)]
    pub ratings: RatingsConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// S3-compatible object storage (DigitalOcean Spaces)
#[derive(Debug, Clone, Deserialize)]
pub struct SpacesConfig {
    /// Bucket for uploaded images
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Region passed to the SDK
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint URL of the Spaces region
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    /// Force path-style access (MinIO, LocalStack)
    #[serde(default)]
    pub force_path_style: bool,
    /// Canned ACL applied to every upload
    #[serde(default = "default_acl")]
    pub acl: String,
    /// Base URL for public object links; derived from bucket and endpoint when unset
    pub public_base_url: Option<String>,
    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Rating aggregation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingsConfig {
    /// Per-call timeout for rating fetches in milliseconds (unset = wait indefinitely)
    pub fetch_timeout_ms: Option<u64>,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Link returned from the root route
    #[serde(default = "default_docs_url")]
    pub docs_url: String,
}

// Default value functions
fn default_service_name() -> String {
    "content-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_bucket() -> String {
    "oasys-space".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_endpoint_url() -> String {
    "https://nyc3.digitaloceanspaces.com".to_string()
}

fn default_acl() -> String {
    "public-read".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_docs_url() -> String {
    "https://docs.google.com/document/d/1aRe4420DifJNUmK-BPdQocBaC6b8LkowPVv4TJN0jJQ/edit?usp=sharing"
        .to_string()
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", "content-service")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            .add_source(config::File::with_name("config/content").required(false))
            .add_source(config::File::with_name("/etc/oasys/content").required(false))
            // CONTENT__DATABASE__URL -> database.url
            .add_source(
                config::Environment::with_prefix("CONTENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Per-call timeout for rating fetches, if configured
    pub fn rating_fetch_timeout(&self) -> Option<Duration> {
        self.ratings.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for SpacesConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: default_endpoint_url(),
            force_path_style: false,
            acl: default_acl(),
            public_base_url: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            docs_url: default_docs_url(),
        }
    }
}
