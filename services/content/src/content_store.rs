use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::{
    AnalyticsEvent, AnalyticsRecord, Content, ContentPreview, Profile, RatingRecord,
    SaveContentRequest, SaveMode, UsernameOutcome,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

const CONTENT_COLUMNS: &str = r#"
    user_id, content_id, title, description, tags, picture, url,
    published, body, created_at, updated_at
"#;

const RATING_COLUMNS: &str = "id, user_id, content_id, rating, access_user, created_at";

const ANALYTICS_COLUMNS: &str = "id, user_id, creator_id, content_id, details, created_at";

/// Source of individual rating records for a (user, content) pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingSource: Send + Sync {
    async fn fetch_ratings(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> Result<Vec<RatingRecord>, StoreError>;
}

/// Source of published content previews
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn fetch_content_previews(&self) -> Result<Vec<ContentPreview>, StoreError>;
}

/// Postgres-backed store for contents, ratings, users and analytics
pub struct ContentStore {
    pool: PgPool,
}

impl ContentStore {
    /// Create a new store with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get a content document by owner and id
    #[instrument(skip(self))]
    pub async fn get_content(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> Result<Option<Content>, StoreError> {
        let sql = format!(
            "SELECT {} FROM contents WHERE user_id = $1 AND content_id = $2",
            CONTENT_COLUMNS
        );

        let content = sqlx::query_as::<_, Content>(&sql)
            .bind(user_id)
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(content)
    }

    /// Insert or replace a content document
    #[instrument(skip(self, request))]
    pub async fn save_content(
        &self,
        user_id: &str,
        content_id: &str,
        request: &SaveContentRequest,
        mode: SaveMode,
    ) -> Result<Content, StoreError> {
        let body = serde_json::Value::Object(request.body.clone());

        let sql = format!(
            r#"
            INSERT INTO contents (
                user_id, content_id, title, description, tags,
                picture, url, published, body, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()
            )
            ON CONFLICT (user_id, content_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                tags = EXCLUDED.tags,
                picture = COALESCE(EXCLUDED.picture, contents.picture),
                url = EXCLUDED.url,
                published = EXCLUDED.published,
                body = EXCLUDED.body,
                updated_at = NOW()
            RETURNING {}
            "#,
            CONTENT_COLUMNS
        );

        let content = sqlx::query_as::<_, Content>(&sql)
            .bind(user_id)
            .bind(content_id)
            .bind(&request.title)
            .bind(&request.description)
            .bind(&request.tags)
            .bind(&request.picture)
            .bind(&request.url)
            .bind(mode == SaveMode::Publish)
            .bind(&body)
            .fetch_one(&self.pool)
            .await?;

        debug!(published = content.published, "Content saved");
        metrics::counter!("content.contents.saved").increment(1);

        Ok(content)
    }

    /// Set the cover picture of a content document, creating a draft if needed
    #[instrument(skip(self))]
    pub async fn set_title_picture(
        &self,
        user_id: &str,
        content_id: &str,
        picture_url: &str,
    ) -> Result<Content, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO contents (user_id, content_id, picture, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (user_id, content_id) DO UPDATE SET
                picture = EXCLUDED.picture,
                updated_at = NOW()
            RETURNING {}
            "#,
            CONTENT_COLUMNS
        );

        let content = sqlx::query_as::<_, Content>(&sql)
            .bind(user_id)
            .bind(content_id)
            .bind(picture_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(content)
    }

    /// Record a rating; a rater has at most one rating per content item
    #[instrument(skip(self))]
    pub async fn write_rating(
        &self,
        user_id: &str,
        content_id: &str,
        rating: f64,
        access_user: &str,
    ) -> Result<RatingRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO ratings (id, user_id, content_id, rating, access_user, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, content_id, access_user) DO UPDATE SET
                rating = EXCLUDED.rating,
                created_at = NOW()
            RETURNING {}
            "#,
            RATING_COLUMNS
        );

        let record = sqlx::query_as::<_, RatingRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(content_id)
            .bind(rating)
            .bind(access_user)
            .fetch_one(&self.pool)
            .await?;

        metrics::counter!("content.ratings.written").increment(1);

        Ok(record)
    }

    /// All ratings submitted for contents owned by a user
    #[instrument(skip(self))]
    pub async fn ratings_for_owner(&self, user_id: &str) -> Result<Vec<RatingRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM ratings WHERE user_id = $1 ORDER BY created_at DESC",
            RATING_COLUMNS
        );

        let ratings = sqlx::query_as::<_, RatingRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ratings)
    }

    /// Claim a username for a user
    #[instrument(skip(self))]
    pub async fn set_username(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<UsernameOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET username = EXCLUDED.username
            "#,
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(UsernameOutcome::Assigned),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                debug!("Username already taken");
                Ok(UsernameOutcome::Taken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set the profile picture of a user, creating the user if needed
    #[instrument(skip(self))]
    pub async fn set_profile_picture(
        &self,
        user_id: &str,
        picture_url: &str,
    ) -> Result<Profile, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO users (user_id, profile_picture, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET profile_picture = EXCLUDED.profile_picture
            RETURNING user_id, username, profile_picture, created_at
            "#,
        )
        .bind(user_id)
        .bind(picture_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, username, profile_picture, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Store a content access event
    #[instrument(skip(self, event), fields(content_id = %event.content_id))]
    pub async fn write_analytics(&self, event: &AnalyticsEvent) -> Result<AnalyticsRecord, StoreError> {
        let details = serde_json::Value::Object(event.details.clone());

        let sql = format!(
            r#"
            INSERT INTO analytics (id, user_id, creator_id, content_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {}
            "#,
            ANALYTICS_COLUMNS
        );

        let record = sqlx::query_as::<_, AnalyticsRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&event.user_id)
            .bind(&event.creator_id)
            .bind(&event.content_id)
            .bind(&details)
            .fetch_one(&self.pool)
            .await?;

        metrics::counter!("content.analytics.recorded").increment(1);

        Ok(record)
    }

    /// Access events where the user was the viewer
    pub async fn analytics_for_viewer(&self, user_id: &str) -> Result<Vec<AnalyticsRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM analytics WHERE user_id = $1 ORDER BY created_at DESC",
            ANALYTICS_COLUMNS
        );

        let records = sqlx::query_as::<_, AnalyticsRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Access events on any content the user created
    pub async fn analytics_for_creator(&self, creator_id: &str) -> Result<Vec<AnalyticsRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM analytics WHERE creator_id = $1 ORDER BY created_at DESC",
            ANALYTICS_COLUMNS
        );

        let records = sqlx::query_as::<_, AnalyticsRecord>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Access events on one content item
    pub async fn analytics_for_content(
        &self,
        creator_id: &str,
        content_id: &str,
    ) -> Result<Vec<AnalyticsRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM analytics
            WHERE creator_id = $1 AND content_id = $2
            ORDER BY created_at DESC
            "#,
            ANALYTICS_COLUMNS
        );

        let records = sqlx::query_as::<_, AnalyticsRecord>(&sql)
            .bind(creator_id)
            .bind(content_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Get the connection pool (for health checks)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RatingSource for ContentStore {
    #[instrument(skip(self))]
    async fn fetch_ratings(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> Result<Vec<RatingRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM ratings WHERE user_id = $1 AND content_id = $2",
            RATING_COLUMNS
        );

        let ratings = sqlx::query_as::<_, RatingRecord>(&sql)
            .bind(user_id)
            .bind(content_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ratings)
    }
}

#[async_trait]
impl PreviewSource for ContentStore {
    #[instrument(skip(self))]
    async fn fetch_content_previews(&self) -> Result<Vec<ContentPreview>, StoreError> {
        let previews = sqlx::query_as::<_, ContentPreview>(
            r#"
            SELECT user_id, content_id, picture, title, description, tags, url
            FROM contents
            WHERE published
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = previews.len(), "Loaded published previews");

        Ok(previews)
    }
}
