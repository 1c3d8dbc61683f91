//! Records exchanged with the storage collaborator and serialized on the wire.
//!
//! JSON field names are camelCase to match the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Displayable summary of one published content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentPreview {
    /// Owner of the content
    pub user_id: String,
    pub content_id: String,
    /// Cover picture URL
    pub picture: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub url: Option<String>,
}

/// A preview with its aggregated rating attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedPreview {
    #[serde(flatten)]
    pub preview: ContentPreview,
    pub rating: f64,
}

/// One rater's rating for one content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub id: Uuid,
    /// Owner of the rated content
    pub user_id: String,
    pub content_id: String,
    pub rating: f64,
    /// The user who submitted the rating
    pub access_user: String,
    pub created_at: DateTime<Utc>,
}

/// Response for a single-pair average rating lookup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageRatingResponse {
    pub user_id: String,
    pub content_id: String,
    pub rating: f64,
}

/// Full content document
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub user_id: String,
    pub content_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub picture: Option<String>,
    pub url: Option<String>,
    pub published: bool,
    /// Any additional fields the editor sent
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a content document is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Publish,
    Draft,
}

/// Body of a save request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContentRequest {
    /// Loosely typed: `1`, `"1"` and `true` all mean publish
    #[serde(default)]
    pub published: serde_json::Value,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    pub picture: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

impl SaveContentRequest {
    pub fn wants_publish(&self) -> bool {
        match &self.published {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
            serde_json::Value::String(s) => s.trim() == "1",
            _ => false,
        }
    }

    /// Title, description and at least one tag are required to publish
    pub fn is_publishable(&self) -> bool {
        let present = |field: &Option<String>| {
            field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
        };

        present(&self.title)
            && present(&self.description)
            && self.tags.iter().any(|t| !t.trim().is_empty())
    }

    pub fn mode(&self) -> SaveMode {
        if self.wants_publish() {
            SaveMode::Publish
        } else {
            SaveMode::Draft
        }
    }
}

/// Tags arrive either as a JSON array or as one comma-separated string
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Joined(String),
    }

    let tags = match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::List(list)) => list,
        Some(Tags::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of claiming a username
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameOutcome {
    Assigned,
    Taken,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernameResponse {
    #[serde(rename = "userNameExists")]
    pub user_name_exists: bool,
}

impl From<UsernameOutcome> for UsernameResponse {
    fn from(outcome: UsernameOutcome) -> Self {
        Self {
            user_name_exists: outcome == UsernameOutcome::Taken,
        }
    }
}

/// A content access event posted by the client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    /// The viewer
    pub user_id: String,
    pub creator_id: String,
    pub content_id: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Stored content access event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub id: Uuid,
    pub user_id: String,
    pub creator_id: String,
    pub content_id: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
