//! Oasys Content Service
//!
//! HTTP backend for the Oasys content sharing platform. Serves content
//! previews with aggregated ratings, content documents, user profiles,
//! ratings and viewing analytics from PostgreSQL, and uploads images to a
//! DigitalOcean Spaces bucket.
//!
//! ## Rating aggregation
//!
//! For a preview listing, one average-rating lookup is issued per preview,
//! all concurrently. Results are paired back by index so the response order
//! is always the listing order. Unrated content reports a rating of `1.5`.
//! If any lookup fails, the whole listing fails.
//!
//! ```text
//!  GET /GetContentsPreview
//!          │
//!          ▼
//!  ┌──────────────┐   published    ┌──────────────┐
//!  │ Preview      │◀──────────────│ Content      │
//!  │ Composer     │   previews     │ Store (PG)   │
//!  └──────────────┘                └──────────────┘
//!     │  │  │  fan-out                    ▲
//!     ▼  ▼  ▼                             │ ratings per
//!  ┌──────────────┐                       │ (user, content)
//!  │ Rating       │───────────────────────┘
//!  │ Aggregator   │
//!  └──────────────┘
//! ```

pub mod api;
pub mod config;
pub mod content_store;
pub mod error;
pub mod models;
pub mod previews;
pub mod ratings;
pub mod s3_uploader;

pub use api::{create_router, start_api_server, AppState};
pub use config::Config;
pub use content_store::{ContentStore, PreviewSource, RatingSource};
pub use error::{RatingError, ServiceError, StoreError};
pub use models::{ContentPreview, RatedPreview, RatingRecord};
pub use previews::PreviewComposer;
pub use ratings::{average_rating, RatingAggregator, DEFAULT_RATING};
pub use s3_uploader::ImageUploader;
