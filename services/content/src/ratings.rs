//! Rating aggregation.
//!
//! Reduces the individual ratings of one (user, content) pair to an
//! arithmetic mean. An empty rating set resolves to [`DEFAULT_RATING`].

use crate::content_store::RatingSource;
use crate::error::{RatingError, StoreError};
use crate::models::RatingRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Rating reported for content nobody has rated yet
pub const DEFAULT_RATING: f64 = 1.5;

/// Mean of the `rating` field, or [`DEFAULT_RATING`] when there are none
pub fn average_rating(records: &[RatingRecord]) -> f64 {
    if records.is_empty() {
        return DEFAULT_RATING;
    }

    let sum: f64 = records.iter().map(|r| r.rating).sum();
    sum / records.len() as f64
}

/// Computes average ratings from a shared rating source
#[derive(Clone)]
pub struct RatingAggregator {
    source: Arc<dyn RatingSource>,
    fetch_timeout: Option<Duration>,
}

impl RatingAggregator {
    pub fn new(source: Arc<dyn RatingSource>) -> Self {
        Self {
            source,
            fetch_timeout: None,
        }
    }

    /// Bound each rating fetch; without this a fetch waits indefinitely
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Average rating for one (user, content) pair
    #[instrument(skip(self))]
    pub async fn compute_average_rating(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> Result<f64, RatingError> {
        let fetch = self.source.fetch_ratings(user_id, content_id);

        let fetched = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or(Err(StoreError::Timeout(limit))),
            None => fetch.await,
        };

        let records = fetched.map_err(|e| {
            warn!(error = %e, "Rating fetch failed");
            metrics::counter!("content.ratings.failed").increment(1);
            RatingError::StorageUnavailable(e)
        })?;

        let average = average_rating(&records);

        debug!(count = records.len(), average = average, "Rating aggregated");
        metrics::counter!("content.ratings.aggregated").increment(1);

        Ok(average)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content_store::MockRatingSource;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn record(user_id: &str, content_id: &str, rating: f64) -> RatingRecord {
        RatingRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            content_id: content_id.to_string(),
            rating,
            access_user: "rater".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_of_ratings() {
        let records = vec![record("u1", "c1", 4.0), record("u1", "c1", 5.0)];
        assert_eq!(average_rating(&records), 4.5);

        let records = vec![
            record("u1", "c1", 1.0),
            record("u1", "c1", 2.0),
            record("u1", "c1", 2.5),
            record("u1", "c1", 4.5),
        ];
        assert_eq!(average_rating(&records), 2.5);
    }

    #[test]
    fn test_single_rating_is_its_own_average() {
        assert_eq!(average_rating(&[record("u1", "c1", 3.0)]), 3.0);
    }

    #[test]
    fn test_empty_ratings_use_default() {
        assert_eq!(average_rating(&[]), 1.5);
        assert_eq!(average_rating(&[]), DEFAULT_RATING);
    }

    #[tokio::test]
    async fn test_compute_average_queries_the_pair() {
        let mut source = MockRatingSource::new();
        source
            .expect_fetch_ratings()
            .withf(|user_id, content_id| user_id == "u1" && content_id == "c1")
            .times(1)
            .returning(|u, c| Ok(vec![record(u, c, 4.0), record(u, c, 5.0)]));

        let aggregator = RatingAggregator::new(Arc::new(source));
        let average = aggregator.compute_average_rating("u1", "c1").await.unwrap();

        assert_eq!(average, 4.5);
    }

    #[tokio::test]
    async fn test_compute_average_defaults_when_unrated() {
        let mut source = MockRatingSource::new();
        source.expect_fetch_ratings().returning(|_, _| Ok(vec![]));

        let aggregator = RatingAggregator::new(Arc::new(source));

        assert_eq!(
            aggregator.compute_average_rating("u2", "c2").await.unwrap(),
            1.5
        );
    }

    #[tokio::test]
    async fn test_compute_average_is_repeatable() {
        let mut source = MockRatingSource::new();
        source
            .expect_fetch_ratings()
            .times(2)
            .returning(|u, c| Ok(vec![record(u, c, 2.0), record(u, c, 3.0)]));

        let aggregator = RatingAggregator::new(Arc::new(source));
        let first = aggregator.compute_average_rating("u1", "c1").await.unwrap();
        let second = aggregator.compute_average_rating("u1", "c1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, 2.5);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut source = MockRatingSource::new();
        source
            .expect_fetch_ratings()
            .returning(|_, _| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let aggregator = RatingAggregator::new(Arc::new(source));
        let err = aggregator
            .compute_average_rating("u1", "c1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RatingError::StorageUnavailable(StoreError::Database(_))
        ));
    }

    struct SlowSource;

    #[async_trait::async_trait]
    impl RatingSource for SlowSource {
        async fn fetch_ratings(
            &self,
            _user_id: &str,
            _content_id: &str,
        ) -> Result<Vec<RatingRecord>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_reports_storage_unavailable() {
        let aggregator = RatingAggregator::new(Arc::new(SlowSource))
            .with_fetch_timeout(Some(Duration::from_millis(500)));

        let err = aggregator
            .compute_average_rating("u1", "c1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RatingError::StorageUnavailable(StoreError::Timeout(d)) if d == Duration::from_millis(500)
        ));
    }
}
