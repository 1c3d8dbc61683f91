//! Preview composition.
//!
//! Fans out one rating aggregation per preview, joins on all of them and
//! pairs each result with the preview at the same index. Output order always
//! equals input order; completion order of the fetches does not matter.

use crate::error::RatingError;
use crate::models::{ContentPreview, RatedPreview};
use crate::ratings::RatingAggregator;
use futures::future::try_join_all;
use std::time::Instant;
use tracing::{debug, instrument};

/// Attaches aggregated ratings to content previews
#[derive(Clone)]
pub struct PreviewComposer {
    aggregator: RatingAggregator,
}

impl PreviewComposer {
    pub fn new(aggregator: RatingAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &RatingAggregator {
        &self.aggregator
    }

    /// Rate every preview concurrently.
    ///
    /// Duplicated (user, content) pairs are aggregated independently. The
    /// first failed fetch fails the whole composition; outstanding fetches are
    /// dropped and no partial result is returned.
    #[instrument(skip(self, previews), fields(count = previews.len()))]
    pub async fn compose_previews(
        &self,
        previews: Vec<ContentPreview>,
    ) -> Result<Vec<RatedPreview>, RatingError> {
        let started = Instant::now();

        let ratings = try_join_all(previews.iter().map(|preview| {
            self.aggregator
                .compute_average_rating(&preview.user_id, &preview.content_id)
        }))
        .await?;

        let rated: Vec<RatedPreview> = previews
            .into_iter()
            .zip(ratings)
            .map(|(preview, rating)| RatedPreview { preview, rating })
            .collect();

        metrics::counter!("content.previews.composed").increment(1);
        metrics::histogram!("content.previews.compose_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        debug!(count = rated.len(), "Previews composed");

        Ok(rated)
    }
}
