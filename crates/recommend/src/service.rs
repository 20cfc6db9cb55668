use std::sync::Arc;
use std::time::Instant;

use common::ClientId;
use store::Store;

use crate::{
    ContextBuilder, ContextLimits, RecommendRole, RecommendationGenerator,
    RecommendationResponse, Result, build_prompt, parse_recommendations,
};

/// Builds a context, asks the generator, and parses what comes back.
#[derive(Clone)]
pub struct RecommendationService<S: Store> {
    contexts: ContextBuilder<S>,
    generator: Arc<dyn RecommendationGenerator>,
}

impl<S: Store> RecommendationService<S> {
    pub fn new(store: S, generator: Arc<dyn RecommendationGenerator>) -> Self {
        Self {
            contexts: ContextBuilder::new(store),
            generator,
        }
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.contexts = self.contexts.with_limits(limits);
        self
    }

    /// Recommendations for `role`. `caller` selects the purchase history for clients.
    ///
    /// Generator failures surface as [`crate::RecommendError::ExternalService`];
    /// unparseable output yields an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn recommend(
        &self,
        caller: ClientId,
        role: RecommendRole,
    ) -> Result<RecommendationResponse> {
        let start = Instant::now();

        let context = match role {
            RecommendRole::Client => self.contexts.client_context(caller).await?,
            RecommendRole::Owner => self.contexts.owner_context().await?,
        };
        let prompt = build_prompt(role, &context);

        let raw = self.generator.generate(&prompt).await.inspect_err(|e| {
            tracing::error!(%role, error = %e, "Recommendation generator failed");
            metrics::counter!("recommendations_failed_total", "role" => role.as_str())
                .increment(1);
        })?;

        let recommendations = parse_recommendations(&raw, role);

        metrics::counter!("recommendations_served_total", "role" => role.as_str()).increment(1);
        metrics::histogram!("recommendation_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(%role, count = recommendations.len(), "Recommendations served");

        Ok(RecommendationResponse {
            recommendations,
            role,
        })
    }
}
