use crate::domain::contract::{RankExplainRequest, RankExplainResponse};
use crate::llm::error::ExplainerDiagnosticsError;
use crate::llm::{ExplainInput, Explainer, ExplainerOutput};
use crate::rank;
use crate::reconcile;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Ranks candidates and asks the explainer (once) to describe the top-K.
///
/// Holds no per-request state; one instance is shared by every request.
#[derive(Clone)]
pub struct RankExplainService {
    explainer: Arc<dyn Explainer>,
    timeout: Duration,
}

impl RankExplainService {
    pub fn new(explainer: Arc<dyn Explainer>, timeout: Duration) -> Self {
        Self { explainer, timeout }
    }

    pub fn provider(&self) -> &'static str {
        self.explainer.provider()
    }

    /// Never fails: an unavailable or misbehaving explainer degrades to template text.
    ///
    /// The request is expected to have passed [`RankExplainRequest::validate`].
    pub async fn rank_explain(&self, req: &RankExplainRequest) -> RankExplainResponse {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "rank_explain",
            %request_id,
            base_id = req.base.property_id,
            candidates_len = req.candidates.len(),
            top_k = req.top_k,
        );
        self.run(req).instrument(span).await
    }

    async fn run(&self, req: &RankExplainRequest) -> RankExplainResponse {
        if req.candidates.is_empty() {
            tracing::info!("no candidates; skipping ranking and explainer");
            return RankExplainResponse::empty();
        }

        let top = rank::rank(&req.base, &req.candidates, req.top_k);

        let input = ExplainInput {
            base: &req.base,
            candidates: &top,
            max_reasons: req.max_reasons,
            mode: &req.mode,
        };

        let provider = self.explainer.provider();
        let outcome = tokio::time::timeout(self.timeout, self.explainer.explain(&input)).await;

        match outcome {
            Ok(Ok(ExplainerOutput::Enabled(explanations))) => {
                tracing::info!(
                    provider,
                    results_len = explanations.results.len(),
                    "explainer answered"
                );
                reconcile::explained_response(&top, &explanations, req.max_reasons)
            }
            Ok(Ok(ExplainerOutput::Disabled { reason })) => {
                tracing::info!(provider, %reason, "explainer disabled; using fallback text");
                reconcile::fallback_response(&top, req.max_reasons, Some(reason), None)
            }
            Ok(Err(err)) => {
                let raw = err
                    .downcast_ref::<ExplainerDiagnosticsError>()
                    .and_then(|diag| diag.raw_output.clone());
                tracing::warn!(provider, error = %format!("{err:#}"), "explainer failed; using fallback text");
                reconcile::fallback_response(&top, req.max_reasons, Some(format!("{err:#}")), raw)
            }
            Err(_) => {
                tracing::warn!(
                    provider,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "explainer timed out; using fallback text"
                );
                let error = format!("explainer timed out after {:?}", self.timeout);
                reconcile::fallback_response(&top, req.max_reasons, Some(error), None)
            }
        }
    }
}
