pub mod error;
pub mod gms;
pub mod json;

use crate::domain::listing::Listing;
use crate::domain::recommendation::RankedCandidate;
use serde::Serialize;
use serde_json::{Map, Value};

/// What the explainer gets to see: the base listing and the already ranked top-K.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainInput<'a> {
    pub base: &'a Listing,
    pub candidates: &'a [RankedCandidate],
    pub max_reasons: usize,
    pub mode: &'a str,
}

#[derive(Debug, Clone)]
pub enum ExplainerOutput {
    /// The explainer is switched off (e.g. no credentials). Nothing was called.
    Disabled { reason: String },
    Enabled(Explanations),
}

#[derive(Debug, Clone, Default)]
pub struct Explanations {
    /// Model / prompt version identifier reported back to callers.
    pub model: String,
    pub results: Vec<RawExplanation>,
}

/// One per-candidate record as the explainer produced it. Fields stay loosely typed here;
/// the reconciler decides what is usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExplanation {
    pub property_id: Value,
    pub score: Value,
    pub judge_code: Value,
    pub summary: Value,
    pub reasons: Value,
}

impl RawExplanation {
    /// Reads the prompt's `ai*` keys, falling back to the plain spellings. A record may carry
    /// both (e.g. `propertyId` and `id`); the `ai*`/`propertyId` key wins unless it is null.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let field = |primary: &str, fallback: &str| -> Value {
            obj.get(primary)
                .filter(|v| !v.is_null())
                .or_else(|| obj.get(fallback))
                .cloned()
                .unwrap_or(Value::Null)
        };

        Self {
            property_id: field("propertyId", "id"),
            score: field("aiScore", "score"),
            judge_code: field("aiJudgeCode", "judgeCode"),
            summary: field("aiSummary", "summary"),
            reasons: field("aiReasons", "reasons"),
        }
    }
}

#[async_trait::async_trait]
pub trait Explainer: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Called at most once per request. Any `Err` is treated as "explainer unavailable".
    async fn explain(&self, input: &ExplainInput<'_>) -> anyhow::Result<ExplainerOutput>;
}

/// Used when no explainer credentials are configured.
#[derive(Debug, Clone)]
pub struct DisabledExplainer {
    reason: String,
}

impl DisabledExplainer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Explainer for DisabledExplainer {
    fn provider(&self) -> &'static str {
        "disabled"
    }

    async fn explain(&self, _input: &ExplainInput<'_>) -> anyhow::Result<ExplainerOutput> {
        Ok(ExplainerOutput::Disabled {
            reason: self.reason.clone(),
        })
    }
}
