use crate::domain::listing::Listing;
use crate::domain::recommendation::Breakdown;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=30;
pub const MAX_REASONS_RANGE: RangeInclusive<usize> = 1..=5;

const DEFAULT_TOP_K: usize = 10;
const DEFAULT_MAX_REASONS: usize = 3;
const DEFAULT_MODE: &str = "compare";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankExplainRequest {
    pub base: Listing,
    #[serde(default)]
    pub candidates: Vec<Listing>,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_reasons")]
    pub max_reasons: usize,
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_reasons() -> usize {
    DEFAULT_MAX_REASONS
}

impl RankExplainRequest {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            TOP_K_RANGE.contains(&self.top_k),
            "topK must be between {} and {} (got {})",
            TOP_K_RANGE.start(),
            TOP_K_RANGE.end(),
            self.top_k
        );
        ensure!(
            MAX_REASONS_RANGE.contains(&self.max_reasons),
            "maxReasons must be between {} and {} (got {})",
            MAX_REASONS_RANGE.start(),
            MAX_REASONS_RANGE.end(),
            self.max_reasons
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRankExplain {
    pub property_id: i64,
    pub score: f64,
    /// One of the computed codes, or whatever non-empty code the explainer chose.
    pub judge_code: String,
    pub summary: String,
    pub reasons: Vec<String>,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankExplainResponse {
    pub status: String,
    pub model: Option<String>,
    pub results: Vec<CandidateRankExplain>,
    pub error: Option<String>,
    /// Raw explainer text, only present when the explainer answered with something unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl RankExplainResponse {
    pub fn ok(model: Option<String>, results: Vec<CandidateRankExplain>) -> Self {
        Self {
            status: "ok".to_string(),
            model,
            results,
            error: None,
            raw: None,
        }
    }

    pub fn empty() -> Self {
        Self::ok(None, Vec::new())
    }
}
