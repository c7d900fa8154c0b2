use crate::domain::listing::Trend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-dimension similarity of a candidate to the base listing, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    pub dist: f64,
    pub price: f64,
    pub area: f64,
    pub rating: f64,
    pub trend: f64,
}

/// Recommendation strength bucket derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgeCode {
    StrongReco,
    Reco,
    Caution,
    WeakReco,
}

impl JudgeCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongReco => "STRONG_RECO",
            Self::Reco => "RECO",
            Self::Caution => "CAUTION",
            Self::WeakReco => "WEAK_RECO",
        }
    }
}

impl fmt::Display for JudgeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored candidate. Only lives for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub property_id: i64,
    pub score: f64,
    pub judge_code: JudgeCode,
    pub breakdown: Breakdown,

    pub apt_name: Option<String>,
    pub rating: Option<f64>,
    pub trend: Option<Trend>,
    pub price: Option<String>,
    pub deposit: Option<String>,
    pub area: Option<f64>,
    pub dist_m: Option<f64>,
}
