//! Merges explainer output back onto the computed ranking.
//!
//! Two different situations end up with boilerplate text: the explainer did not answer at all
//! (every candidate is rendered from [`ExplanationSource::Fallback`]), or it answered but had
//! nothing usable for a particular candidate (`ExplanationSource::Explainer(None)`). Both go
//! through [`render_explanation`].

use crate::domain::contract::{CandidateRankExplain, RankExplainResponse};
use crate::domain::recommendation::RankedCandidate;
use crate::llm::{Explanations, RawExplanation};
use crate::rank::normalize::loose_f64;
use serde_json::Value;
use std::collections::HashMap;

pub const FALLBACK_SUMMARY: &str = "기준 매물과 조건이 비교적 유사해 보일 수 있어요.";
pub const GENERIC_SUMMARY: &str =
    "두집이가 보기엔, 기준 매물과 조건이 꽤 비슷한 편이라 한 번 같이 비교해볼 만해요.";

const SITE_VISIT_REASON: &str =
    "조건이 비슷해도 세대/층/단지 분위기에 따라 체감이 달라질 수 있으니 현장도 같이 확인해보면 좋아요.";

/// Explained candidates with fewer reasons than this get boilerplate appended.
const MIN_EXPLAINED_REASONS: usize = 4;
const MAX_OVERRIDE_REASONS: usize = 6;

/// The usable part of one explainer record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplanationOverride {
    pub summary: Option<String>,
    pub reasons: Vec<String>,
    /// Passed through verbatim (trimmed); not limited to the computed codes.
    pub judge_code: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub enum ExplanationSource<'a> {
    Fallback,
    Explainer(Option<&'a ExplanationOverride>),
}

/// Builds the id → override map for one request. Records without an integer id are dropped;
/// when an id repeats, the last record wins.
pub fn index_overrides(results: &[RawExplanation]) -> HashMap<i64, ExplanationOverride> {
    let mut out = HashMap::with_capacity(results.len());
    for raw in results {
        let Some(id) = override_id(&raw.property_id) else {
            tracing::debug!(property_id = %raw.property_id, "dropping explanation without integer id");
            continue;
        };
        out.insert(id, to_override(raw));
    }
    out
}

fn override_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn to_override(raw: &RawExplanation) -> ExplanationOverride {
    let summary = scalar_text(&raw.summary).filter(|s| !s.is_empty());

    ExplanationOverride {
        summary,
        reasons: text_list(&raw.reasons, MAX_OVERRIDE_REASONS),
        judge_code: scalar_text(&raw.judge_code).filter(|s| !s.is_empty()),
        score: loose_f64(&raw.score),
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_list(v: &Value, cap: usize) -> Vec<String> {
    let Some(items) = v.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(scalar_text)
        .filter(|s| !s.is_empty())
        .take(cap)
        .collect()
}

// Numbers in the templates use `Display`: 70.0 renders as "70", 80.2 as "80.2".
fn rating_text(item: &RankedCandidate) -> String {
    item.rating
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn trend_text(item: &RankedCandidate) -> &'static str {
    item.trend.map(|t| t.as_str()).unwrap_or("UNKNOWN")
}

fn fallback_reasons(item: &RankedCandidate) -> Vec<String> {
    vec![
        format!(
            "거리/가격/면적/평점/추세를 종합한 점수가 {}점이에요.",
            item.score
        ),
        format!(
            "평점은 {}점, 거래 추세는 {}로 분석됐어요.",
            rating_text(item),
            trend_text(item)
        ),
    ]
}

fn boilerplate_reasons(item: &RankedCandidate) -> [String; 3] {
    [
        format!(
            "거리·가격·면적·후기·거래흐름을 합쳐서 {}점으로 나왔어요.",
            item.score
        ),
        format!(
            "후기 평점은 {}점, 최근 거래 흐름은 {}로 보여요.",
            rating_text(item),
            trend_text(item)
        ),
        SITE_VISIT_REASON.to_string(),
    ]
}

pub fn render_explanation(
    item: &RankedCandidate,
    source: ExplanationSource<'_>,
    max_reasons: usize,
) -> CandidateRankExplain {
    let (summary, mut reasons, judge_code, score) = match source {
        ExplanationSource::Fallback => (
            FALLBACK_SUMMARY.to_string(),
            fallback_reasons(item),
            item.judge_code.as_str().to_string(),
            item.score,
        ),
        ExplanationSource::Explainer(ov) => {
            let ov = ov.cloned().unwrap_or_default();
            let mut reasons = ov.reasons;
            if reasons.len() < MIN_EXPLAINED_REASONS {
                reasons.extend(boilerplate_reasons(item));
            }
            (
                ov.summary.unwrap_or_else(|| GENERIC_SUMMARY.to_string()),
                reasons,
                ov.judge_code
                    .unwrap_or_else(|| item.judge_code.as_str().to_string()),
                ov.score.unwrap_or(item.score),
            )
        }
    };
    reasons.truncate(max_reasons);

    CandidateRankExplain {
        property_id: item.property_id,
        score,
        judge_code,
        summary,
        reasons,
        breakdown: item.breakdown,
    }
}

/// Response used when the explainer is disabled, unreachable, timed out or unusable.
pub fn fallback_response(
    ranked: &[RankedCandidate],
    max_reasons: usize,
    error: Option<String>,
    raw: Option<String>,
) -> RankExplainResponse {
    let results = ranked
        .iter()
        .map(|item| render_explanation(item, ExplanationSource::Fallback, max_reasons))
        .collect();

    RankExplainResponse {
        error,
        raw,
        ..RankExplainResponse::ok(None, results)
    }
}

/// Response for an explainer that answered. Order follows `ranked`, never the explainer.
pub fn explained_response(
    ranked: &[RankedCandidate],
    explanations: &Explanations,
    max_reasons: usize,
) -> RankExplainResponse {
    let overrides = index_overrides(&explanations.results);

    let unmatched = overrides
        .keys()
        .filter(|id| !ranked.iter().any(|r| r.property_id == **id))
        .count();
    if unmatched > 0 {
        tracing::debug!(unmatched, "explainer returned ids outside the top-K");
    }

    let results = ranked
        .iter()
        .map(|item| {
            let source = ExplanationSource::Explainer(overrides.get(&item.property_id));
            render_explanation(item, source, max_reasons)
        })
        .collect();

    RankExplainResponse::ok(Some(explanations.model.clone()), results)
}
