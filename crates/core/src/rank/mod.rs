pub mod normalize;
pub mod score;
pub mod similarity;

use crate::domain::listing::Listing;
use crate::domain::recommendation::RankedCandidate;
use score::{calc_breakdown, calc_score_0_100, judge_code};

/// Scores every candidate against `base` and keeps the `top_k` best.
///
/// Sorting is stable: candidates with equal scores keep their input order.
pub fn rank(base: &Listing, candidates: &[Listing], top_k: usize) -> Vec<RankedCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|c| {
            let breakdown = calc_breakdown(base, c);
            let score = calc_score_0_100(&breakdown);
            RankedCandidate {
                property_id: c.property_id,
                score,
                judge_code: judge_code(score),
                breakdown,
                apt_name: c.apt_name.clone(),
                rating: c.rating,
                trend: c.trend,
                price: c.price.clone(),
                deposit: c.deposit.clone(),
                area: c.area,
                dist_m: c.dist_m,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);

    tracing::debug!(
        candidates_len = candidates.len(),
        top_k,
        kept = ranked.len(),
        "ranked candidates"
    );

    ranked
}
