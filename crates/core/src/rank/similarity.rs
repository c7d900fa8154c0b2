use crate::domain::listing::{DealType, Listing, Trend, MONTHLY_RENT_LITERAL};

/// Distance used when a candidate has none, scoring close to zero.
pub const MISSING_DISTANCE_M: f64 = 99_999.0;

const DISTANCE_HALF_SCORE_M: f64 = 500.0;

pub const TREND_UNKNOWN_SCORE: f64 = 0.3;
const TREND_SAME_SCORE: f64 = 1.0;
const TREND_ONE_FLAT_SCORE: f64 = 0.6;
const TREND_OPPOSITE_SCORE: f64 = 0.2;

/// Relative similarity of `b` to `a`, in `[0, 1]`.
///
/// The gap is measured relative to `a` with a floor of 1.0 on the denominator so values near
/// zero do not blow up. Missing operands are maximally dissimilar.
pub fn sim(a: Option<f64>, b: Option<f64>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let diff = (a - b).abs() / a.abs().max(1.0);
    (1.0 - diff).max(0.0)
}

/// 1.0 at the base listing, 0.5 at 500m, approaching 0 further out.
pub fn dist_score(distance_m: Option<f64>) -> f64 {
    // Negative distances are bad input; read them as "same spot".
    let d = distance_m.unwrap_or(MISSING_DISTANCE_M).max(0.0);
    1.0 / (1.0 + d / DISTANCE_HALF_SCORE_M)
}

pub fn trend_score(base: Option<Trend>, cand: Option<Trend>) -> f64 {
    match (base, cand) {
        (None, _) | (_, None) => TREND_UNKNOWN_SCORE,
        (Some(Trend::Unknown), _) | (_, Some(Trend::Unknown)) => TREND_UNKNOWN_SCORE,
        (Some(b), Some(c)) if b == c => TREND_SAME_SCORE,
        (Some(Trend::Flat), _) | (_, Some(Trend::Flat)) => TREND_ONE_FLAT_SCORE,
        _ => TREND_OPPOSITE_SCORE,
    }
}

/// Whether the listing is a monthly rent, either by deal type or by an `extra.type` marker.
pub fn is_monthly(listing: &Listing) -> bool {
    if listing.deal_type == Some(DealType::MonthlyRent) {
        return true;
    }
    listing
        .extra
        .as_ref()
        .and_then(|extra| extra.get("type"))
        .and_then(|v| v.as_str())
        .is_some_and(|t| t.trim() == MONTHLY_RENT_LITERAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sim_is_bounded_and_reflexive() {
        let values = [0.0, 0.3, 1.0, 59.0, 84.0, -20.0, 1_000_000.0];
        for a in values {
            assert_eq!(sim(Some(a), Some(a)), 1.0);
            assert_eq!(sim(Some(a), None), 0.0);
            assert_eq!(sim(None, Some(a)), 0.0);
            for b in values {
                let s = sim(Some(a), Some(b));
                assert!((0.0..=1.0).contains(&s), "sim({a}, {b}) = {s}");
            }
        }
    }

    #[test]
    fn sim_uses_base_relative_gap() {
        assert!((sim(Some(50.0), Some(45.0)) - 0.9).abs() < 1e-12);
        assert_eq!(sim(Some(10.0), Some(30.0)), 0.0);
        // Denominator floor keeps tiny bases from exploding.
        assert!((sim(Some(0.2), Some(0.7)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn dist_score_decreases_with_distance() {
        assert_eq!(dist_score(Some(0.0)), 1.0);
        assert_eq!(dist_score(Some(500.0)), 0.5);
        let mut prev = dist_score(Some(0.0));
        for d in [1.0, 10.0, 250.0, 500.0, 1_000.0, 10_000.0] {
            let s = dist_score(Some(d));
            assert!(s < prev, "dist_score({d}) = {s} not below {prev}");
            prev = s;
        }
    }

    #[test]
    fn missing_distance_is_nearly_zero() {
        let s = dist_score(None);
        assert_eq!(s, dist_score(Some(MISSING_DISTANCE_M)));
        assert!((s - 0.004975).abs() < 1e-6);
    }

    #[test]
    fn negative_distance_reads_as_zero() {
        assert_eq!(dist_score(Some(-300.0)), 1.0);
    }

    #[test]
    fn trend_table() {
        use Trend::*;
        assert_eq!(trend_score(Some(Up), Some(Up)), 1.0);
        assert_eq!(trend_score(Some(Up), Some(Down)), 0.2);
        assert_eq!(trend_score(Some(Up), Some(Flat)), 0.6);
        assert_eq!(trend_score(Some(Flat), Some(Down)), 0.6);
        assert_eq!(trend_score(Some(Flat), Some(Flat)), 1.0);
        assert_eq!(trend_score(None, Some(Up)), 0.3);
        assert_eq!(trend_score(Some(Down), None), 0.3);
        assert_eq!(trend_score(Some(Unknown), Some(Up)), 0.3);
        assert_eq!(trend_score(Some(Unknown), Some(Unknown)), 0.3);
    }

    #[test]
    fn monthly_detection() {
        let mut l = Listing {
            deal_type: Some(DealType::MonthlyRent),
            ..Listing::default()
        };
        assert!(is_monthly(&l));

        l.deal_type = Some(DealType::DepositLease);
        assert!(!is_monthly(&l));

        l.extra = Some(json!({"type": "월세"}));
        assert!(is_monthly(&l));

        l.deal_type = None;
        l.extra = Some(json!(["월세"]));
        assert!(!is_monthly(&l));
    }
}
