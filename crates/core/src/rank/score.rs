use crate::domain::listing::Listing;
use crate::domain::recommendation::{Breakdown, JudgeCode};
use crate::rank::normalize::{clamp01, parse_numeric, round2};
use crate::rank::similarity::{dist_score, is_monthly, sim, trend_score};

/// Composite weights per dimension. They sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub dist: f64,
    pub price: f64,
    pub area: f64,
    pub rating: f64,
    pub trend: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.dist + self.price + self.area + self.rating + self.trend
    }
}

pub const SCORE_WEIGHTS: Weights = Weights {
    dist: 0.30,
    price: 0.30,
    area: 0.15,
    rating: 0.15,
    trend: 0.10,
};

// Monthly rent: the rent itself matters more than the deposit.
const RENT_SHARE: f64 = 0.6;
const DEPOSIT_SHARE: f64 = 0.4;

pub fn calc_breakdown(base: &Listing, cand: &Listing) -> Breakdown {
    let price = if is_monthly(base) {
        let rent = sim(
            parse_numeric(base.price.as_deref()),
            parse_numeric(cand.price.as_deref()),
        );
        let deposit = sim(
            parse_numeric(base.deposit.as_deref()),
            parse_numeric(cand.deposit.as_deref()),
        );
        RENT_SHARE * rent + DEPOSIT_SHARE * deposit
    } else {
        sim(
            parse_numeric(base.price.as_deref()),
            parse_numeric(cand.price.as_deref()),
        )
    };

    Breakdown {
        dist: clamp01(Some(dist_score(cand.dist_m))),
        price: clamp01(Some(price)),
        area: clamp01(Some(sim(base.area, cand.area))),
        rating: clamp01(Some(sim(base.rating, cand.rating))),
        trend: clamp01(Some(trend_score(base.trend, cand.trend))),
    }
}

/// Weighted composite in `[0, 100]`, rounded to two decimals (halves away from zero).
pub fn calc_score_0_100(breakdown: &Breakdown) -> f64 {
    let w = SCORE_WEIGHTS;
    let weighted = [
        (w.dist, breakdown.dist),
        (w.price, breakdown.price),
        (w.area, breakdown.area),
        (w.rating, breakdown.rating),
        (w.trend, breakdown.trend),
    ];
    let s = weighted.iter().fold(0.0, |acc, (wk, v)| acc + wk * v);
    round2(s * 100.0)
}

pub fn judge_code(score: f64) -> JudgeCode {
    if score >= 85.0 {
        JudgeCode::StrongReco
    } else if score >= 70.0 {
        JudgeCode::Reco
    } else if score >= 55.0 {
        JudgeCode::Caution
    } else {
        JudgeCode::WeakReco
    }
}
