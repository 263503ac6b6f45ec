//! Batch scoring implementation
//!
//! This module contains the scoring entry point and the per-method
//! formulas. Every method except Wilson is a variant of the shared
//! weighted Bayesian average
//!
//!   base = (v / (v + m)) * R + (m / (v + m)) * C
//!
//! which interpolates between a listing's own rating R (as its review
//! count v grows) and the population prior C (as v approaches zero).
//!
//! Scoring is deterministic: all parameters derive fresh from the batch on
//! every call, and the only side effect is writing each listing's score.
//! The `value` method is a batch-level operation, not a per-listing one:
//! its min-max rescale spans the priced subset of the batch, so a
//! listing's value score depends on the rest of the batch.

use crate::listing::Listing;
use crate::scoring::method::ScoringMethod;
use crate::scoring::stats::DatasetStats;

/// z for a 95% confidence interval
const WILSON_Z: f64 = 1.96;

/// Review count below which the low-volume penalty applies
const LOW_VOLUME_THRESHOLD: f64 = 5.0;

/// Ratings below this are penalized quadratically
const ACCEPTABLE_RATING: f64 = 3.0;

/// Weight of the logarithmic price adjustment in the value method
const PRICE_ADJUST_WEIGHT: f64 = 0.8;

/// Top of the score scale
const SCORE_MAX: f64 = 5.0;

/// Fallback prior when no custom parameters are supplied
const DEFAULT_CUSTOM_C: f64 = 3.5;
const DEFAULT_CUSTOM_M: f64 = 100.0;

/// Confidence-weighting parameters for the Bayesian average
///
/// `c` is the prior (center) rating; `m` is the prior weight expressed in
/// review-count units. Larger `m` pulls low-evidence listings harder
/// toward `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub c: f64,
    pub m: f64,
}

/// Dataset-derived presets for the custom method's parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPreset {
    /// Pessimistic prior: minimum positive rating and review count
    DatasetMin,

    /// Optimistic prior: maximum rating and review count
    DatasetMax,

    /// Arithmetic means, identical to the classic parameters
    DatasetMean,
}

impl ParamPreset {
    /// Parses a preset from its config name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "dataset-min" => Some(Self::DatasetMin),
            "dataset-max" => Some(Self::DatasetMax),
            "dataset-mean" => Some(Self::DatasetMean),
            _ => None,
        }
    }
}

/// Price-range bucket used to relax review expectations
///
/// Expensive listings naturally attract fewer buyers and reviews, so the
/// premium method scales both the prior weight and the low-volume
/// confidence bar down by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    Budget,
    Midrange,
    Premium,
    Luxury,
}

impl PriceTier {
    /// Buckets a price; unknown (zero or negative) prices count as budget
    pub fn from_price(price: f64) -> Self {
        if !price.is_finite() || price <= 50.0 {
            Self::Budget
        } else if price <= 200.0 {
            Self::Midrange
        } else if price <= 500.0 {
            Self::Premium
        } else {
            Self::Luxury
        }
    }

    /// Factor applied to the prior weight `m`
    pub fn prior_multiplier(&self) -> f64 {
        match self {
            Self::Budget => 1.0,
            Self::Midrange => 0.7,
            Self::Premium => 0.5,
            Self::Luxury => 0.3,
        }
    }

    /// Review count at which a listing of this tier earns full confidence
    pub fn low_volume_threshold(&self) -> f64 {
        match self {
            Self::Budget => 5.0,
            Self::Midrange | Self::Premium => 3.0,
            Self::Luxury => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Midrange => "midrange",
            Self::Premium => "premium",
            Self::Luxury => "luxury",
        }
    }
}

/// Classic parameters: arithmetic means over the whole batch
///
/// Sensitive to outliers in both C and m; that is the method's documented
/// tradeoff.
pub fn classic_params(stats: &DatasetStats) -> ScoringParams {
    ScoringParams {
        c: stats.mean_rating,
        m: stats.mean_reviews,
    }
}

/// Enhanced parameters: order statistics resistant to outliers
///
/// C falls back to 3.5 when the batch has no positive ratings; m is
/// floored at 10 review-count units.
pub fn enhanced_params(stats: &DatasetStats) -> ScoringParams {
    let c = if stats.median_rating > 0.0 {
        stats.median_rating
    } else {
        3.5
    };
    ScoringParams {
        c,
        m: stats.p25_reviews.max(10.0),
    }
}

/// Derives custom-method parameters from a dataset preset
pub fn preset_params(preset: ParamPreset, listings: &[Listing]) -> ScoringParams {
    match preset {
        ParamPreset::DatasetMean => classic_params(&DatasetStats::compute(listings)),
        ParamPreset::DatasetMin => {
            let min_rating = listings
                .iter()
                .map(|l| l.rating)
                .filter(|r| *r > 0.0)
                .fold(f64::INFINITY, f64::min);
            let min_reviews = listings
                .iter()
                .map(|l| l.reviews)
                .filter(|v| *v > 0)
                .min();
            ScoringParams {
                c: if min_rating.is_finite() { min_rating } else { 1.0 },
                m: min_reviews.map_or(10.0, |v| v as f64),
            }
        }
        ParamPreset::DatasetMax => {
            let max_rating = listings.iter().map(|l| l.rating).fold(0.0_f64, f64::max);
            let max_reviews = listings.iter().map(|l| l.reviews).max().unwrap_or(0);
            ScoringParams {
                c: if max_rating > 0.0 { max_rating } else { 5.0 },
                m: if max_reviews > 0 {
                    max_reviews as f64
                } else {
                    1000.0
                },
            }
        }
    }
}

/// Scores a batch in place with the chosen method
///
/// Statistics derive fresh from the batch on every call; scoring the same
/// batch twice with the same method produces bit-identical results. An
/// empty batch is a no-op. `custom` supplies the prior for the custom
/// method and optionally overrides the classic prior.
pub fn score_batch(listings: &mut [Listing], method: ScoringMethod, custom: Option<ScoringParams>) {
    if listings.is_empty() {
        return;
    }

    let stats = DatasetStats::compute(listings);

    match method {
        ScoringMethod::Classic => {
            let params = custom.unwrap_or_else(|| classic_params(&stats));
            for listing in listings.iter_mut() {
                listing.score = Some(bayes_base(listing.rating, listing.reviews as f64, params));
            }
        }

        ScoringMethod::Custom => {
            let params = custom.unwrap_or(ScoringParams {
                c: DEFAULT_CUSTOM_C,
                m: DEFAULT_CUSTOM_M,
            });
            for listing in listings.iter_mut() {
                listing.score = Some(bayes_base(listing.rating, listing.reviews as f64, params));
            }
        }

        ScoringMethod::Wilson => {
            for listing in listings.iter_mut() {
                listing.score = Some(wilson_lower_bound(listing.rating, listing.reviews));
            }
        }

        ScoringMethod::Enhanced => {
            let params = enhanced_params(&stats);
            for listing in listings.iter_mut() {
                let v = listing.reviews as f64;
                let base = bayes_base(listing.rating, v, params);
                let score = base
                    * rating_penalty(listing.rating)
                    * low_volume_penalty(v, LOW_VOLUME_THRESHOLD);
                listing.score = Some(score.clamp(0.0, SCORE_MAX));
            }
        }

        ScoringMethod::LogAdjusted => {
            let params = classic_params(&stats);
            for listing in listings.iter_mut() {
                let v = listing.reviews as f64;
                let base = bayes_base(listing.rating, v, params);
                let bonus = if v > 0.0 {
                    0.5 * ((v + 1.0).log10() / (stats.max_reviews + 1.0).log10())
                } else {
                    0.0
                };
                listing.score = Some((base + bonus).min(SCORE_MAX));
            }
        }

        ScoringMethod::Value => score_value(listings, &stats),

        ScoringMethod::Premium => {
            let params = enhanced_params(&stats);
            for listing in listings.iter_mut() {
                let v = listing.reviews as f64;
                let tier = PriceTier::from_price(listing.price);
                let adjusted = ScoringParams {
                    c: params.c,
                    m: params.m * tier.prior_multiplier(),
                };
                let base = bayes_base(listing.rating, v, adjusted);
                let score = base
                    * rating_penalty(listing.rating)
                    * low_volume_penalty(v, tier.low_volume_threshold());
                listing.score = Some(score.clamp(0.0, SCORE_MAX));
            }
        }
    }
}

/// The shared weighted Bayesian average
///
/// Returns 0 when the combined weight is zero (no reviews and no prior),
/// and never returns a non-finite value.
fn bayes_base(rating: f64, reviews: f64, params: ScoringParams) -> f64 {
    let denom = reviews + params.m;
    if denom <= 0.0 {
        return 0.0;
    }
    let score = (reviews / denom) * rating + (params.m / denom) * params.c;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Quadratic falloff for ratings below the acceptable threshold
///
/// 1.0 at rating >= 3, (R/3)^2 below: 0.44 at 2 stars, 0.11 at 1 star.
fn rating_penalty(rating: f64) -> f64 {
    if rating >= ACCEPTABLE_RATING {
        1.0
    } else {
        (rating / ACCEPTABLE_RATING).powi(2)
    }
}

/// Linear confidence ramp for sparsely reviewed listings
///
/// 0.5 at zero reviews up to 1.0 at the threshold.
fn low_volume_penalty(reviews: f64, threshold: f64) -> f64 {
    if reviews >= threshold {
        1.0
    } else {
        0.5 + reviews / (2.0 * threshold)
    }
}

/// Diminishing-returns popularity bonus, 1.0 to 1.3
fn review_volume_bonus(reviews: f64, max_reviews: f64) -> f64 {
    if reviews <= 0.0 {
        1.0
    } else {
        1.0 + 0.3 * ((reviews + 1.0).log10() / (max_reviews + 1.0).log10())
    }
}

/// Lower bound of the Wilson score interval on rating/5, rescaled to 0-5
///
/// A conservative quality estimate under review-count uncertainty. Zero
/// reviews yield exactly 0.
fn wilson_lower_bound(rating: f64, reviews: u64) -> f64 {
    if reviews == 0 {
        return 0.0;
    }

    let n = reviews as f64;
    let z = WILSON_Z;
    let phat = rating / SCORE_MAX;

    let denominator = 1.0 + (z * z) / n;
    let center = phat + (z * z) / (2.0 * n);
    let spread = z * ((phat * (1.0 - phat) + (z * z) / (4.0 * n)) / n).sqrt();

    ((center - spread) / denominator) * SCORE_MAX
}

/// The value method: quality per dollar, batch-normalized
///
/// Quality is the enhanced score times a popularity bonus. Priced listings
/// then gain a logarithmic adjustment against the batch's reference price
/// (its 25th percentile); because that additive term is unbounded, the raw
/// results are min-max rescaled to [0, 5] across the priced subset of the
/// batch. Without the rescale, scores cluster near the cap and lose
/// discriminating power. Unpriced listings pass their clamped quality
/// through unchanged; a missing price is never treated as "free".
fn score_value(listings: &mut [Listing], stats: &DatasetStats) {
    let params = enhanced_params(stats);
    let ref_price = stats.p25_price;

    let mut qualities = Vec::with_capacity(listings.len());
    let mut raws: Vec<Option<f64>> = Vec::with_capacity(listings.len());

    for listing in listings.iter() {
        let v = listing.reviews as f64;
        let base = bayes_base(listing.rating, v, params);
        let quality = base
            * rating_penalty(listing.rating)
            * low_volume_penalty(v, LOW_VOLUME_THRESHOLD)
            * review_volume_bonus(v, stats.max_reviews);
        qualities.push(quality);

        if listing.price > 0.0 && ref_price > 0.0 {
            let adjustment = (ref_price / (listing.price + 0.1 * ref_price)).ln();
            raws.push(Some(quality + PRICE_ADJUST_WEIGHT * adjustment));
        } else {
            raws.push(None);
        }
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for raw in raws.iter().flatten() {
        lo = lo.min(*raw);
        hi = hi.max(*raw);
    }

    for ((listing, raw), quality) in listings.iter_mut().zip(&raws).zip(&qualities) {
        listing.score = Some(match raw {
            Some(raw) if hi > lo => SCORE_MAX * (raw - lo) / (hi - lo),
            Some(raw) => raw.clamp(0.0, SCORE_MAX),
            None => quality.clamp(0.0, SCORE_MAX),
        });
    }
}
