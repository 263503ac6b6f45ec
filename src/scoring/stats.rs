//! Dataset statistics consumed by the scoring methods
//!
//! Statistics are computed fresh from the full batch each time scoring
//! runs and treated as an immutable snapshot; nothing here is cached
//! across batches.

use crate::listing::Listing;

/// Aggregate statistics derived once per batch
///
/// The arithmetic means feed the classic method and are sensitive to
/// outliers by design; the order statistics feed the enhanced family and
/// are not.
#[derive(Debug, Clone, Copy)]
pub struct DatasetStats {
    /// Arithmetic mean of all ratings (zeros included)
    pub mean_rating: f64,

    /// Arithmetic mean of all review counts
    pub mean_reviews: f64,

    /// Median of the positive ratings
    pub median_rating: f64,

    /// 25th percentile of the positive review counts
    pub p25_reviews: f64,

    /// 25th percentile of the positive prices
    pub p25_price: f64,

    /// Largest review count in the batch, floored at 1 so logarithmic
    /// bonuses stay defined for all-zero batches
    pub max_reviews: f64,
}

impl DatasetStats {
    /// Computes statistics over a batch of listings
    ///
    /// An empty batch yields all-zero statistics (max reviews floored at
    /// 1); a single-listing batch degrades each order statistic to that
    /// listing's value.
    pub fn compute(listings: &[Listing]) -> Self {
        let ratings: Vec<f64> = listings.iter().map(|l| l.rating).collect();
        let counts: Vec<f64> = listings.iter().map(|l| l.reviews as f64).collect();

        let positive_ratings: Vec<f64> = ratings.iter().copied().filter(|r| *r > 0.0).collect();
        let positive_counts: Vec<f64> = counts.iter().copied().filter(|c| *c > 0.0).collect();
        let positive_prices: Vec<f64> = listings
            .iter()
            .map(|l| l.price)
            .filter(|p| *p > 0.0)
            .collect();

        let max_reviews = counts.iter().copied().fold(1.0_f64, f64::max);

        Self {
            mean_rating: mean(&ratings),
            mean_reviews: mean(&counts),
            median_rating: median(&positive_ratings),
            p25_reviews: percentile(&positive_counts, 0.25),
            p25_price: percentile(&positive_prices, 0.25),
            max_reviews,
        }
    }
}

/// Arithmetic mean; 0 for an empty slice
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile by sorted index: `floor(len * p)`, clamped into bounds
///
/// Returns 0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = ((sorted.len() as f64) * p).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Median; mean of the middle pair for even lengths, 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
