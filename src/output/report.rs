//! Dataset report for a collected batch
//!
//! This module summarizes a batch the way the selection step presents it:
//! how many listings were collected and what the review/rating landscape
//! looks like, so a sensible scoring method can be picked.

use crate::listing::Listing;

/// Aggregate report over a collected batch
#[derive(Debug, Clone)]
pub struct DatasetReport {
    /// Total listings in the batch
    pub total: usize,

    /// Smallest positive review count, if any listing has reviews
    pub min_reviews: Option<u64>,

    /// Largest review count
    pub max_reviews: u64,

    /// Mean review count
    pub avg_reviews: f64,

    /// Mean rating
    pub avg_rating: f64,

    /// Listings that carry a price
    pub priced: usize,
}

impl DatasetReport {
    /// Computes a report over a batch
    pub fn compute(listings: &[Listing]) -> Self {
        let total = listings.len();
        let min_reviews = listings
            .iter()
            .map(|l| l.reviews)
            .filter(|v| *v > 0)
            .min();
        let max_reviews = listings.iter().map(|l| l.reviews).max().unwrap_or(0);

        let (avg_reviews, avg_rating) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                listings.iter().map(|l| l.reviews as f64).sum::<f64>() / total as f64,
                listings.iter().map(|l| l.rating).sum::<f64>() / total as f64,
            )
        };

        let priced = listings.iter().filter(|l| l.price > 0.0).count();

        Self {
            total,
            min_reviews,
            max_reviews,
            avg_reviews,
            avg_rating,
            priced,
        }
    }
}

/// Prints a report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &DatasetReport) {
    println!("=== Dataset Report ===\n");
    println!("Listings: {}", report.total);
    println!(
        "Reviews: min {} / max {} / avg {:.0}",
        report
            .min_reviews
            .map_or("N/A".to_string(), |v| v.to_string()),
        report.max_reviews,
        report.avg_reviews
    );
    println!("Average rating: {:.2}", report.avg_rating);
    println!("Priced listings: {}/{}", report.priced, report.total);
}
