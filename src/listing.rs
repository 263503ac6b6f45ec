//! Listing records and field coercion
//!
//! This module defines the two record types the pipeline moves between:
//! - `RawListing`: what a page extractor emits (free-form text fields)
//! - `Listing`: the cleaned record the session accumulates and the scoring
//!   engine annotates
//!
//! Coercion is NaN-safe by contract: malformed rating, review, or price
//! text becomes 0, never a NaN that could propagate into a score.

use serde::{Deserialize, Serialize};

/// A listing as extracted from a results page, before cleaning
///
/// All numeric fields are kept as raw text because extractors deal in
/// whatever the page markup contains ("4.5 out of 5", "1,234", "$29.99").
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    /// Listing title text
    pub title: String,

    /// Stable platform identifier, if the page exposes one
    pub id: Option<String>,

    /// Raw rating text
    pub rating: Option<String>,

    /// Raw review-count text
    pub reviews: Option<String>,

    /// Raw price text
    pub price: Option<String>,

    /// Listing URL, if extracted
    pub url: Option<String>,
}

/// A cleaned listing record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Listing title
    pub title: String,

    /// Stable dedup key: platform id when present, otherwise derived from
    /// the normalized title and price
    pub identity_key: String,

    /// Star rating in [0, 5]; 0 means unrated
    pub rating: f64,

    /// Number of reviews backing the rating
    pub reviews: u64,

    /// Price; 0 means unknown, never "free"
    pub price: f64,

    /// Listing URL, if known
    pub url: Option<String>,

    /// Quality score in [0, 5], written by the scoring engine
    pub score: Option<f64>,
}

impl Listing {
    /// Builds a cleaned listing from a raw extraction
    ///
    /// Rating is clamped into [0, 5]; reviews and price coerce to 0 when
    /// the text is missing or malformed.
    pub fn from_raw(raw: RawListing) -> Self {
        let rating = coerce_float(raw.rating.as_deref()).clamp(0.0, 5.0);
        let reviews = coerce_count(raw.reviews.as_deref());
        let price = coerce_float(raw.price.as_deref()).max(0.0);

        let identity_key = match raw.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => fallback_identity_key(&raw.title, price),
        };

        Self {
            title: raw.title,
            identity_key,
            rating,
            reviews,
            price,
            url: raw.url,
            score: None,
        }
    }
}

/// Derives a dedup key from title and price when no platform id exists
///
/// The title is lowercased with whitespace collapsed so cosmetic markup
/// differences between pages do not defeat deduplication.
pub fn fallback_identity_key(title: &str, price: f64) -> String {
    let normalized = normalize_title(title);
    format!("{}|{}", normalized, price)
}

/// Lowercases and collapses whitespace in a title
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Coerces free-form text to a float, NaN-safe
///
/// Takes the first decimal number appearing in the text, so "4.5 out of 5"
/// and "$29.99" both parse. Missing or malformed input yields 0.
pub fn coerce_float(text: Option<&str>) -> f64 {
    let Some(text) = text else { return 0.0 };

    if let Ok(v) = text.trim().parse::<f64>() {
        return if v.is_finite() { v } else { 0.0 };
    }

    let mut number = String::new();
    let mut seen_digit = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            seen_digit = true;
        } else if c == '.' && seen_digit && !number.contains('.') {
            number.push(c);
        } else if seen_digit {
            break;
        }
    }

    number.parse::<f64>().unwrap_or(0.0)
}

/// Coerces free-form text to a review count
///
/// Thousands separators are stripped first ("1,234" parses as 1234).
/// Missing or malformed input yields 0.
pub fn coerce_count(text: Option<&str>) -> u64 {
    let Some(text) = text else { return 0 };

    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<u64>().unwrap_or(0)
}
