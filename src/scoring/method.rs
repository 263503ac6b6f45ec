/// Scoring method definitions
///
/// This module defines the closed set of scoring methods a batch can be
/// ranked with.
use std::fmt;

/// The scoring method applied to a collected batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringMethod {
    /// Bayesian average with arithmetic-mean prior
    Classic,

    /// Bayesian average with order-statistic prior plus rating and
    /// low-volume penalties
    Enhanced,

    /// Lower bound of the Wilson score interval
    Wilson,

    /// Classic Bayesian average plus a diminishing-returns review bonus
    LogAdjusted,

    /// Enhanced quality adjusted for price; favors cheap-but-good listings
    Value,

    /// Enhanced scoring with price-tier-relaxed review expectations
    Premium,

    /// Bayesian average with caller-supplied prior parameters
    Custom,
}

impl ScoringMethod {
    /// Returns the canonical name used in config files and export columns
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Enhanced => "enhanced",
            Self::Wilson => "wilson",
            Self::LogAdjusted => "log-adjusted",
            Self::Value => "value",
            Self::Premium => "premium",
            Self::Custom => "custom",
        }
    }

    /// Parses a method from its canonical name
    ///
    /// Accepts "logadjusted" as an alias for "log-adjusted". Returns None
    /// for anything else.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "classic" => Some(Self::Classic),
            "enhanced" => Some(Self::Enhanced),
            "wilson" => Some(Self::Wilson),
            "log-adjusted" | "logadjusted" => Some(Self::LogAdjusted),
            "value" => Some(Self::Value),
            "premium" => Some(Self::Premium),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Returns true if the method consults listing prices
    pub fn uses_price(&self) -> bool {
        matches!(self, Self::Value | Self::Premium)
    }

    /// Returns true if scores are clamped into [0, 5]
    ///
    /// Classic and custom are left unclamped to match the reference
    /// regression values; they are only guaranteed finite and
    /// non-negative.
    pub fn is_clamped(&self) -> bool {
        !matches!(self, Self::Classic | Self::Custom)
    }

    /// Returns all methods
    pub fn all_methods() -> Vec<Self> {
        vec![
            Self::Classic,
            Self::Enhanced,
            Self::Wilson,
            Self::LogAdjusted,
            Self::Value,
            Self::Premium,
            Self::Custom,
        ]
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
