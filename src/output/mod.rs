//! Output module for exporting scored listings and reports
//!
//! This module handles:
//! - CSV export (UTF-8 BOM, spreadsheet-friendly quoting)
//! - JSON export
//! - The post-crawl dataset report

mod csv;
mod json;
mod report;

pub use csv::{export_csv, render_csv};
pub use json::{export_json, render_json};
pub use report::{print_report, DatasetReport};

use crate::listing::Listing;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parses a format from its config name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Writes a scored batch to a file in the given format
pub fn export(listings: &[Listing], path: &Path, format: ExportFormat) -> ExportResult<()> {
    match format {
        ExportFormat::Csv => export_csv(listings, path),
        ExportFormat::Json => export_json(listings, path),
    }
}
