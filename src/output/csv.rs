//! CSV export for scored listings
//!
//! The output matches what spreadsheet tools expect: a UTF-8 byte order
//! mark up front, quoted text fields with doubled inner quotes, and bare
//! numeric fields. Scores render with three decimal places.

use crate::listing::Listing;
use crate::output::ExportResult;
use std::path::Path;

/// UTF-8 byte order mark so spreadsheet imports pick the right encoding
const BOM: &str = "\u{feff}";

const HEADER: &str = "Title,Id,Rating,Reviews,Price,Score";

/// Renders a batch as CSV text
pub fn render_csv(listings: &[Listing]) -> String {
    let mut out = String::with_capacity(64 * (listings.len() + 1));
    out.push_str(BOM);
    out.push_str(HEADER);
    out.push('\n');

    for listing in listings {
        out.push_str(&quote(&listing.title));
        out.push(',');
        out.push_str(&quote(&listing.identity_key));
        out.push(',');
        out.push_str(&listing.rating.to_string());
        out.push(',');
        out.push_str(&listing.reviews.to_string());
        out.push(',');
        out.push_str(&listing.price.to_string());
        out.push(',');
        if let Some(score) = listing.score {
            out.push_str(&format!("{score:.3}"));
        }
        out.push('\n');
    }

    out
}

/// Writes a batch as CSV to the given path
pub fn export_csv(listings: &[Listing], path: &Path) -> ExportResult<()> {
    std::fs::write(path, render_csv(listings))?;
    Ok(())
}

/// Quotes a text field, doubling any inner quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
