//! JSON export for scored listings

use crate::listing::Listing;
use crate::output::ExportResult;
use std::path::Path;

/// Renders a batch as pretty-printed JSON
pub fn render_json(listings: &[Listing]) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(listings)?)
}

/// Writes a batch as JSON to the given path
pub fn export_json(listings: &[Listing], path: &Path) -> ExportResult<()> {
    std::fs::write(path, render_json(listings)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;

    #[test]
    fn test_render_roundtrips() {
        let mut listing = Listing::from_raw(RawListing {
            title: "Widget".to_string(),
            id: Some("K1".to_string()),
            rating: Some("4.5".to_string()),
            reviews: Some("100".to_string()),
            price: Some("29.99".to_string()),
            url: Some("https://example.com/widget".to_string()),
        });
        listing.score = Some(3.955);

        let json = render_json(&[listing]).unwrap();
        let parsed: Vec<Listing> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "Widget");
        assert_eq!(parsed[0].identity_key, "K1");
        assert_eq!(parsed[0].reviews, 100);
        assert_eq!(parsed[0].score, Some(3.955));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        export_json(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
