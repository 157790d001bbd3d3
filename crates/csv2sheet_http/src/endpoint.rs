use csv2sheet_error::{Csv2SheetError, Result};
use url::Url;

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

/// Append path segments to a base url.
///
/// Each segment is percent-encoded individually, including any '/' it
/// contains, so object names with directories stay a single segment.
pub fn join_segments<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Csv2SheetError::new("Endpoint url cannot be a base").with_field("url", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
