use csv2sheet_error::{Result, ResultExt};
use csv2sheet_http::endpoint::{DEFAULT_SHEETS_ENDPOINT, DEFAULT_STORAGE_ENDPOINT};
use csv2sheet_http::sheets::types::ValueInputOption;
use url::Url;

pub const DEFAULT_SHEET_TITLE: &str = "Pizza";

/// Configuration for the upload handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csv2SheetConfig {
    /// Spreadsheet that values are written to.
    ///
    /// If unset, the write step fails (and is logged).
    pub spreadsheet_id: Option<String>,
    /// Title of the sheet within the spreadsheet to write to.
    pub sheet_title: String,
    pub value_input_option: ValueInputOption,
    pub sheets_endpoint: Url,
    pub storage_endpoint: Url,
}

impl Csv2SheetConfig {
    pub fn try_new(
        spreadsheet_id: Option<String>,
        sheet_title: Option<String>,
        sheets_endpoint: Option<&str>,
        storage_endpoint: Option<&str>,
    ) -> Result<Self> {
        let sheets_endpoint = Url::parse(sheets_endpoint.unwrap_or(DEFAULT_SHEETS_ENDPOINT))
            .context("Failed to parse sheets endpoint as url")?;
        let storage_endpoint = Url::parse(storage_endpoint.unwrap_or(DEFAULT_STORAGE_ENDPOINT))
            .context("Failed to parse storage endpoint as url")?;

        Ok(Csv2SheetConfig {
            spreadsheet_id: spreadsheet_id.filter(|id| !id.is_empty()),
            sheet_title: sheet_title.unwrap_or_else(|| DEFAULT_SHEET_TITLE.to_string()),
            value_input_option: ValueInputOption::UserEntered,
            sheets_endpoint,
            storage_endpoint,
        })
    }

    /// The A1 range values are written to.
    pub fn update_range(&self) -> String {
        format!("{}!A:B", self.sheet_title)
    }
}

impl Default for Csv2SheetConfig {
    fn default() -> Self {
        Csv2SheetConfig {
            spreadsheet_id: None,
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
            value_input_option: ValueInputOption::UserEntered,
            sheets_endpoint: Url::parse(DEFAULT_SHEETS_ENDPOINT).expect("valid default endpoint"),
            storage_endpoint: Url::parse(DEFAULT_STORAGE_ENDPOINT)
                .expect("valid default endpoint"),
        }
    }
}
