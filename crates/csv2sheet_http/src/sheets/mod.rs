//! Client for the Sheets v4 REST api.

pub mod types;

use std::sync::Arc;

use csv2sheet_error::{Csv2SheetError, Result, ResultExt};
use reqwest::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::TokenProvider;
use crate::client::{HttpClient, read_success_json, set_bearer_auth, set_json_body};
use crate::endpoint::join_segments;
use types::{
    AddSheetRequest, BatchRequest, BatchUpdateRequest, BatchUpdateResponse,
    CreateSpreadsheetRequest, CreatedSpreadsheet, SheetProperties, SheetPropertiesRequest,
    SpreadsheetProperties, UpdateValuesResponse, ValueInputOption, ValueRange,
};

#[derive(Debug, Clone)]
pub struct SheetsClient<C: HttpClient> {
    client: C,
    tokens: Arc<TokenProvider>,
    endpoint: Url,
}

impl<C> SheetsClient<C>
where
    C: HttpClient,
{
    pub fn new(client: C, tokens: Arc<TokenProvider>, endpoint: Url) -> Self {
        SheetsClient {
            client,
            tokens,
            endpoint,
        }
    }

    /// Create a new spreadsheet with the given title.
    ///
    /// Only the id of the new spreadsheet is requested back.
    // <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/create>
    pub async fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet> {
        let mut url = join_segments(&self.endpoint, ["v4", "spreadsheets"])?;
        url.query_pairs_mut().append_pair("fields", "spreadsheetId");

        let body = CreateSpreadsheetRequest {
            properties: SpreadsheetProperties { title },
        };

        debug!(%title, "creating spreadsheet");
        self.send_json(Method::POST, url, &body)
            .await
            .context_fn(|| format!("Failed to create spreadsheet '{title}'"))
    }

    /// Overwrite values in a range.
    // <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/update>
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        input_option: ValueInputOption,
        values: Vec<Vec<serde_json::Value>>,
    ) -> Result<UpdateValuesResponse> {
        if spreadsheet_id.is_empty() {
            return Err(Csv2SheetError::new("Spreadsheet id cannot be empty"));
        }

        let mut url = join_segments(
            &self.endpoint,
            ["v4", "spreadsheets", spreadsheet_id, "values", range],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input_option.as_str());

        let body = ValueRange {
            range: Some(range.to_string()),
            values,
        };

        debug!(%spreadsheet_id, %range, rows = body.values.len(), "updating values");
        self.send_json(Method::PUT, url, &body).await
    }

    /// Add a new sheet (tab) to an existing spreadsheet.
    // <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/batchUpdate>
    pub async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<SheetProperties> {
        if spreadsheet_id.is_empty() {
            return Err(Csv2SheetError::new("Spreadsheet id cannot be empty"));
        }

        let method = format!("{spreadsheet_id}:batchUpdate");
        let url = join_segments(&self.endpoint, ["v4", "spreadsheets", &method])?;

        let body = BatchUpdateRequest {
            requests: vec![BatchRequest::AddSheet(AddSheetRequest {
                properties: SheetPropertiesRequest { title },
            })],
        };

        debug!(%spreadsheet_id, %title, "adding sheet");
        let resp: BatchUpdateResponse = self
            .send_json(Method::POST, url, &body)
            .await
            .context_fn(|| format!("Failed to add sheet '{title}'"))?;

        resp.replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|reply| reply.properties)
            .ok_or_else(|| Csv2SheetError::new("Missing addSheet reply in batch update response"))
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token(&self.client).await?;

        let mut request = Request::new(method, url);
        set_bearer_auth(&mut request, &token)?;
        set_json_body(&mut request, body)?;

        let resp = self.client.do_request(request).await?;
        read_success_json(resp).await
    }
}
