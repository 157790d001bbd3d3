use std::sync::Arc;

use csv2sheet_error::{OptionExt, Result};
use csv2sheet_http::auth::TokenProvider;
use csv2sheet_http::client::HttpClient;
use csv2sheet_http::gcs::GcsClient;
use csv2sheet_http::sheets::SheetsClient;
use csv2sheet_http::sheets::types::{SheetProperties, UpdateValuesResponse};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::config::Csv2SheetConfig;
use crate::event::StorageObjectEvent;
use crate::validate::{is_csv_file, sheet_name_for};

/// Result of handling a single upload event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandleOutcome {
    /// Not a csv file, nothing was done.
    Ignored { name: String },
    /// Spreadsheet created and file read. The values write may have failed,
    /// see `values_written`.
    ///
    /// `created_spreadsheet_id` is the spreadsheet created for the upload, not
    /// the configured spreadsheet values are written to.
    Processed {
        created_spreadsheet_id: String,
        bytes_read: usize,
        values_written: bool,
    },
}

/// Rows written to the configured range for every upload.
pub fn placeholder_values() -> Vec<Vec<Value>> {
    vec![vec![json!("test"), json!(1)], vec![json!("test"), json!(2)]]
}

/// Handles csv uploads by creating a spreadsheet and writing values to the
/// configured range.
#[derive(Debug)]
pub struct Csv2Sheet<C: HttpClient> {
    config: Csv2SheetConfig,
    sheets: SheetsClient<C>,
    storage: GcsClient<C>,
}

impl<C> Csv2Sheet<C>
where
    C: HttpClient,
{
    pub fn new(client: C, tokens: Arc<TokenProvider>, config: Csv2SheetConfig) -> Self {
        let sheets = SheetsClient::new(
            client.clone(),
            tokens.clone(),
            config.sheets_endpoint.clone(),
        );
        let storage = GcsClient::new(client, tokens, config.storage_endpoint.clone());

        Csv2Sheet {
            config,
            sheets,
            storage,
        }
    }

    pub fn config(&self) -> &Csv2SheetConfig {
        &self.config
    }

    /// Handle an object upload.
    ///
    /// Create and read failures are returned. Failures writing values are
    /// logged and otherwise ignored.
    pub async fn handle(&self, event: &StorageObjectEvent) -> Result<HandleOutcome> {
        if !is_csv_file(&event.name) {
            info!(%event, "Not a .csv file, ignoring.");
            return Ok(HandleOutcome::Ignored {
                name: event.name.clone(),
            });
        }
        let sheet_name = sheet_name_for(&event.name).required("sheet name")?;

        let created_spreadsheet_id = self.add_empty_sheet(sheet_name).await?;
        let content = self.read_csv_content(&event.bucket, &event.name).await?;
        let written = self.update_sheet_with_file_data(&content).await;

        Ok(HandleOutcome::Processed {
            created_spreadsheet_id,
            bytes_read: content.len(),
            values_written: written.is_some(),
        })
    }

    /// Create a new spreadsheet titled after the uploaded file, returning its
    /// id.
    pub async fn add_empty_sheet(&self, sheet_name: &str) -> Result<String> {
        let created = self.sheets.create_spreadsheet(sheet_name).await?;
        info!(%sheet_name, spreadsheet_id = %created.spreadsheet_id, "created spreadsheet");
        Ok(created.spreadsheet_id)
    }

    /// Read the full contents of the uploaded file as text.
    ///
    /// Invalid utf8 sequences are replaced.
    pub async fn read_csv_content(&self, bucket: &str, name: &str) -> Result<String> {
        let bytes = self.storage.read_object(bucket, name).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        info!(%bucket, %name, %content, "The contents of the CSV");
        Ok(content)
    }

    /// Replace the values in the configured range.
    ///
    /// The file content doesn't determine what gets written, placeholder rows
    /// are written instead. Returns `None` if the write failed.
    pub async fn update_sheet_with_file_data(
        &self,
        content: &str,
    ) -> Option<UpdateValuesResponse> {
        debug!(content_len = content.len(), "writing placeholder values");
        match self.try_update_values().await {
            Ok(resp) => {
                info!(
                    spreadsheet_id = %resp.spreadsheet_id,
                    updated_range = resp.updated_range.as_deref().unwrap_or_default(),
                    updated_cells = resp.updated_cells.unwrap_or_default(),
                    "updated values"
                );
                Some(resp)
            }
            Err(err) => {
                error!(%err, "The Sheets API returned an error");
                None
            }
        }
    }

    /// Add a sheet (tab) to the configured spreadsheet.
    pub async fn add_sheet(&self, title: &str) -> Result<SheetProperties> {
        let spreadsheet_id = self
            .config
            .spreadsheet_id
            .as_deref()
            .required("spreadsheet id")?;
        let props = self.sheets.add_sheet(spreadsheet_id, title).await?;
        info!(%spreadsheet_id, sheet_id = props.sheet_id, title = %props.title, "added sheet");
        Ok(props)
    }

    async fn try_update_values(&self) -> Result<UpdateValuesResponse> {
        let spreadsheet_id = self
            .config
            .spreadsheet_id
            .as_deref()
            .required("spreadsheet id")?;
        self.sheets
            .update_values(
                spreadsheet_id,
                &self.config.update_range(),
                self.config.value_input_option,
                placeholder_values(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use csv2sheet_http::auth::TokenSource;
    use csv2sheet_http::testutil::{MockHttpClient, MockResponse};
    use csv2sheet_http::Method;

    use super::*;

    fn new_handler(
        client: &MockHttpClient,
        spreadsheet_id: Option<&str>,
    ) -> Csv2Sheet<MockHttpClient> {
        let config = Csv2SheetConfig {
            spreadsheet_id: spreadsheet_id.map(|s| s.to_string()),
            ..Default::default()
        };
        Csv2Sheet::new(
            client.clone(),
            Arc::new(TokenProvider::new(TokenSource::Static("tok".to_string()))),
            config,
        )
    }

    fn created(id: &str) -> MockResponse {
        MockResponse::json(200, json!({"spreadsheetId": id}))
    }

    fn updated() -> MockResponse {
        MockResponse::json(
            200,
            json!({"spreadsheetId": "target", "updatedRange": "Pizza!A1:B2", "updatedCells": 4}),
        )
    }

    #[tokio::test]
    async fn non_csv_ignored() {
        let client = MockHttpClient::default();
        let handler = new_handler(&client, Some("target"));

        for name in ["notes.txt", "data.CSV", "archive.csv.gz"] {
            let outcome = handler
                .handle(&StorageObjectEvent::new("uploads", name))
                .await
                .unwrap();
            assert_eq!(
                HandleOutcome::Ignored {
                    name: name.to_string()
                },
                outcome
            );
        }

        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn csv_upload_creates_reads_writes() {
        let client = MockHttpClient::default();
        client.push_response(created("new-sheet"));
        client.push_response(MockResponse::bytes(200, "name,score\nalice,3\n"));
        client.push_response(updated());

        let handler = new_handler(&client, Some("target"));
        let outcome = handler
            .handle(&StorageObjectEvent::new("uploads", "scores.csv"))
            .await
            .unwrap();

        assert_eq!(
            HandleOutcome::Processed {
                created_spreadsheet_id: "new-sheet".to_string(),
                bytes_read: 19,
                values_written: true,
            },
            outcome
        );

        let requests = client.requests();
        assert_eq!(3, requests.len());

        assert_eq!(Method::POST, requests[0].method);
        assert_eq!("/v4/spreadsheets", requests[0].url.path());
        assert_eq!(
            json!({"properties": {"title": "scores"}}),
            requests[0].body_json()
        );

        assert_eq!(Method::GET, requests[1].method);
        assert_eq!(
            "/storage/v1/b/uploads/o/scores.csv",
            requests[1].url.path()
        );

        assert_eq!(Method::PUT, requests[2].method);
        assert_eq!(
            "/v4/spreadsheets/target/values/Pizza!A:B",
            requests[2].url.path()
        );
        assert_eq!(Some("valueInputOption=USER_ENTERED"), requests[2].url.query());
        assert_eq!(
            json!({"range": "Pizza!A:B", "values": [["test", 1], ["test", 2]]}),
            requests[2].body_json()
        );
    }

    #[tokio::test]
    async fn sheet_title_keeps_directory_prefix() {
        let client = MockHttpClient::default();
        client.push_response(created("new-sheet"));
        client.push_response(MockResponse::bytes(200, "a\n"));
        client.push_response(updated());

        let handler = new_handler(&client, Some("target"));
        handler
            .handle(&StorageObjectEvent::new("uploads", "2024/q1/sales.csv"))
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(
            json!({"properties": {"title": "2024/q1/sales"}}),
            requests[0].body_json()
        );
        assert_eq!(
            "/storage/v1/b/uploads/o/2024%2Fq1%2Fsales.csv",
            requests[1].url.path()
        );
    }

    #[tokio::test]
    async fn create_failure_rejects() {
        let client = MockHttpClient::default();
        client.push_response(MockResponse::json(
            403,
            json!({"error": {"code": 403, "message": "denied"}}),
        ));

        let handler = new_handler(&client, Some("target"));
        let err = handler
            .handle(&StorageObjectEvent::new("uploads", "scores.csv"))
            .await
            .unwrap_err();
        assert_eq!("Failed to create spreadsheet 'scores'", err.get_msg());
        assert_eq!(1, client.requests().len());
    }

    #[tokio::test]
    async fn read_failure_rejects() {
        let client = MockHttpClient::default();
        client.push_response(created("new-sheet"));
        client.push_response(MockResponse::json(
            404,
            json!({"error": {"code": 404, "message": "No such object"}}),
        ));

        let handler = new_handler(&client, Some("target"));
        let err = handler
            .handle(&StorageObjectEvent::new("uploads", "scores.csv"))
            .await
            .unwrap_err();
        assert_eq!(
            "Failed to read object 'gs://uploads/scores.csv'",
            err.get_msg()
        );
        // No write attempted.
        assert_eq!(2, client.requests().len());
    }

    #[tokio::test]
    async fn write_failure_swallowed() {
        let client = MockHttpClient::default();
        client.push_response(created("new-sheet"));
        client.push_response(MockResponse::bytes(200, "a,b\n"));
        client.push_response(MockResponse::json(
            500,
            json!({"error": {"code": 500, "message": "Internal error encountered."}}),
        ));

        let handler = new_handler(&client, Some("target"));
        let outcome = handler
            .handle(&StorageObjectEvent::new("uploads", "scores.csv"))
            .await
            .unwrap();

        assert_eq!(
            HandleOutcome::Processed {
                created_spreadsheet_id: "new-sheet".to_string(),
                bytes_read: 4,
                values_written: false,
            },
            outcome
        );
        assert_eq!(3, client.requests().len());
    }

    #[tokio::test]
    async fn missing_spreadsheet_id_skips_write() {
        let client = MockHttpClient::default();
        client.push_response(created("new-sheet"));
        client.push_response(MockResponse::bytes(200, "a,b\n"));

        let handler = new_handler(&client, None);
        let outcome = handler
            .handle(&StorageObjectEvent::new("uploads", "scores.csv"))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            HandleOutcome::Processed {
                values_written: false,
                ..
            }
        ));
        assert_eq!(2, client.requests().len());
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let client = MockHttpClient::default();
        client.push_response(MockResponse::bytes(200, vec![b'a', 0xff, b'b']));

        let handler = new_handler(&client, Some("target"));
        let content = handler
            .read_csv_content("uploads", "scores.csv")
            .await
            .unwrap();
        assert_eq!("a\u{fffd}b", content);
    }

    #[tokio::test]
    async fn add_sheet_requires_spreadsheet_id() {
        let client = MockHttpClient::default();
        let handler = new_handler(&client, None);

        let err = handler.add_sheet("sales").await.unwrap_err();
        assert_eq!("Missing required value: spreadsheet id", err.get_msg());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn add_sheet_to_configured_spreadsheet() {
        let client = MockHttpClient::default();
        client.push_response(MockResponse::json(
            200,
            json!({
                "spreadsheetId": "target",
                "replies": [{"addSheet": {"properties": {"sheetId": 42, "title": "sales", "index": 1}}}],
            }),
        ));

        let handler = new_handler(&client, Some("target"));
        let props = handler.add_sheet("sales").await.unwrap();
        assert_eq!(42, props.sheet_id);
        assert_eq!("sales", props.title);

        let requests = client.requests();
        assert_eq!(1, requests.len());
        assert_eq!(Method::POST, requests[0].method);
        assert_eq!("/v4/spreadsheets/target:batchUpdate", requests[0].url.path());
        assert_eq!(
            json!({"requests": [{"addSheet": {"properties": {"title": "sales"}}}]}),
            requests[0].body_json()
        );
    }

    #[test]
    fn outcome_json() {
        let outcome = HandleOutcome::Ignored {
            name: "a.txt".to_string(),
        };
        assert_eq!(
            json!({"outcome": "ignored", "name": "a.txt"}),
            serde_json::to_value(&outcome).unwrap()
        );

        let outcome = HandleOutcome::Processed {
            created_spreadsheet_id: "new-sheet".to_string(),
            bytes_read: 4,
            values_written: true,
        };
        assert_eq!(
            json!({
                "outcome": "processed",
                "created_spreadsheet_id": "new-sheet",
                "bytes_read": 4,
                "values_written": true,
            }),
            serde_json::to_value(&outcome).unwrap()
        );
    }
}
