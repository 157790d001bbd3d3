use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logutil::LogFormat;
use tracing::Level;

#[derive(Parser)]
#[clap(name = "csv2sheet", version)]
pub struct Arguments {
    #[clap(flatten)]
    pub config: ConfigArgs,

    /// Log output format, either 'human' or 'json'.
    #[arg(long, global = true, env = "CSV2SHEET_LOG_FORMAT", default_value_t = LogFormat::HumanReadable)]
    pub log_format: LogFormat,

    /// Default log level. Directives in RUST_LOG take precedence.
    #[arg(long, global = true, env = "CSV2SHEET_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve storage events over http.
    ///
    /// Events are accepted as POST requests to '/', either as a bare storage
    /// object or nested under a 'data' key.
    Serve(ServeArgs),

    /// Handle a single upload event, then exit.
    Handle(ObjectArgs),

    /// Read an object and print its contents.
    Read(ObjectArgs),

    /// Add a sheet to the configured spreadsheet.
    AddSheet(AddSheetArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Spreadsheet to write values to.
    #[arg(long, global = true, env = "SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Title of the sheet within the spreadsheet to write values to.
    ///
    /// Defaults to 'Pizza'.
    #[arg(long, global = true, env = "SHEET_TITLE")]
    pub sheet_title: Option<String>,

    /// Fixed access token to use for all requests.
    ///
    /// Takes precedence over any other credentials.
    #[arg(long, global = true, env = "CSV2SHEET_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Path to a service account key.
    ///
    /// If neither this nor an access token is provided, tokens are requested
    /// from the metadata server.
    #[arg(long, global = true, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Base url of the Sheets api.
    ///
    /// (Internal)
    #[arg(long, global = true, hide = true, env = "CSV2SHEET_SHEETS_ENDPOINT")]
    pub sheets_endpoint: Option<String>,

    /// Base url of the storage api.
    ///
    /// (Internal)
    #[arg(long, global = true, hide = true, env = "CSV2SHEET_STORAGE_ENDPOINT")]
    pub storage_endpoint: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind to.
    ///
    /// Overrides '--port' when provided.
    #[arg(short = 'b', long)]
    pub bind: Option<String>,

    /// Port to listen on, bound on all interfaces.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

impl ServeArgs {
    pub fn bind_addr(&self) -> String {
        match &self.bind {
            Some(bind) => bind.clone(),
            None => format!("0.0.0.0:{}", self.port),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ObjectArgs {
    /// Bucket containing the object.
    #[arg(long)]
    pub bucket: String,

    /// Name of the object.
    #[arg(long)]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct AddSheetArgs {
    /// Title of the new sheet.
    #[arg(long)]
    pub title: String,
}
