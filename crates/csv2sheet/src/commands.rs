use std::io::{self, Write};
use std::sync::Arc;

use csv2sheet_core::config::Csv2SheetConfig;
use csv2sheet_core::event::StorageObjectEvent;
use csv2sheet_core::handler::Csv2Sheet;
use csv2sheet_error::{Result, ResultExt};
use csv2sheet_http::auth::{TokenProvider, TokenSource};
use csv2sheet_http::reqwest_client::ReqwestClient;
use tokio::net::TcpListener;
use tracing::info;

use crate::args::{Arguments, Commands, ConfigArgs};
use crate::server::{self, ServerState};

fn build_handler(args: &ConfigArgs) -> Result<Csv2Sheet<ReqwestClient>> {
    let config = Csv2SheetConfig::try_new(
        args.spreadsheet_id.clone(),
        args.sheet_title.clone(),
        args.sheets_endpoint.as_deref(),
        args.storage_endpoint.as_deref(),
    )?;
    let source = TokenSource::resolve(args.access_token.clone(), args.credentials.as_deref())?;
    let token_source = source.kind();

    let client = ReqwestClient::try_default()?;
    let handler = Csv2Sheet::new(client, Arc::new(TokenProvider::new(source)), config);

    let config = handler.config();
    info!(
        token_source,
        spreadsheet_id = config.spreadsheet_id.as_deref().unwrap_or_default(),
        range = %config.update_range(),
        "configured handler"
    );

    Ok(handler)
}

pub async fn run(args: Arguments) -> Result<()> {
    let handler = build_handler(&args.config)?;
    let mut stdout = io::stdout();

    match args.command {
        Commands::Serve(serve_args) => {
            let addr = serve_args.bind_addr();
            let listener = TcpListener::bind(&addr)
                .await
                .context_fn(|| format!("Failed to bind to '{addr}'"))?;
            let local = listener.local_addr().context("Failed to get local address")?;
            writeln!(stdout, "Listening on http://{local}")?;
            stdout.flush()?;

            let router = server::router(Arc::new(ServerState { handler }));
            server::serve(listener, router).await?;
        }
        Commands::Handle(obj) => {
            let event = StorageObjectEvent::new(obj.bucket, obj.name);
            let outcome = handler.handle(&event).await?;
            let out = serde_json::to_string(&outcome).context("Failed to serialize outcome")?;
            writeln!(stdout, "{out}")?;
        }
        Commands::Read(obj) => {
            let content = handler.read_csv_content(&obj.bucket, &obj.name).await?;
            write!(stdout, "{content}")?;
        }
        Commands::AddSheet(add) => {
            let props = handler.add_sheet(&add.title).await?;
            writeln!(stdout, "Added sheet '{}' (id {})", props.title, props.sheet_id)?;
        }
    }

    stdout.flush()?;
    Ok(())
}
