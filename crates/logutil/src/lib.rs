//! Utilities for logging.

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Dependencies logged at warn unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper", "h2", "rustls"];

/// Output format for the global logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Newline delimited json. Intended for log collectors.
    Json,
    #[default]
    HumanReadable,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "human_readable" | "pretty" => Ok(LogFormat::HumanReadable),
            other => Err(format!("Unknown log format: '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::HumanReadable => write!(f, "human"),
        }
    }
}

/// Configure the global logger.
///
/// `default_level` is used for everything not covered by a directive in
/// `RUST_LOG`. Calling this more than once is a no-op.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, make_writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_env_filter(default_level, rust_log.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(make_writer)
        .with_thread_ids(true)
        .with_thread_names(true);

    // Errors only if a global subscriber is already set.
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::HumanReadable => builder.try_init(),
    };
}

/// Build the filter from our defaults followed by the user's directives.
///
/// A later directive for the same target replaces an earlier one, so anything
/// in `rust_log` overrides both the default level and the quiet targets.
fn build_env_filter(default_level: Level, rust_log: Option<&str>) -> EnvFilter {
    let mut directives = vec![LevelFilter::from_level(default_level).to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
    if let Some(rust_log) = rust_log.filter(|s| !s.trim().is_empty()) {
        directives.push(rust_log.to_string());
    }

    EnvFilter::builder().parse_lossy(directives.join(","))
}
