use anyhow::Result;
use clap::{Parser, ValueEnum};
use saviynt_provider::provider::SaviyntProvider;
use saviynt_provider::VERSION;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Terraform provider for Saviynt job control triggers.
///
/// Started by Terraform; stdout is reserved for the plugin handshake, so logs
/// go to stderr or to a file.
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-saviynt", version = VERSION, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "warn", env = "SAVIYNT_PROVIDER_LOG_LEVEL")]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "SAVIYNT_PROVIDER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?)
}

fn setup_logging(args: &Args) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = args.log_level.to_tracing_level() else {
        return Ok(None);
    };

    // RUST_LOG wins when set, for per-module filtering
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.to_string().to_lowercase()));

    let (non_blocking, guard) = match &args.log_file {
        Some(path) => tracing_appender::non_blocking(open_log_file(path)?),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("terraform-provider-saviynt {} started with log level: {:?}", VERSION, args.log_level);
    if let Some(path) = &args.log_file {
        tracing::info!("Log file: {:?}", path);
    }

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(&args)?;

    tf_provider::serve("saviynt", SaviyntProvider::default()).await?;

    tracing::info!("Provider stopped");
    Ok(())
}
