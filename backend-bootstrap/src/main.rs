use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use backend_infrastructure::{AppConfig, ConfigSource};

#[derive(Parser, Debug)]
#[command(name = "larder-backend")]
#[command(about = "Larder grocery inventory backend", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Logs to stdout, or to a daily rolling file when `log_dir` is set. The
/// returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "larder-backend.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("LARDER_CONFIG", config);
    }

    let (config, source) = AppConfig::load().await?;
    let _guard = init_tracing(config.log_dir.as_deref());
    match source {
        ConfigSource::File(path) => info!("loaded config from {}", path),
        ConfigSource::Defaults { missing } => warn!("{} not found, using defaults", missing),
    }

    backend_bootstrap::run_standalone(config).await
}
