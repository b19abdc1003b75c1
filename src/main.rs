use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use modwatch::budget::JsonFileCostSource;
use modwatch::dashboard::{Dashboard, RenderMode};
use modwatch::settings::{load_settings, load_settings_from};

/// Print the AI budget dashboard for an exported cost snapshot.
#[derive(Debug, Parser)]
#[command(name = "modwatch", version)]
struct Args {
    /// JSON file holding a budget snapshot
    #[arg(long)]
    snapshot: PathBuf,

    /// Print the one-line toast variant instead of the full breakdown
    #[arg(long)]
    condensed: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (for development convenience)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };

    let source = Arc::new(JsonFileCostSource::new(&args.snapshot));
    let dashboard = Dashboard::with_condensed_limit(source, settings.condensed_max_chars);
    let mode = if args.condensed {
        RenderMode::Condensed
    } else {
        RenderMode::Verbose
    };

    match dashboard.render(mode).await {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
