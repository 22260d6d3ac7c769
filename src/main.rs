use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use travel_diary::utils::ensure_directory_exists;
use travel_diary::{start_server, AppState, Database, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("travel_diary=info,tower_http=info")),
        )
        .init();

    info!("Starting Travel Diary v{}", env!("CARGO_PKG_VERSION"));

    let config_path = Settings::config_path();
    let settings = Settings::load().context("Failed to load settings")?;
    if !config_path.exists() {
        // Leave a template next to the binary for the user to edit
        match settings.save() {
            Ok(()) => info!("Wrote default configuration to {}", config_path.display()),
            Err(e) => warn!("Could not write {}: {e:#}", config_path.display()),
        }
    }

    ensure_directory_exists(&settings.upload_dir)
        .with_context(|| format!("Failed to create upload directory {}", settings.upload_dir.display()))?;
    let db = Database::open(&settings.data_file).context("Failed to open travel store")?;

    let state = AppState::new(db, settings);
    if !state.gemini.has_api_key() {
        warn!("GEMINI_API_KEY is not set; titles and place names use built-in fallbacks");
    }

    start_server(state).await
}
