use std::sync::Arc;

use crate::database::Database;
use crate::gemini::GeminiClient;
use crate::settings::Settings;

// Shared by every handler; cloning only bumps reference counts
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
    pub gemini: GeminiClient,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let gemini = GeminiClient::new(
            settings.gemini_api_key.clone(),
            settings.gemini_model.clone(),
            settings.gemini_base_url.clone(),
        );
        Self {
            db,
            settings: Arc::new(settings),
            gemini,
        }
    }
}
