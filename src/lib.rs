pub mod constants;
pub mod database;
pub mod exif_parser;
pub mod gemini;
pub mod geocoding;
pub mod html_template;
pub mod processing;
pub mod reverse_geocode;
pub mod server;
pub mod settings;
pub mod titles;
pub mod utils;

pub use database::Database;
pub use server::{create_app, start_server, state::AppState};
pub use settings::Settings;
