use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_BODY_LIMIT_MB, DEFAULT_MAX_FILES, DEFAULT_PORT};
use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const CONFIG_FILE_NAME: &str = "travel_diary.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,
    pub max_files: usize,
    pub body_limit_mb: usize,
    pub gemini_model: String,
    pub gemini_base_url: String,
    // Read from the environment only, never written to the INI file
    pub gemini_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from("data").join("travels.json"),
            upload_dir: PathBuf::from("public").join("uploads"),
            max_files: DEFAULT_MAX_FILES,
            body_limit_mb: DEFAULT_BODY_LIMIT_MB,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
        }
    }
}

impl Settings {
    /// Loads the INI file next to the executable, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path())?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Reads `key = value` lines; unknown keys and unparsable values are ignored.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let file = File::open(config_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.context("Failed to read line from config")?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
        }

        if let Some(host) = config_map.get("host").filter(|h| !h.is_empty()) {
            settings.host = host.clone();
        }
        if let Some(port) = config_map.get("port").and_then(|p| p.parse::<u16>().ok()) {
            settings.port = port;
        }
        if let Some(data_file) = config_map.get("data_file").filter(|p| !p.is_empty()) {
            settings.data_file = PathBuf::from(data_file);
        }
        if let Some(upload_dir) = config_map.get("upload_dir").filter(|p| !p.is_empty()) {
            settings.upload_dir = PathBuf::from(upload_dir);
        }
        if let Some(max_files) = config_map.get("max_files").and_then(|v| v.parse::<usize>().ok()) {
            settings.max_files = max_files.max(1);
        }
        if let Some(limit) = config_map.get("body_limit_mb").and_then(|v| v.parse::<usize>().ok()) {
            settings.body_limit_mb = limit.max(1);
        }
        if let Some(model) = config_map.get("gemini_model").filter(|m| !m.is_empty()) {
            settings.gemini_model = model.clone();
        }
        if let Some(base_url) = config_map.get("gemini_base_url").filter(|u| !u.is_empty()) {
            settings.gemini_base_url = base_url.clone();
        }

        Ok(settings)
    }

    /// `GEMINI_API_KEY` and `PORT` take precedence over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.gemini_api_key = Some(key);
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }

        let mut content = String::new();
        content.push_str("# Travel Diary Configuration File\n");
        content.push_str(&format!("host = {}\n", self.host));
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("data_file = \"{}\"\n", self.data_file.display()));
        content.push_str(&format!("upload_dir = \"{}\"\n", self.upload_dir.display()));
        content.push_str(&format!("max_files = {}\n", self.max_files));
        content.push_str(&format!("body_limit_mb = {}\n", self.body_limit_mb));
        content.push_str(&format!("gemini_model = {}\n", self.gemini_model));
        content.push_str(&format!("gemini_base_url = {}\n", self.gemini_base_url));

        std::fs::write(config_path, content).context("Failed to write to config file")?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        crate::utils::get_app_dir().join(CONFIG_FILE_NAME)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}
