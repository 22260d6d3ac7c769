use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

/// One uploaded file inside a travel entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub index: usize, // 1-based position in the upload
    pub filename: String,
    pub original_name: String,
    pub path: String, // public URL path, e.g. "/uploads/media-1700000000000-42.jpg"
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    // Filled from the file's own EXIF, independent of the entry's coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Travel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaFile>,
    pub upload_date: String,
    pub created_at: DateTime<Utc>,
}

/// Travel entries kept in memory and mirrored to a single JSON file.
///
/// Every mutation rewrites the whole file while holding the write lock.
#[derive(Clone)]
pub struct Database {
    path: Arc<PathBuf>,
    travels: Arc<RwLock<Vec<Travel>>>,
}

impl Database {
    /// Opens the store, creating an empty `[]` file when none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating data directory {}", parent.display()))?;
        }
        if !path.exists() {
            std::fs::write(&path, "[]").with_context(|| format!("Creating {}", path.display()))?;
            info!("Created empty travel store at {}", path.display());
        }

        let travels = read_travels(&path);
        info!("Loaded {} travel(s) from {}", travels.len(), path.display());

        Ok(Database {
            path: Arc::new(path),
            travels: Arc::new(RwLock::new(travels)),
        })
    }

    /// All entries in insertion order.
    pub fn get_all(&self) -> Result<Vec<Travel>> {
        let travels = self.travels.read().map_err(|_| anyhow!("travel store lock poisoned"))?;
        Ok(travels.clone())
    }

    pub fn count(&self) -> Result<usize> {
        let travels = self.travels.read().map_err(|_| anyhow!("travel store lock poisoned"))?;
        Ok(travels.len())
    }

    pub fn find(&self, id: &str) -> Result<Option<Travel>> {
        let travels = self.travels.read().map_err(|_| anyhow!("travel store lock poisoned"))?;
        Ok(travels.iter().find(|t| t.id == id).cloned())
    }

    /// Appends an entry; memory is only updated once the file write succeeded.
    pub fn insert(&self, travel: Travel) -> Result<()> {
        let mut travels = self.travels.write().map_err(|_| anyhow!("travel store lock poisoned"))?;
        let mut updated = travels.clone();
        updated.push(travel);
        write_travels(&self.path, &updated)?;
        *travels = updated;
        Ok(())
    }

    /// Removes and returns the entry with `id`, if any.
    pub fn remove(&self, id: &str) -> Result<Option<Travel>> {
        let mut travels = self.travels.write().map_err(|_| anyhow!("travel store lock poisoned"))?;
        let Some(position) = travels.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let mut updated = travels.clone();
        let removed = updated.remove(position);
        write_travels(&self.path, &updated)?;
        *travels = updated;
        Ok(Some(removed))
    }
}

// An unreadable store is treated as empty so the server still starts. A store that
// exists but does not parse is moved aside first, so the next write cannot clobber it.
fn read_travels(path: &Path) -> Vec<Travel> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(travels) => travels,
        Err(e) => {
            error!("Travel store {} is corrupted: {}", path.display(), e);
            quarantine(path);
            Vec::new()
        }
    }
}

fn quarantine(path: &Path) {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%d%H%M%S%3f")));
    let target = path.with_file_name(name);

    match std::fs::rename(path, &target) {
        Ok(()) => {
            warn!("Moved corrupted travel store to {}", target.display());
            if let Err(e) = std::fs::write(path, "[]") {
                error!("Failed to recreate {}: {}", path.display(), e);
            }
        }
        Err(e) => error!("Failed to move corrupted store {} aside: {}", path.display(), e),
    }
}

fn write_travels(path: &Path, travels: &[Travel]) -> Result<()> {
    let json = serde_json::to_string_pretty(travels).context("Serializing travels")?;
    std::fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn travel(id: &str) -> Travel {
        Travel {
            id: id.to_string(),
            title: format!("Trip {id}"),
            description: String::new(),
            latitude: Some(37.5665),
            longitude: Some(126.978),
            tags: vec!["food".into()],
            media: vec![MediaFile {
                index: 1,
                filename: "media-1-2.jpg".into(),
                original_name: "IMG_0001.JPG".into(),
                path: "/uploads/media-1-2.jpg".into(),
                size: 1024,
                mime_type: "image/jpeg".into(),
                latitude: Some(37.395833),
                longitude: None,
            }],
            upload_date: "2024-05-01 10:00:00".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn open_creates_empty_store() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("data").join("travels.json");

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn insert_persists_and_reloads() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("travels.json");

        let db = Database::open(&path).unwrap();
        db.insert(travel("1")).unwrap();
        db.insert(travel("2")).unwrap();

        let reopened = Database::open(&path).unwrap();
        let all = reopened.get_all().unwrap();
        assert_eq!(all.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(all[0], db.find("1").unwrap().unwrap());
    }

    #[test]
    fn stored_json_uses_camel_case_and_skips_missing_coordinates() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("travels.json");

        let db = Database::open(&path).unwrap();
        db.insert(travel("1")).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let media = &raw[0]["media"][0];
        assert_eq!(media["originalName"], "IMG_0001.JPG");
        assert_eq!(media["type"], "image/jpeg");
        assert_eq!(media["latitude"], 37.395833);
        assert!(media.get("longitude").is_none());
        assert!(raw[0].get("uploadDate").is_some());
        assert!(raw[0].get("createdAt").is_some());
    }

    #[test]
    fn remove_returns_entry() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let db = Database::open(temp_dir.path().join("travels.json")).unwrap();
        db.insert(travel("1")).unwrap();

        assert_eq!(db.remove("missing").unwrap(), None);
        assert_eq!(db.remove("1").unwrap().map(|t| t.id), Some("1".to_string()));
        assert!(db.find("1").unwrap().is_none());
    }

    #[test]
    fn corrupted_store_loads_empty() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("travels.json");
        std::fs::write(&path, "{ not json").unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn corrupted_store_is_kept_aside() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("travels.json");
        std::fs::write(&path, "[{\"id\": \"1\", broken").unwrap();

        let db = Database::open(&path).unwrap();
        db.insert(travel("2")).unwrap();

        let kept: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("travels.json.corrupt-"))
            .collect();
        assert_eq!(kept.len(), 1);

        let backup = std::fs::read_to_string(temp_dir.path().join(&kept[0])).unwrap();
        assert_eq!(backup, "[{\"id\": \"1\", broken");
        assert_eq!(Database::open(&path).unwrap().count().unwrap(), 1);
    }
}
