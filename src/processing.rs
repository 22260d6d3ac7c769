use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_TITLE, UPLOADS_URL_PREFIX};
use crate::database::{MediaFile, Travel};
use crate::exif_parser::{extract_from_file, ExtractionResult};
use crate::utils::{ensure_directory_exists, parse_f64, unique_filename};

/// A file written to the upload directory, before metadata extraction.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub filename: String,
    pub original_name: String,
    pub disk_path: PathBuf,
    pub size: u64,
    pub mime_type: String,
}

/// Text fields of the upload form, as received.
#[derive(Debug, Clone, Default)]
pub struct TravelForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub tags: Option<String>,
}

/// Simple MIME type detection based on file extension
pub fn guess_mime_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" | "heif" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Writes one uploaded file under a fresh unique name.
pub fn store_upload(
    upload_dir: &Path,
    field: &str,
    original_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
    rng: &mut impl Rng,
) -> Result<StoredUpload> {
    ensure_directory_exists(upload_dir)
        .with_context(|| format!("Creating upload directory {}", upload_dir.display()))?;

    let filename = unique_filename(field, original_name, Utc::now().timestamp_millis(), rng);
    let disk_path = upload_dir.join(&filename);
    std::fs::write(&disk_path, bytes).with_context(|| format!("Writing {}", disk_path.display()))?;

    let mime_type = content_type
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| guess_mime_type(original_name).to_string());

    Ok(StoredUpload {
        filename,
        original_name: original_name.to_string(),
        disk_path,
        size: bytes.len() as u64,
        mime_type,
    })
}

/// Builds the media record, reading GPS from the stored file for images.
pub fn build_media_file(index: usize, stored: &StoredUpload) -> MediaFile {
    let mut media = MediaFile {
        index,
        filename: stored.filename.clone(),
        original_name: stored.original_name.clone(),
        path: format!("{}/{}", UPLOADS_URL_PREFIX, stored.filename),
        size: stored.size,
        mime_type: stored.mime_type.clone(),
        latitude: None,
        longitude: None,
    };

    if !stored.mime_type.starts_with("image/") {
        return media;
    }

    match extract_from_file(&stored.disk_path) {
        ExtractionResult::Coordinate { coordinate, .. } => {
            info!(
                "Image {} ({}) GPS: {}, {}",
                index, stored.original_name, coordinate.latitude, coordinate.longitude
            );
            media.latitude = Some(coordinate.latitude);
            media.longitude = Some(coordinate.longitude);
        }
        ExtractionResult::Absent => {
            debug!("Image {} ({}) has no GPS data", index, stored.original_name);
        }
        ExtractionResult::Malformed(reason) => {
            warn!("Image {} ({}) metadata unreadable: {}", index, stored.original_name, reason);
        }
    }
    media
}

/// Runs [`build_media_file`] over the uploads one after another; indices start at 1.
pub fn build_media_files(stored: &[StoredUpload]) -> Vec<MediaFile> {
    stored
        .iter()
        .enumerate()
        .map(|(i, upload)| build_media_file(i + 1, upload))
        .collect()
}

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Form coordinates: blank, unparsable or non-finite input is `None`; zero is a value.
pub fn parse_coordinate(input: &str) -> Option<f64> {
    parse_f64(input)
}

pub fn new_travel(form: TravelForm, media: Vec<MediaFile>, now: DateTime<Local>) -> Travel {
    let title = form
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Travel {
        id: now.timestamp_millis().to_string(),
        title,
        description: form.description.unwrap_or_default(),
        latitude: form.latitude.as_deref().and_then(parse_coordinate),
        longitude: form.longitude.as_deref().and_then(parse_coordinate),
        tags: form.tags.as_deref().map(parse_tags).unwrap_or_default(),
        media,
        upload_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        created_at: now.with_timezone(&Utc),
    }
}

/// Deletes the stored files of an entry. Returns how many were removed.
pub fn remove_media_files(upload_dir: &Path, travel: &Travel) -> usize {
    let mut removed = 0;
    for media in &travel.media {
        // Only the bare file name is trusted; the stored path is never joined as-is
        let Some(name) = Path::new(&media.filename).file_name() else {
            continue;
        };
        let path = upload_dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
    removed
}

/// Best-effort cleanup for files stored by a request that later failed.
pub fn discard_uploads(stored: &[StoredUpload]) {
    for upload in stored {
        if let Err(e) = std::fs::remove_file(&upload.disk_path) {
            debug!("Could not discard {}: {}", upload.disk_path.display(), e);
        }
    }
}
