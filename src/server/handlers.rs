use axum::{
    body::Bytes,
    extract::{Multipart, Path as AxumPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Local;
use rust_embed::RustEmbed;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::constants::MEDIA_FIELD;
use crate::database::Travel;
use crate::exif_parser::{extract_from_tags, parse_tag_map, ExtractionResult, DISPLAY_PRECISION};
use crate::html_template;
use crate::processing::{
    build_media_files, discard_uploads, new_travel, remove_media_files, store_upload, StoredUpload, TravelForm,
};
use crate::reverse_geocode::resolve_location_name;
use crate::titles::{generate_title as generate_title_response, TitleRequest, TitleResponse};
use crate::utils::lenient_f64;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct Asset;

// A file part of the upload form, held in memory until it is written out
struct IncomingFile {
    original_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

// HTML pages

pub async fn index_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let travels = state
        .db
        .get_all()
        .map_err(|e| ApiError::internal("Failed to load travels", e))?;
    Ok(html_template::index_page(&travels))
}

pub async fn add_page(State(state): State<AppState>) -> Html<String> {
    html_template::add_page(state.settings.max_files)
}

pub async fn travel_page(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> ApiResult<Response> {
    let travel = state
        .db
        .find(&id)
        .map_err(|e| ApiError::internal("Failed to load travel", e))?;

    Ok(match travel {
        Some(travel) => html_template::detail_page(&travel).into_response(),
        None => (StatusCode::NOT_FOUND, html_template::not_found_page()).into_response(),
    })
}

/// Serves embedded frontend files from `/assets/*path`.
pub async fn asset(AxumPath(path): AxumPath<String>) -> Response {
    let Some(content) = Asset::get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let content_type = match path.rsplit('.').next() {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("html") => "text/html; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    };
    ([(header::CONTENT_TYPE, content_type)], content.data.into_owned()).into_response()
}

// JSON API

pub async fn list_travels(State(state): State<AppState>) -> ApiResult<Json<Vec<Travel>>> {
    let travels = state
        .db
        .get_all()
        .map_err(|e| ApiError::internal("Failed to load travels", e))?;
    Ok(Json(travels))
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
    let mut form = TravelForm::default();
    let mut files: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == MEDIA_FIELD {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read {original_name}: {e}")))?;

            // Browsers send an empty part when no file was chosen
            if original_name.is_empty() && bytes.is_empty() {
                continue;
            }
            if files.len() >= state.settings.max_files {
                return Err(ApiError::BadRequest(format!(
                    "Too many files, at most {} per entry",
                    state.settings.max_files
                )));
            }
            files.push(IncomingFile {
                original_name,
                content_type,
                bytes,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid field {name}: {e}")))?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "latitude" => form.latitude = Some(value),
            "longitude" => form.longitude = Some(value),
            "tags" => form.tags = Some(value),
            other => debug!("Ignoring unknown upload field {other}"),
        }
    }

    let upload_dir = state.settings.upload_dir.clone();
    let (stored, media) = tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        let mut stored: Vec<StoredUpload> = Vec::with_capacity(files.len());
        for file in &files {
            match store_upload(
                &upload_dir,
                MEDIA_FIELD,
                &file.original_name,
                file.content_type.as_deref(),
                &file.bytes,
                &mut rng,
            ) {
                Ok(upload) => stored.push(upload),
                Err(e) => {
                    discard_uploads(&stored);
                    return Err(e);
                }
            }
        }
        let media = build_media_files(&stored);
        Ok((stored, media))
    })
    .await
    .map_err(|e| ApiError::internal("Upload task failed", e))?
    .map_err(|e| ApiError::internal("Failed to store uploaded files", e))?;

    let travel = new_travel(form, media, Local::now());
    if let Err(e) = state.db.insert(travel.clone()) {
        discard_uploads(&stored);
        return Err(ApiError::internal("Failed to save travel", e));
    }

    info!("Saved travel {} \"{}\" with {} file(s)", travel.id, travel.title, travel.media.len());
    Ok(Json(json!({
        "success": true,
        "message": "Travel entry saved",
        "travel": travel,
    })))
}

/// Never rejects the body: anything unreadable is treated as an empty request
/// and answered with the fallback title.
pub async fn generate_title(State(state): State<AppState>, body: Bytes) -> Json<TitleResponse> {
    let request = serde_json::from_slice::<TitleRequest>(&body).unwrap_or_else(|e| {
        debug!("Unreadable title request, using defaults: {}", e);
        TitleRequest::default()
    });
    Json(generate_title_response(&state.gemini, &request).await)
}

pub async fn delete_travel(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> ApiResult<Json<Value>> {
    let removed = state
        .db
        .remove(&id)
        .map_err(|e| ApiError::internal("Failed to delete travel", e))?
        .ok_or_else(|| ApiError::NotFound("Travel not found".to_string()))?;

    let deleted_files = remove_media_files(&state.settings.upload_dir, &removed);
    info!("Deleted travel {} and {} file(s)", removed.id, deleted_files);

    Ok(Json(json!({ "success": true, "message": "Travel entry deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

pub async fn reverse_geocode(
    State(state): State<AppState>,
    Json(request): Json<ReverseGeocodeRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) else {
        return Err(ApiError::BadRequest("latitude and longitude are required".to_string()));
    };

    let location_name = resolve_location_name(&state.gemini, latitude, longitude).await;
    Ok(Json(json!({
        "success": true,
        "locationName": location_name,
        "latitude": latitude,
        "longitude": longitude,
    })))
}

/// GPS preview for tags the browser has already decoded.
pub async fn exif_gps(body: Bytes) -> Json<Value> {
    let Some(tags) = parse_tag_map(&body) else {
        debug!("EXIF preview body is not a JSON object");
        return Json(json!({ "found": false }));
    };

    let response = match extract_from_tags(&tags) {
        ExtractionResult::Coordinate { coordinate, device } => {
            let coordinate = coordinate.rounded(DISPLAY_PRECISION);
            let mut value = json!({
                "found": true,
                "latitude": coordinate.latitude,
                "longitude": coordinate.longitude,
            });
            if let (Some(device), Some(map)) = (device, value.as_object_mut()) {
                map.insert("make".into(), device.make.into());
                map.insert("model".into(), device.model.into());
                map.insert("dateTime".into(), device.date_time.into());
            }
            value
        }
        ExtractionResult::Absent | ExtractionResult::Malformed(_) => json!({ "found": false }),
    };
    Json(response)
}
