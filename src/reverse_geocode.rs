use serde_json::Value;
use tracing::{info, warn};

use crate::gemini::{GeminiClient, Part};
use crate::geocoding::{coordinate_label, format_ai_location, lookup_region};

/// Resolves a place name: built-in region table first, then the model,
/// then the bare coordinates.
pub async fn resolve_location_name(client: &GeminiClient, lat: f64, lon: f64) -> String {
    if let Some(region) = lookup_region(lat, lon) {
        return region.to_string();
    }

    info!("Asking Gemini for the region at ({}, {})", lat, lon);
    match client.generate_json(&[Part::Text(reverse_geocode_prompt(lat, lon))]).await {
        Ok(value) => match location_from_value(&value) {
            Some(name) => {
                info!("Gemini located ({}, {}) as {}", lat, lon, name);
                name
            }
            None => coordinate_label(lat, lon),
        },
        Err(e) => {
            warn!("Gemini reverse geocoding failed: {}", e);
            coordinate_label(lat, lon)
        }
    }
}

pub fn location_from_value(value: &Value) -> Option<String> {
    let region = value.get("regionName").and_then(Value::as_str).filter(|r| !r.trim().is_empty())?;
    let city = value.get("city").and_then(Value::as_str);
    let landmark = value.get("landmark").and_then(Value::as_str);
    Some(format_ai_location(region, city, landmark))
}

pub fn reverse_geocode_prompt(lat: f64, lon: f64) -> String {
    format!(
        r#"Identify the region name for the given coordinates as accurately as possible.

Coordinates: latitude {lat}, longitude {lon}

Response (JSON only):
{{
  "regionName": "metropolitan city or region (e.g. Seoul, Busan, Gyeongju, Gangneung)",
  "city": "city / county / district (if any)",
  "landmark": "well-known landmark or attraction (if any)"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
    use serde_json::json;

    #[test]
    fn builds_name_from_ai_reply() {
        let value = json!({ "regionName": "Gangneung", "city": "", "landmark": "Gyeongpo Beach" });
        assert_eq!(location_from_value(&value).as_deref(), Some("Gangneung - Gyeongpo Beach"));
        assert_eq!(location_from_value(&json!({ "city": "Gyo-dong" })), None);
    }

    #[tokio::test]
    async fn table_hit_skips_the_model() {
        let client = GeminiClient::new(None, DEFAULT_MODEL, DEFAULT_BASE_URL);
        assert_eq!(resolve_location_name(&client, 35.8264, 129.2236).await, "Gyeongju");
    }

    #[tokio::test]
    async fn unknown_place_without_model_falls_back_to_coordinates() {
        let client = GeminiClient::new(None, DEFAULT_MODEL, DEFAULT_BASE_URL);
        assert_eq!(resolve_location_name(&client, 48.85661, 2.35222).await, "48.8566, 2.3522");
    }
}
