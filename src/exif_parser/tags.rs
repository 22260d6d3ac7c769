//! GPS extraction from a tag mapping already decoded by the browser.
//!
//! The mapping follows the naming used by client-side EXIF readers
//! (`GPSLatitude`, `GPSLatitudeRef`, `Make`, ...). Values arrive as JSON, so
//! every shape is checked here and anything unexpected degrades to
//! [`ExtractionResult::Absent`].

use serde_json::{Map, Value};
use tracing::debug;

use super::generic::{convert_rationals, DeviceInfo, ExtractionResult, GeoCoordinate, HemisphereRef, Rational};

pub type TagMap = Map<String, Value>;

/// Shown for device fields the image does not carry.
pub const UNKNOWN_FIELD: &str = "Unknown";

pub fn extract_from_tags(tags: &TagMap) -> ExtractionResult {
    let (Some(lat_value), Some(lon_value)) = (present(tags, "GPSLatitude"), present(tags, "GPSLongitude")) else {
        debug!("No GPS tags in decoded metadata");
        return ExtractionResult::Absent;
    };

    let latitude = rationals(lat_value).and_then(|parts| convert_rationals(&parts, reference(tags, "GPSLatitudeRef")));
    let longitude = rationals(lon_value).and_then(|parts| convert_rationals(&parts, reference(tags, "GPSLongitudeRef")));

    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        debug!("GPS tags present but not convertible: {:?} / {:?}", lat_value, lon_value);
        return ExtractionResult::Absent;
    };

    let device = DeviceInfo {
        make: text(tags, "Make"),
        model: text(tags, "Model"),
        date_time: text(tags, "DateTime"),
    };

    ExtractionResult::Coordinate {
        coordinate: GeoCoordinate { latitude, longitude },
        device: Some(device),
    }
}

/// Parses a raw request body into a tag map; anything but a JSON object is `None`.
pub fn parse_tag_map(body: &[u8]) -> Option<TagMap> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            debug!("Tag payload is not an object: {}", other);
            None
        }
        Err(e) => {
            debug!("Tag payload is not JSON: {}", e);
            None
        }
    }
}

fn present<'a>(tags: &'a TagMap, key: &str) -> Option<&'a Value> {
    tags.get(key).filter(|value| !value.is_null())
}

fn rationals(value: &Value) -> Option<Vec<Rational>> {
    value.as_array()?.iter().map(rational).collect()
}

// Accepts `37`, `[37, 1]` and `{"numerator": 37, "denominator": 1}`.
fn rational(value: &Value) -> Option<Rational> {
    match value {
        Value::Number(n) => n.as_f64().map(Rational::whole),
        Value::Array(pair) => match pair.as_slice() {
            [num, denom] => Some(Rational::new(num.as_f64()?, denom.as_f64()?)),
            _ => None,
        },
        Value::Object(fields) => {
            let num = fields.get("numerator")?.as_f64()?;
            let denom = fields.get("denominator")?.as_f64()?;
            Some(Rational::new(num, denom))
        }
        _ => None,
    }
}

fn reference(tags: &TagMap, key: &str) -> Option<HemisphereRef> {
    tags.get(key)?.as_str().and_then(HemisphereRef::parse)
}

fn text(tags: &TagMap, key: &str) -> String {
    tags.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim_matches(char::from(0)).trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_FIELD)
        .to_string()
}
