use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::gemini::{parse_data_url, GeminiClient, GeminiError, Part};
use crate::geocoding::location_label;
use crate::utils::{lenient_f64, lenient_string, lenient_u32};

/// Below this length `imageData` is treated as a placeholder, not an image.
const MIN_IMAGE_DATA_LEN: usize = 100;

const DEFAULT_AI_TITLE: &str = "Capturing travel memories";
const DEFAULT_ACTIVITY: &str = "Travel";
const DEFAULT_ATMOSPHERE: &str = "A special experience";
const FALLBACK_THEME: &str = "Memories";

const TITLE_TEMPLATES: [&str; 10] = [
    "Special days in {location}",
    "Falling for {location}",
    "{location}: an unforgettable trip",
    "Excitement waiting in {location}",
    "Beautiful moments in {location}",
    "The start of a {location} journey",
    "New experiences in {location}",
    "The hidden charm of {location}",
    "Happiness found in {location}",
    "{location}, a trip that moved me",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub photo_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_image_list")]
    pub image_data_list: Vec<ImageData>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_data: Option<String>,
}

// `null`, non-arrays and entries without a string `data` are dropped
fn lenient_image_list<'de, D>(deserializer: D) -> Result<Vec<ImageData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("data").and_then(Value::as_str))
                .map(|data| ImageData { data: data.to_string() })
                .collect()
        })
        .unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageData {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub success: bool,
    pub title: String,
    pub suggestions: Vec<String>,
    pub activity_type: String,
    pub travel_theme: String,
}

/// Fields of the JSON object the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleSuggestion {
    pub main_title: Option<String>,
    pub suggestions: Vec<String>,
    pub activity_type: Option<String>,
    pub atmosphere: Option<String>,
}

impl TitleSuggestion {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            main_title: text("mainTitle"),
            suggestions: value
                .get("suggestions")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
                .unwrap_or_default(),
            activity_type: text("activityType"),
            atmosphere: text("atmosphere"),
        }
    }

    fn into_response(self, analysed_images: bool) -> TitleResponse {
        let (activity_type, travel_theme) = if analysed_images {
            (
                self.activity_type.unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
                self.atmosphere.unwrap_or_else(|| DEFAULT_ATMOSPHERE.to_string()),
            )
        } else {
            (DEFAULT_ACTIVITY.to_string(), FALLBACK_THEME.to_string())
        };

        TitleResponse {
            success: true,
            title: self.main_title.unwrap_or_else(|| DEFAULT_AI_TITLE.to_string()),
            suggestions: self.suggestions,
            activity_type,
            travel_theme,
        }
    }
}

/// Asks the model for a diary title, falling back to a template on any failure.
pub async fn generate_title(client: &GeminiClient, request: &TitleRequest) -> TitleResponse {
    let location = location_label(request.latitude, request.longitude);

    match request_title(client, request, &location).await {
        Ok(response) => response,
        Err(e) => {
            warn!("AI title generation failed, using a default title: {}", e);
            fallback_response(request.current_title.as_deref(), &location, &mut rand::thread_rng())
        }
    }
}

async fn request_title(
    client: &GeminiClient,
    request: &TitleRequest,
    location: &str,
) -> Result<TitleResponse, GeminiError> {
    let photo_count = request.photo_count.unwrap_or(0);

    let (parts, analysed_images) = if !request.image_data_list.is_empty() {
        info!("Analysing {} images for a title", request.image_data_list.len());
        let mut parts: Vec<Part> = request
            .image_data_list
            .iter()
            .map(|image| Part::Image(parse_data_url(&image.data)))
            .collect();
        parts.push(Part::Text(multi_image_prompt(request.image_data_list.len(), location, photo_count)));
        (parts, true)
    } else if let Some(data) = request.image_data.as_deref().filter(|d| d.len() > MIN_IMAGE_DATA_LEN) {
        info!("Analysing one image for a title ({} KB)", data.len() / 1024);
        let parts = vec![
            Part::Image(parse_data_url(data)),
            Part::Text(single_image_prompt(location, photo_count)),
        ];
        (parts, true)
    } else {
        info!("Generating a text-only title");
        let prompt = text_prompt(location, photo_count, request.current_title.as_deref());
        (vec![Part::Text(prompt)], false)
    };

    let value = client.generate_json(&parts).await?;
    Ok(TitleSuggestion::from_value(&value).into_response(analysed_images))
}

/// Keeps a non-blank user title, otherwise picks a random template.
pub fn default_title(current_title: Option<&str>, location: &str, rng: &mut impl Rng) -> String {
    if let Some(title) = current_title.filter(|t| !t.trim().is_empty()) {
        return title.to_string();
    }
    let template = TITLE_TEMPLATES[rng.gen_range(0..TITLE_TEMPLATES.len())];
    template.replace("{location}", location)
}

pub fn fallback_response(current_title: Option<&str>, location: &str, rng: &mut impl Rng) -> TitleResponse {
    TitleResponse {
        success: true,
        title: default_title(current_title, location, rng),
        suggestions: vec![
            format!("A special day in {}", location),
            format!("{} travel log", location),
            format!("Beautiful moments in {}", location),
        ],
        activity_type: DEFAULT_ACTIVITY.to_string(),
        travel_theme: FALLBACK_THEME.to_string(),
    }
}

const RESPONSE_FORMAT_WITH_ANALYSIS: &str = r#"## Response (JSON only):
{
  "activityType": "main detected activity",
  "atmosphere": "mood / feeling",
  "mainTitle": "an emotional travel title",
  "suggestions": [
    "alternative title 1",
    "alternative title 2",
    "alternative title 3"
  ]
}"#;

pub fn multi_image_prompt(image_count: usize, location: &str, photo_count: u32) -> String {
    format!(
        r#"You are a travel diary writer and an image analysis expert.

Analyse all {image_count} photos provided and create one title for the whole trip.

## Analysis:
1. Places and activities across all photos (look for common elements)
2. The overall type of activity on this trip
3. The overall atmosphere of the trip

## Title requirements:
- Location: {location}
- Number of photos: {photo_count}
- Style: a title that carries feelings and experiences
- Length: 18-28 characters
- Must include the activity type and an emotion

{RESPONSE_FORMAT_WITH_ANALYSIS}"#
    )
}

pub fn single_image_prompt(location: &str, photo_count: u32) -> String {
    format!(
        r#"You are a travel diary writer and an image analysis expert.

Analyse the photo and create an emotional, engaging travel title.

## Analysis:
1. The place or activity shown (food, architecture, nature, people, activities...)
2. The type of travel activity (heritage tour, food trip, hiking, shopping, cafe, nature, night views, festival...)
3. The mood of the photo (sentimental, active, relaxing, adventurous...)

## Title requirements:
- Location: {location}
- Number of photos: {photo_count}
- Style: a title that carries feelings and experiences (e.g. "A slow afternoon on Gangneung's cafe street")
- Length: 18-28 characters
- Must include the activity type and an emotion

{RESPONSE_FORMAT_WITH_ANALYSIS}"#
    )
}

pub fn text_prompt(location: &str, photo_count: u32, current_title: Option<&str>) -> String {
    let current_title = current_title.filter(|t| !t.trim().is_empty()).unwrap_or("none");
    format!(
        r#"You are a travel diary expert. Create an emotional, engaging travel title.

## Trip details:
- Location: {location}
- Photos/videos: {photo_count}
- Title entered by the user: {current_title}

## Title requirements:
- Carries feelings and experiences
- Length: 18-28 characters
- Must include the place name
- Must include an emotion
- e.g. "Shopping thrills in Myeongdong, Seoul", "Watching the sunset on a Busan beach"

## Response (JSON only):
{{
  "mainTitle": "an emotional travel title",
  "suggestions": [
    "alternative title 1",
    "alternative title 2",
    "alternative title 3"
  ]
}}"#
    )
}
