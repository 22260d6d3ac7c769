use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no text")]
    EmptyResponse,
    #[error("response contained no JSON object")]
    NoJson,
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Base64 image handed to the model inline.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

// Externally tagged on the wire: {"text": ..} or {"inlineData": {..}}.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
}

impl<'a> From<&'a Part> for RequestPart<'a> {
    fn from(part: &'a Part) -> Self {
        match part {
            Part::Text(text) => RequestPart::Text(text),
            Part::Image(image) => RequestPart::InlineData {
                mime_type: &image.mime_type,
                data: &image.data,
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Thin client for the `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the parts as one user turn and returns the first candidate's text.
    pub async fn generate(&self, parts: &[Part]) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateRequest {
            contents: [Content {
                parts: parts.iter().map(RequestPart::from).collect(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        debug!("Gemini response: {}", preview(&text, 100));
        Ok(text)
    }

    /// Like [`generate`](Self::generate) but expects a JSON object somewhere in the reply.
    pub async fn generate_json(&self, parts: &[Part]) -> Result<Value, GeminiError> {
        let text = self.generate(parts).await?;
        extract_json_block(&text)
    }
}

/// Splits `data:<mime>;base64,<payload>`; bare payloads are assumed to be JPEG.
pub fn parse_data_url(input: &str) -> InlineImage {
    static DATA_URL: OnceLock<Regex> = OnceLock::new();
    let re = DATA_URL.get_or_init(|| Regex::new(r"^data:([A-Za-z0-9.+/-]+);base64,(.+)$").expect("valid regex"));

    match re.captures(input) {
        Some(caps) => InlineImage {
            mime_type: caps[1].to_string(),
            data: caps[2].to_string(),
        },
        None => InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: input.to_string(),
        },
    }
}

/// Pulls the outermost `{ ... }` span out of free text and parses it.
pub fn extract_json_block(text: &str) -> Result<Value, GeminiError> {
    static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
    let re = JSON_BLOCK.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

    let block = re.find(text).ok_or(GeminiError::NoJson)?;
    Ok(serde_json::from_str(block.as_str())?)
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
