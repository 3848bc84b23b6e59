//! Gemini API client for conversation and image generation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chatbot::services::{ChatModel, GeneratedImage, ImageModel};
use crate::chatbot::transcript::Turn;
use crate::error::{BotError, Result};

pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    chat_model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings", skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<&'static str>,
}

impl GenerationConfig {
    fn chat() -> Self {
        Self {
            temperature: Some(1.0),
            top_p: Some(0.95),
            top_k: Some(0),
            max_output_tokens: Some(4000),
            ..Default::default()
        }
    }

    fn image() -> Self {
        Self {
            response_modalities: vec!["TEXT", "IMAGE"],
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn safety_settings() -> Vec<SafetySetting> {
    SAFETY_CATEGORIES
        .iter()
        .map(|&category| SafetySetting { category, threshold: SAFETY_THRESHOLD })
        .collect()
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
struct InlineData {
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    data: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, chat_model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self { api_key, base_url, chat_model, client })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_content(&self, model: &str, request: &GenerateRequest<'_>) -> Result<GenerateResponse> {
        let url = self.model_url(model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("Gemini response status: {status}");

        if !status.is_success() {
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(BotError::Model(format!("API error {status}: {message}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            return Err(BotError::Model(format!("Gemini error: {}", error.message)));
        }
        Ok(parsed)
    }
}

fn first_parts(response: GenerateResponse) -> Vec<ResponsePart> {
    response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default()
}

/// Concatenated text of the first candidate, if it has any.
fn reply_text(response: GenerateResponse) -> Option<String> {
    let text: String = first_parts(response)
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() { None } else { Some(text) }
}

/// The first inline image of the first candidate.
fn inline_image(response: GenerateResponse) -> Result<GeneratedImage> {
    let inline = first_parts(response)
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| BotError::Model("No image in response".to_string()))?;

    let data = base64::engine::general_purpose::STANDARD.decode(&inline.data)?;
    Ok(GeneratedImage { data, mime_type: inline.mime_type })
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn send(&self, history: &[Turn], prompt: &str) -> Result<Option<String>> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.as_str()),
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        contents.push(Content { role: Some("user"), parts: vec![Part { text: prompt }] });

        let request = GenerateRequest {
            contents,
            generation_config: GenerationConfig::chat(),
            safety_settings: safety_settings(),
        };

        debug!("Chat request to {} with {} prior turns", self.chat_model, history.len());
        let response = self.generate_content(&self.chat_model, &request).await?;
        Ok(reply_text(response))
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        info!("🎨 Generating image: {}", prompt);

        let request = GenerateRequest {
            contents: vec![Content { role: None, parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig::image(),
            safety_settings: Vec::new(),
        };

        let response = self.generate_content(IMAGE_MODEL, &request).await?;
        let image = inline_image(response)?;

        info!("🎨 Image generated: {} bytes", image.data.len());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GenerateResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_chat_model_is_configurable() {
        let client = GeminiClient::new(
            "key".into(),
            "https://example.test/v1beta".into(),
            "gemini-2.5-flash".into(),
        )
        .unwrap();
        assert_eq!(
            client.model_url(&client.chat_model),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.model_url(IMAGE_MODEL),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_chat_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: "hi" }] }],
            generation_config: GenerationConfig::chat(),
            safety_settings: safety_settings(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["temperature"], 1.0);
        assert_eq!(json["generationConfig"]["topK"], 0);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4000);
        assert!(json["generationConfig"].get("responseModalities").is_none());
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][3]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_image_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content { role: None, parts: vec![Part { text: "a cat" }] }],
            generation_config: GenerationConfig::image(),
            safety_settings: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert!(json["contents"][0].get("role").is_none());
        assert_eq!(json["generationConfig"]["responseModalities"][1], "IMAGE");
        assert!(json.get("safetySettings").is_none());
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" there"}]}}]}"#;
        assert_eq!(reply_text(parse(body)).as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_reply_text_absent_when_blocked() {
        // Blocked candidates come back without content.
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(reply_text(parse(body)), None);
        assert_eq!(reply_text(parse("{}")), None);
    }

    #[test]
    fn test_inline_image_decoded() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}
        ]}}]}"#;
        let image = inline_image(parse(body)).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_inline_image_missing() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"no can do"}]}}]}"#;
        let err = inline_image(parse(body)).unwrap_err();
        assert!(matches!(err, BotError::Model(_)));
    }

    #[test]
    fn test_inline_image_bad_base64() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"@@@"}}]}}]}"#;
        let err = inline_image(parse(body)).unwrap_err();
        assert!(matches!(err, BotError::Parse(_)));
    }
}
