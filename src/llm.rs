//! `BookService` backed by an OpenAI-compatible chat completions API.
//!
//! Every call is a single non-streaming request. No retries and no client
//! timeout are configured here; the transport defaults apply.

use crate::config::{ApiConfig, PromptsConfig};
use crate::error::ServiceError;
use crate::models::{BookMetadata, Genre};
use crate::service::{BookService, ChapterDraft};
use crate::utils::{char_prefix, check_response_status};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters of the book sent for metadata analysis.
pub const ANALYZE_SAMPLE_CHARS: usize = 5_000;

/// Characters of the book sent for chapter segmentation.
pub const SPLIT_SAMPLE_CHARS: usize = 30_000;

/// Regex to extract JSON from markdown code fences.
static CODE_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("Invalid CODE_FENCE_REGEX")
});

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Response from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Metadata as the model returns it; every field may be missing.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawMetadata {
    title: Option<String>,
    author: Option<String>,
    #[serde(alias = "detected_language", alias = "language")]
    detected_language: Option<String>,
    genre: Option<String>,
    summary: Option<String>,
}

impl RawMetadata {
    fn into_metadata(self) -> BookMetadata {
        fn or(value: Option<String>, fallback: &str) -> String {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        }

        BookMetadata {
            title: or(self.title, "Untitled"),
            author: or(self.author, "Unknown"),
            detected_language: or(self.detected_language, "unknown"),
            genre: self
                .genre
                .as_deref()
                .and_then(|g| g.parse().ok())
                .unwrap_or(Genre::Fiction),
            summary: or(self.summary, ""),
        }
    }
}

/// Chat-completions client implementing the three book operations.
pub struct LlmClient {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
    /// System prompts.
    prompts: PromptsConfig,
}

impl LlmClient {
    /// Create a new LlmClient.
    pub fn new(api_config: ApiConfig, prompts: PromptsConfig) -> Self {
        Self {
            client: Client::new(),
            api_config,
            prompts,
        }
    }

    /// Send one chat request and return the assistant's text.
    async fn call_model(
        &self,
        system: String,
        user: String,
        temperature: Option<f32>,
        json_object: bool,
    ) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.api_config.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            response_format: json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!(
            "{}/chat/completions",
            self.api_config.base_url.trim_end_matches('/')
        );
        tracing::debug!(%url, model = %self.api_config.model, "sending chat request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_config.key))
            .json(&request)
            .send()
            .await?;
        let response = check_response_status(response).await?;

        let body: ChatResponse = response.json().await.map_err(|e| {
            ServiceError::ParseError(format!("Failed to parse API response: {}", e))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::ParseError("No choices in API response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl BookService for LlmClient {
    async fn analyze_metadata(&self, sample: &str) -> Result<BookMetadata, ServiceError> {
        if sample.trim().is_empty() {
            return Err(ServiceError::EmptyInput {
                operation: "Analysis",
            });
        }

        let text = char_prefix(sample, ANALYZE_SAMPLE_CHARS);
        let raw = self
            .call_model(
                self.prompts.analyze_metadata.clone(),
                format!("Text: {}", text),
                None,
                true,
            )
            .await?;

        parse_metadata(&raw)
    }

    async fn split_into_chapters(&self, text: &str) -> Result<Vec<ChapterDraft>, ServiceError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sample = char_prefix(text, SPLIT_SAMPLE_CHARS);
        let raw = self
            .call_model(
                self.prompts.split_chapters.clone(),
                format!("Text: {}", sample),
                None,
                false,
            )
            .await?;

        parse_chapters(&raw)
    }

    async fn translate_chapter(
        &self,
        text: &str,
        genre: Genre,
        context: &str,
    ) -> Result<String, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput {
                operation: "Translation",
            });
        }

        let system = render_translation_prompt(&self.prompts.translate_chapter, genre, context);
        let translated = self
            .call_model(
                system,
                text.to_string(),
                Some(self.api_config.translation_temperature),
                false,
            )
            .await?;

        if translated.is_empty() {
            return Err(ServiceError::ParseError("Empty translation".to_string()));
        }
        Ok(translated)
    }
}

/// Fill the `{genre}` and `{context}` placeholders of the translation prompt.
pub fn render_translation_prompt(template: &str, genre: Genre, context: &str) -> String {
    template
        .replace("{genre}", genre.as_str())
        .replace("{context}", context)
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    match CODE_FENCE_REGEX.captures(trimmed) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(trimmed),
        None => trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim(),
    }
}

/// Slice out the outermost `open ... close` span.
fn extract_delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

fn parse_metadata(raw: &str) -> Result<BookMetadata, ServiceError> {
    let json = strip_code_fence(raw);
    let json = extract_delimited(json, '{', '}')
        .ok_or_else(|| ServiceError::ParseError("No valid JSON object found".to_string()))?;

    let parsed: RawMetadata = serde_json::from_str(json)
        .map_err(|e| ServiceError::ParseError(format!("JSON parse error: {}", e)))?;

    Ok(parsed.into_metadata())
}

/// Accepts either a bare array or an object wrapping a `chapters` array.
fn parse_chapters(raw: &str) -> Result<Vec<ChapterDraft>, ServiceError> {
    #[derive(Deserialize)]
    struct Wrapped {
        chapters: Vec<ChapterDraft>,
    }

    let json = strip_code_fence(raw);

    if let Ok(chapters) = serde_json::from_str::<Vec<ChapterDraft>>(json) {
        return Ok(chapters);
    }
    if let Ok(wrapped) = serde_json::from_str::<Wrapped>(json) {
        return Ok(wrapped.chapters);
    }

    let array = extract_delimited(json, '[', ']')
        .ok_or_else(|| ServiceError::ParseError("No valid JSON array found".to_string()))?;
    serde_json::from_str(array)
        .map_err(|e| ServiceError::ParseError(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_valid() {
        let raw = r#"{"title":"Dune","author":"Frank Herbert","detectedLanguage":"English","genre":"sci-fi","summary":"Spice."}"#;
        let meta = parse_metadata(raw).unwrap();
        assert_eq!(meta.title, "Dune");
        assert_eq!(meta.author, "Frank Herbert");
        assert_eq!(meta.detected_language, "English");
        assert_eq!(meta.genre, Genre::SciFi);
    }

    #[test]
    fn test_parse_metadata_with_code_fence() {
        let raw = "```json\n{\"title\":\"Kitob\",\"author\":\"Muallif\",\"genre\":\"history\"}\n```";
        let meta = parse_metadata(raw).unwrap();
        assert_eq!(meta.title, "Kitob");
        assert_eq!(meta.genre, Genre::History);
        assert_eq!(meta.detected_language, "unknown");
    }

    #[test]
    fn test_parse_metadata_unknown_genre_and_missing_fields() {
        let raw = r#"Sure! {"genre":"cookbook"}"#;
        let meta = parse_metadata(raw).unwrap();
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.genre, Genre::Fiction);
    }

    #[test]
    fn test_parse_metadata_invalid() {
        assert!(parse_metadata("no json here").is_err());
    }

    #[test]
    fn test_parse_chapters_array() {
        let raw = r#"[{"title":"One","content":"First."},{"title":"Two","content":"Second."}]"#;
        let chapters = parse_chapters(raw).unwrap();
        assert_eq!(
            chapters,
            vec![
                ChapterDraft::new("One", "First."),
                ChapterDraft::new("Two", "Second.")
            ]
        );
    }

    #[test]
    fn test_parse_chapters_wrapped_and_partial() {
        let raw = r#"{"chapters":[{"content":"Untitled body"}]}"#;
        let chapters = parse_chapters(raw).unwrap();
        assert_eq!(chapters, vec![ChapterDraft::new("", "Untitled body")]);
    }

    #[test]
    fn test_parse_chapters_null_fields() {
        let raw = r#"[{"title":null,"content":"Body"},{"title":"Two","content":null}]"#;
        let chapters = parse_chapters(raw).unwrap();
        assert_eq!(
            chapters,
            vec![ChapterDraft::new("", "Body"), ChapterDraft::new("Two", "")]
        );
    }

    #[test]
    fn test_parse_chapters_empty_and_fenced() {
        assert!(parse_chapters("```json\n[]\n```").unwrap().is_empty());
        assert!(parse_chapters("Here you go: [] done").unwrap().is_empty());
        assert!(parse_chapters("nothing").is_err());
    }

    #[test]
    fn test_render_translation_prompt() {
        let prompt = render_translation_prompt(
            "Genre: {genre}\nContext: {context}",
            Genre::SelfHelp,
            "Book: Habits by Clear",
        );
        assert_eq!(prompt, "Genre: self-help\nContext: Book: Habits by Clear");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![Message {
                role: "user",
                content: "hi".to_string(),
            }],
            temperature: None,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"response_format\":{\"type\":\"json_object\"}"));
        assert!(!json.contains("temperature"));
    }

    #[tokio::test]
    async fn test_blank_input_rejected_without_request() {
        let client = LlmClient::new(ApiConfig::default(), PromptsConfig::default());

        assert!(matches!(
            client.analyze_metadata("  \n ").await,
            Err(ServiceError::EmptyInput { .. })
        ));
        assert!(matches!(
            client.translate_chapter("", Genre::Fiction, "ctx").await,
            Err(ServiceError::EmptyInput { .. })
        ));
        assert!(client.split_into_chapters("   ").await.unwrap().is_empty());
    }
}
