//! Generative-language API interaction.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait defining a single async prompt/response exchange
//! - [`GeminiClient`]: calls the Gemini `generateContent` REST endpoint
//!
//! Each call is made exactly once. There is no retry wrapper, and a failed
//! call degrades only the article it was made for.

use crate::config::Config;
use crate::error::DigestError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to a model and return its answer. The
/// summarizer only depends on this trait, so tests can script responses.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send `text` to the model and receive a response.
    ///
    /// # Arguments
    ///
    /// * `text` - The complete prompt, sent as a single user turn
    ///
    /// # Returns
    ///
    /// The model's answer.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-success status, API error object, or an
    /// answer without usable text. Implementations make one attempt only.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini `generateContent` client.
///
/// Borrows the run [`Config`] for the API key, model name and output cap.
#[derive(Debug)]
pub struct GeminiClient<'a> {
    http: Client,
    config: &'a Config,
}

impl<'a> GeminiClient<'a> {
    pub fn new(config: &'a Config) -> Result<Self, DigestError> {
        Ok(Self {
            http: Client::builder().build()?,
            config,
        })
    }

    fn endpoint(&self) -> Result<Url, DigestError> {
        let path = format!("v1beta/models/{}:generateContent", self.config.model);
        self.config
            .gemini_api_base
            .join(&path)
            .map_err(|e| DigestError::InvalidConfig {
                name: "--gemini-api-base",
                reason: e.to_string(),
            })
    }
}

impl<'a> AskAsync for GeminiClient<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let resp = self
            .http
            .post(self.endpoint()?)
            .header("x-goog-api-key", &self.config.gemini_api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let raw = resp.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorBody>(&raw) {
                Ok(body) => format!(
                    "{} {}: {}",
                    body.error.code.unwrap_or(status.as_u16()),
                    body.error.status.unwrap_or_default(),
                    body.error.message
                ),
                Err(_) => format!("HTTP {status}"),
            };
            warn!(elapsed_ms = dt.as_millis(), %status, "API call failed");
            return Err(DigestError::Generation(detail).into());
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw)?;
        debug!(
            elapsed_ms = dt.as_millis(),
            candidates = parsed.candidates.len(),
            "API call succeeded"
        );
        Ok(first_candidate_text(parsed)?)
    }
}

/// Pull the text of the first part of the primary candidate.
fn first_candidate_text(resp: GenerateContentResponse) -> Result<String, DigestError> {
    let block_reason = resp.prompt_feedback.and_then(|f| f.block_reason);
    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = match block_reason {
            Some(r) => format!("no candidates returned (prompt blocked: {r})"),
            None => "no candidates returned".to_string(),
        };
        return Err(DigestError::Generation(reason));
    };

    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            DigestError::Generation(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "gemini-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "こんにちは"}]}],
                "generationConfig": {"maxOutputTokens": 500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "タイトル: 見出し\n記事: 本文"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri(), &server.uri());
        let client = GeminiClient::new(&config).unwrap();
        let answer = client.ask("こんにちは").await.unwrap();

        assert_eq!(answer, "タイトル: 見出し\n記事: 本文");
    }

    #[tokio::test]
    async fn missing_candidate_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let config = test_config(&server.uri(), &server.uri());
        let client = GeminiClient::new(&config).unwrap();
        let err = client.ask("prompt").await.unwrap_err();

        assert!(err.to_string().contains("no candidates returned"));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn candidate_without_text_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "MAX_TOKENS"}]
            })))
            .mount(&server)
            .await;

        let config = test_config(&server.uri(), &server.uri());
        let client = GeminiClient::new(&config).unwrap();
        let err = client.ask("prompt").await.unwrap_err();

        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn api_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let config = test_config(&server.uri(), &server.uri());
        let client = GeminiClient::new(&config).unwrap();
        let err = client.ask("prompt").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Gemini API error: 400 INVALID_ARGUMENT: API key not valid."
        );
    }
}
