use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;

mod error;
mod response;

pub use error::AiError;
use response::ChatResponse;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You generate concise git commit messages.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 120;

/// One-shot chat-completion request.
///
/// No retries and no backoff: suggestions are user-triggered, so the caller
/// decides whether to try again. `api_url` overrides the default endpoint
/// (used by the config layer and the tests).
pub async fn request_completion(
    api_key: &str,
    model: &str,
    prompt: &str,
    api_url: Option<&str>,
) -> Result<String, AiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AiError::AuthenticationError(format!("Invalid API key: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("HTTP-Referer", HeaderValue::from_static("https://quill-cli.local"));
    headers.insert("X-Title", HeaderValue::from_static("Quill"));

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AiError::NetworkError(e.to_string()))?;

    let target = api_url.unwrap_or(DEFAULT_API_URL);
    tracing::debug!(model, target, "requesting commit message suggestion");

    let response = client
        .post(target)
        .headers(headers)
        .json(&json!({
            "model": model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        }))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                AiError::NetworkError("request timed out after 60 seconds".to_string())
            } else {
                AiError::NetworkError(e.to_string())
            }
        })?;

    match response.status() {
        StatusCode::OK => (),
        StatusCode::UNAUTHORIZED => {
            return Err(AiError::AuthenticationError(
                "API key was rejected (401)".to_string(),
            ));
        }
        status => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(AiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
    }

    let body = response
        .text()
        .await
        .map_err(|e| AiError::NetworkError(format!("Failed to read response body: {}", e)))?;

    let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
        AiError::MalformedResponse(format!(
            "Failed to parse completion response: {} - Raw response: {}",
            e, body
        ))
    })?;

    parsed.into_content()
}
