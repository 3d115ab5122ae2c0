use serde::Deserialize;

use super::error::AiError;

/// Chat-completion response body, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatResponse {
    /// First completion's text content, trimmed of surrounding whitespace.
    pub fn into_content(self) -> Result<String, AiError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::MalformedResponse("response contained no choices".to_string()))?;
        Ok(choice.message.content.trim().to_string())
    }
}
