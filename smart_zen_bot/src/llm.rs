//! Thin client for an OpenAI-compatible chat completion endpoint. The
//! model is a black box here: two prompts in, one trimmed string out.

use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const MODEL: &str = "llama-3.3-70b-versatile";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Persona for the admin's free-text questions.
pub const ASSISTANT_SYSTEM_PROMPT: &str = concat!(
    "Ты — умный, знающий и вежливый помощник. ",
    "Никогда не упоминай, что ты искусственный интеллект, бот, программа или модель. ",
    "Не отвечай на вопросы о том, кто ты или как ты устроен. ",
    "Всегда отвечай на том языке, на котором к тебе обратился пользователь. ",
    "Отвечай всегда по делу."
);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug)]
pub enum LlmError {
    Http(reqwest::Error),
    /// The API answered 200 but with no choices in it.
    EmptyResponse,
}

impl Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Http(e) => write!(f, "LLM request failed: {e}"),
            LlmError::EmptyResponse => write!(f, "LLM returned no completion choices"),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Http(e)
    }
}

pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
}

impl LlmClient {
    /// # Panics
    ///
    /// Panics if the TLS backend can't be initialized. Called once at
    /// startup, so that's where it would die.
    pub fn new(api_key: String) -> LlmClient {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .expect("Failed to build the HTTP client!");
        LlmClient { client, api_key }
    }

    /// One completion round trip. Bounded by the client timeout; any
    /// failure mode comes back as a single error for the caller to
    /// translate into a user-facing fallback.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: MODEL,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn response_shape_parses() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "  Привет!  "}}
            ],
            "usage": {"total_tokens": 42}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.trim(), "Привет!");
    }

    #[test]
    fn empty_choices_parse_but_are_detectable() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
