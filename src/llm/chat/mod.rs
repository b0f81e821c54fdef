pub mod gemini;
pub mod request;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::LlmConfig;
use self::gemini::GeminiChatClient;
use self::request::GeminiContent;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid chat client configuration: {0}")]
    Config(String),
    #[error("Chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Chat API returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("Could not decode chat response: {0}")]
    Decode(String),
}

/// One request, one full reply. `Ok(None)` means the model answered with no text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(
        &self,
        history: &[GeminiContent],
        system_instruction: &str,
        message: &str
    ) -> Result<Option<String>, ChatError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
