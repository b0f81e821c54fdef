use async_trait::async_trait;
use log::{ debug, info };
use reqwest::Client as HttpClient;
use url::Url;

use super::{ ChatClient, ChatError };
use super::request::{ build_request, GeminiContent, GenerateContentResponse };
use crate::llm::LlmConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: &str, base_url: &str) -> Result<Self, ChatError> {
        if api_key.trim().is_empty() {
            return Err(ChatError::Config("Google API key is required for GeminiChatClient".into()));
        }
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/'))).map_err(|e|
            ChatError::Config(format!("Invalid base URL '{}': {}", base_url, e))
        )?;
        let endpoint = base
            .join(&format!("v1beta/models/{}:generateContent", model))
            .map_err(|e| ChatError::Config(format!("Invalid model name '{}': {}", model, e)))?;

        Ok(Self {
            http: HttpClient::new(),
            api_key,
            model: model.to_string(),
            endpoint,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(api_key, config.model(), config.base_url())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn send(
        &self,
        history: &[GeminiContent],
        system_instruction: &str,
        message: &str
    ) -> Result<Option<String>, ChatError> {
        let payload = build_request(history, system_instruction, message);
        info!(
            "GeminiChatClient::send() → model={} history_len={}",
            self.model,
            history.len()
        );

        let resp = self.http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ChatError::Status { status: status.as_u16(), body });
        }
        debug!("Gemini response body: {}", body);

        let parsed: GenerateContentResponse = serde_json
            ::from_str(&body)
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(parsed.text())
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Turn;
    use crate::llm::chat::request::format_history;
    use mockito::Matcher;
    use serde_json::json;

    const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn client_for(server: &mockito::Server) -> GeminiChatClient {
        GeminiChatClient::new("test-key".to_string(), "gemini-2.5-flash", &server.url()).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let result = GeminiChatClient::new("  ".to_string(), "gemini-2.5-flash", "https://example.com");
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_endpoint_from_defaults() {
        let client = GeminiChatClient::from_config(&LlmConfig {
            api_key: Some("k".into()),
            ..LlmConfig::default()
        }).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GeminiChatClient::new("k".to_string(), "m", "not a url");
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[tokio::test]
    async fn test_send_posts_history_and_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(
                Matcher::PartialJson(
                    json!({
                    "contents": [
                        { "role": "model", "parts": [{ "text": "greeting" }] },
                        { "role": "user", "parts": [{ "text": "hello" }] }
                    ],
                    "systemInstruction": { "parts": [{ "text": "persona" }] }
                })
                )
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"hi there"}]}}]}"#)
            .create_async().await;

        let client = client_for(&server);
        let history = format_history(&[Turn::assistant("greeting")]);
        let reply = client.send(&history, "persona", "hello").await.unwrap();

        assert_eq!(reply.as_deref(), Some("hi there"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_empty_candidates_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async().await;

        let reply = client_for(&server).send(&[], "persona", "hello").await.unwrap();
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn test_send_whitespace_reply_is_returned() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"\n"}]}}]}"#)
            .create_async().await;

        let reply = client_for(&server).send(&[], "persona", "hello").await.unwrap();
        assert_eq!(reply.as_deref(), Some("\n"));
    }

    #[tokio::test]
    async fn test_send_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(503)
            .with_body("overloaded")
            .create_async().await;

        let result = client_for(&server).send(&[], "persona", "hello").await;
        match result {
            Err(ChatError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async().await;

        let result = client_for(&server).send(&[], "persona", "hello").await;
        assert!(matches!(result, Err(ChatError::Decode(_))));
    }

    #[tokio::test]
    async fn test_send_connection_refused() {
        let client = GeminiChatClient::new("k".to_string(), "gemini-2.5-flash", "http://127.0.0.1:1").unwrap();
        let result = client.send(&[], "persona", "hello").await;
        assert!(matches!(result, Err(ChatError::Transport(_))));
    }
}
