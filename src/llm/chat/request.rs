//! Gemini `generateContent` request and response bodies.
//!
//! The whole conversation is resent on every call. Payload size grows
//! linearly with the number of turns and nothing here truncates it.

use serde::{ Deserialize, Serialize };

use crate::models::chat::{ Role, Turn };

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    pub fn new(role: Role, text: &str) -> Self {
        Self {
            role: role.wire_name().to_string(),
            parts: vec![GeminiPart { text: text.to_string() }],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GeminiSystemInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    pub system_instruction: GeminiSystemInstruction,
}

/// Maps prior turns to history entries, oldest first.
pub fn format_history(turns: &[Turn]) -> Vec<GeminiContent> {
    turns.iter().map(|turn| GeminiContent::new(turn.role, &turn.text)).collect()
}

pub fn build_request(
    history: &[GeminiContent],
    system_instruction: &str,
    message: &str
) -> GenerateContentRequest {
    let mut contents = Vec::with_capacity(history.len() + 1);
    contents.extend_from_slice(history);
    contents.push(GeminiContent::new(Role::User, message));

    GenerateContentRequest {
        contents,
        system_instruction: GeminiSystemInstruction {
            parts: vec![GeminiPart { text: system_instruction.to_string() }],
        },
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, `None` when it is missing or empty.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_maps_roles_in_order() {
        let turns = vec![Turn::assistant("greeting"), Turn::user("question"), Turn::assistant("answer")];
        let history = format_history(&turns);
        let roles: Vec<_> = history.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["model", "user", "model"]);
        assert_eq!(history[1].parts[0].text, "question");
    }

    #[test]
    fn test_request_shape() {
        let history = format_history(&[Turn::assistant("hi")]);
        let request = build_request(&history, "be brief", "আজকের খবর কি?");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [
                    { "role": "model", "parts": [{ "text": "hi" }] },
                    { "role": "user", "parts": [{ "text": "আজকের খবর কি?" }] }
                ],
                "systemInstruction": { "parts": [{ "text": "be brief" }] }
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ab"},{"text":"cd"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.text().as_deref(), Some("abcd"));
    }

    #[test]
    fn test_response_without_text_is_none() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
        ] {
            let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
            assert_eq!(resp.text(), None, "body: {}", body);
        }
    }

    #[test]
    fn test_whitespace_reply_is_kept() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"\n"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.text().as_deref(), Some("\n"));
    }
}
