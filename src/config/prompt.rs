use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;
use thiserror::Error;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful, polite, and knowledgeable AI assistant for a Bangla News Media app. \
Your primary language is Bengali. Answer user queries about news, general knowledge, \
or the app features concisely in Bengali.";

pub const DEFAULT_GREETING: &str =
    "আসসালামু আলাইকুম! আমি বাংলা নিউজ মিডিয়ার এআই অ্যাসিস্ট্যান্ট। আমি আপনাকে কীভাবে সাহায্য করতে পারি?";

pub const DEFAULT_EMPTY_REPLY: &str = "দুঃখিত, কোনো উত্তর পাওয়া যায়নি।";

pub const DEFAULT_ERROR_REPLY: &str =
    "দুঃখিত, একটি ত্রুটি হয়েছে। অনুগ্রহ করে পরে আবার চেষ্টা করুন।";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Prompt field '{0}' must not be empty")]
    MissingField(&'static str),
}

/// Fixed texts of the chat widget. Every field may be overridden from a
/// JSON file; omitted fields keep their defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub system_instruction: String,
    pub greeting: String,
    pub empty_reply: String,
    pub error_reply: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            empty_reply: DEFAULT_EMPTY_REPLY.to_string(),
            error_reply: DEFAULT_ERROR_REPLY.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        let fields = [
            ("system_instruction", &self.system_instruction),
            ("greeting", &self.greeting),
            ("empty_reply", &self.empty_reply),
            ("error_reply", &self.error_reply),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(PromptError::MissingField(name));
            }
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let content = fs::read_to_string(path.as_ref())?;
    let config = load_prompts_from_str(&content)?;
    info!("Loaded prompt overrides from {}", path.as_ref().display());
    Ok(config)
}

/// Defaults when no path is configured.
pub fn resolve_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => Ok(Arc::new(load_prompts(p)?)),
        _ => Ok(Arc::new(PromptConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = load_prompts_from_str(r#"{"greeting": "Hello!"}"#).unwrap();
        assert_eq!(config.greeting, "Hello!");
        assert_eq!(config.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
        assert_eq!(config.error_reply, DEFAULT_ERROR_REPLY);
    }

    #[test]
    fn test_blank_field_rejected() {
        let result = load_prompts_from_str(r#"{"error_reply": "   "}"#);
        assert!(matches!(result, Err(PromptError::MissingField("error_reply"))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(load_prompts_from_str("{not json"), Err(PromptError::Json(_))));
    }

    #[test]
    fn test_resolve_without_path_uses_defaults() {
        let config = resolve_prompts(None).unwrap();
        assert_eq!(*config, PromptConfig::default());
        let config = resolve_prompts(Some("")).unwrap();
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        fs::write(&path, r#"{"empty_reply": "nothing"}"#).unwrap();
        let config = load_prompts(&path).unwrap();
        assert_eq!(config.empty_reply, "nothing");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(load_prompts("/nonexistent/prompts.json"), Err(PromptError::Io(_))));
    }
}
