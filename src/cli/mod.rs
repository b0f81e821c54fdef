use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the Gemini API
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.5-flash)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Base URL for the Gemini API (e.g., https://generativelanguage.googleapis.com)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    // --- Widget Args ---
    /// Path to a JSON file overriding the system instruction, greeting and reply texts.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Path of the file holding the light/dark display preference.
    #[arg(long, env = "PREFS_PATH", default_value = ".portal-chat/prefs.json")]
    pub prefs_path: String,

    /// Open the chat panel on startup.
    #[arg(long, env = "OPEN_PANEL", default_value = "false")]
    pub open_panel: bool,

    // --- General App Args ---
    /// Serve the HTTP API on this port instead of running the terminal panel.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["portal-chat", "--chat-api-key", "k"]).unwrap();
        assert_eq!(args.chat_api_key, "k");
        assert_eq!(args.prefs_path, ".portal-chat/prefs.json");
        assert!(args.http_port.is_none());
        assert!(!args.open_panel);
    }

    #[test]
    fn test_parse_http_mode() {
        let args = Args::try_parse_from([
            "portal-chat",
            "--chat-api-key",
            "k",
            "--http-port",
            "8080",
            "--chat-model",
            "gemini-2.0-flash",
        ]).unwrap();
        assert_eq!(args.http_port, Some(8080));
        assert_eq!(args.chat_model.as_deref(), Some("gemini-2.0-flash"));
    }
}
