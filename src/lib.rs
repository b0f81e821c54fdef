pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod repl;
pub mod server;

use agent::ChatAgent;
use cli::Args;
use config::preferences::{ DisplaySettings, FilePreferenceStore };
use config::prompt::resolve_prompts;
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::info;
use repl::TerminalPanel;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_config = LlmConfig {
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.trim().is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
    };

    info!("--- Core Configuration ---");
    info!("Chat Model: {}", chat_config.model());
    info!("Chat Base URL: {}", chat_config.base_url());
    info!("Chat API Key: {}", if chat_config.api_key.is_some() { "set" } else { "missing" });
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Preferences Path: {}", args.prefs_path);
    match args.http_port {
        Some(port) => info!("Mode: HTTP API on port {}", port),
        None => info!("Mode: terminal panel"),
    }
    info!("-------------------------");

    let chat_client = new_chat_client(&chat_config)?;
    let prompt_config = resolve_prompts(args.prompts_path.as_deref())?;
    let agent = ChatAgent::new(chat_client, prompt_config);
    agent.set_panel_open(args.open_panel);

    let display = DisplaySettings::load(Arc::new(FilePreferenceStore::new(&args.prefs_path)));
    info!("Display theme: {:?}", display.theme());

    match args.http_port {
        Some(port) => {
            let server = Server::new(port, agent, display);
            server.run().await?;
        }
        None => {
            let mut panel = TerminalPanel::new(agent, display);
            let mut stdout = tokio::io::stdout();
            panel.run(BufReader::new(tokio::io::stdin()), &mut stdout).await?;
        }
    }

    Ok(())
}
