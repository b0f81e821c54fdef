pub mod api;

use crate::agent::ChatAgent;
use crate::config::preferences::DisplaySettings;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct Server {
    http_port: u16,
    agent: ChatAgent,
    display: Arc<Mutex<DisplaySettings>>,
}

impl Server {
    pub fn new(http_port: u16, agent: ChatAgent, display: DisplaySettings) -> Self {
        Self {
            http_port,
            agent,
            display: Arc::new(Mutex::new(display)),
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let state = api::AppState {
            agent: self.agent.clone(),
            display: self.display.clone(),
        };
        api::start_http_server(self.http_port, state).await
    }
}
