use crate::config::prompt::PromptConfig;
use crate::llm::chat::ChatClient;
use crate::llm::chat::request::{ format_history, GeminiContent };
use crate::models::chat::{ Conversation, Turn };

use log::{ debug, error, info, warn };
use serde::Serialize;
use std::sync::{ Arc, Mutex, MutexGuard };

/// Why a submission was dropped without touching the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rejection {
    Empty,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    Replied,
    EmptyReply,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub conversation_id: String,
    pub turns: Vec<Turn>,
    pub pending: bool,
    pub panel_open: bool,
}

struct ChatState {
    conversation: Conversation,
    pending: bool,
    panel_open: bool,
}

/// Conversation state plus the single-flight gate. Cloning shares the same state.
#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    state: Arc<Mutex<ChatState>>,
}

impl ChatAgent {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompt_config: Arc<PromptConfig>) -> Self {
        let conversation = Conversation::seeded(&prompt_config.greeting);
        info!(
            "Chat session {} started with model {}",
            conversation.id,
            chat_client.get_model()
        );
        Self {
            chat_client,
            prompt_config,
            state: Arc::new(
                Mutex::new(ChatState {
                    conversation,
                    pending: false,
                    panel_open: false,
                })
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validates and records the user turn, then hands back the in-flight call.
    /// Nothing changes when the text is blank or another call is outstanding.
    pub fn begin(&self, text: &str) -> Result<PendingTurn, Rejection> {
        let message = text.trim();
        if message.is_empty() {
            return Err(Rejection::Empty);
        }

        let mut state = self.lock();
        if state.pending {
            debug!("Dropping submission while a reply is pending");
            return Err(Rejection::Busy);
        }

        let history = format_history(state.conversation.turns());
        state.conversation.push(Turn::user(message));
        state.pending = true;

        Ok(PendingTurn {
            chat_client: self.chat_client.clone(),
            prompt_config: self.prompt_config.clone(),
            history,
            message: message.to_string(),
            gate: PendingGuard { state: self.state.clone(), done: false },
        })
    }

    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, Rejection> {
        let turn = self.begin(text)?;
        Ok(turn.complete().await)
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.lock();
        ChatSnapshot {
            conversation_id: state.conversation.id.clone(),
            turns: state.conversation.turns().to_vec(),
            pending: state.pending,
            panel_open: state.panel_open,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    pub fn len(&self) -> usize {
        self.lock().conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn toggle_panel(&self) -> bool {
        let mut state = self.lock();
        state.panel_open = !state.panel_open;
        state.panel_open
    }

    pub fn set_panel_open(&self, open: bool) {
        self.lock().panel_open = open;
    }
}

/// Clears the pending flag when dropped, whichever way the call ends.
struct PendingGuard {
    state: Arc<Mutex<ChatState>>,
    done: bool,
}

impl PendingGuard {
    /// Appends the reply and reopens the gate under one lock.
    fn finish(mut self, turn: Turn) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.conversation.push(turn);
        state.pending = false;
        self.done = true;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.pending = false;
    }
}

/// A submitted user turn whose reply has not arrived yet.
///
/// There is no timeout: if the model never answers, the gate stays closed
/// until this value is dropped.
pub struct PendingTurn {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    history: Vec<GeminiContent>,
    message: String,
    gate: PendingGuard,
}

impl PendingTurn {
    pub async fn complete(self) -> SubmitOutcome {
        let result = self.chat_client.send(
            &self.history,
            &self.prompt_config.system_instruction,
            &self.message
        ).await;

        let (reply, outcome) = match result {
            Ok(Some(text)) => (text, SubmitOutcome::Replied),
            Ok(None) => {
                warn!("Chat reply contained no text");
                (self.prompt_config.empty_reply.clone(), SubmitOutcome::EmptyReply)
            }
            Err(e) => {
                error!("Chat Error: {}", e);
                (self.prompt_config.error_reply.clone(), SubmitOutcome::Failed)
            }
        };
        self.gate.finish(Turn::assistant(reply));
        outcome
    }
}
