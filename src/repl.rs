//! Terminal chat panel. Reads lines from any async reader and renders the
//! conversation to any async writer.

use crate::agent::{ ChatAgent, Rejection, SubmitOutcome };
use crate::config::preferences::{ DisplaySettings, Theme };
use crate::models::chat::{ Role, Turn };

use log::{ error, warn };
use std::io;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt };
use tokio::task::{ JoinError, JoinHandle };

const HELP: &str =
    "commands: /open /close /toggle /theme /history /help /quit; anything else is sent to the assistant";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Open,
    Close,
    Toggle,
    Theme,
    History,
    Help,
    Quit,
    Say(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "/open" => Command::Open,
        "/close" => Command::Close,
        "/toggle" => Command::Toggle,
        "/theme" => Command::Theme,
        "/history" => Command::History,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Say(line),
    }
}

fn render_turn(turn: &Turn, theme: Theme) -> String {
    let (user_color, assistant_color) = match theme {
        Theme::Dark => ("\x1b[96m", "\x1b[95m"),
        Theme::Light => ("\x1b[34m", "\x1b[35m"),
    };
    match turn.role {
        Role::User => format!("{}you ›\x1b[0m {}\n", user_color, turn.text),
        Role::Assistant => format!("{}ai  ›\x1b[0m {}\n", assistant_color, turn.text),
    }
}

async fn wait_for(task: &mut Option<JoinHandle<SubmitOutcome>>) -> Result<SubmitOutcome, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

pub struct TerminalPanel {
    agent: ChatAgent,
    display: DisplaySettings,
    shown: usize,
    in_flight: Option<JoinHandle<SubmitOutcome>>,
}

impl TerminalPanel {
    pub fn new(agent: ChatAgent, display: DisplaySettings) -> Self {
        Self { agent, display, shown: 0, in_flight: None }
    }

    /// Prints turns not yet shown. Only renders while the panel is open.
    async fn render_new<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        let snap = self.agent.snapshot();
        if !snap.panel_open {
            return Ok(());
        }
        for turn in snap.turns.iter().skip(self.shown) {
            out.write_all(render_turn(turn, self.display.theme()).as_bytes()).await?;
        }
        self.shown = snap.turns.len();
        if snap.pending {
            out.write_all(b"ai  \xE2\x80\xA6\n").await?;
        }
        out.flush().await
    }

    async fn render_all<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        self.shown = 0;
        self.render_new(out).await
    }

    async fn finish_in_flight<W: AsyncWrite + Unpin>(
        &mut self,
        result: Result<SubmitOutcome, JoinError>,
        out: &mut W
    ) -> io::Result<()> {
        self.in_flight = None;
        if let Err(e) = result {
            error!("Chat task failed: {}", e);
        }
        self.render_new(out).await
    }

    async fn handle_line<W: AsyncWrite + Unpin>(&mut self, line: &str, out: &mut W) -> io::Result<bool> {
        match parse_command(line) {
            Command::Quit => {
                return Ok(false);
            }
            Command::Open => {
                self.agent.set_panel_open(true);
                self.render_all(out).await?;
            }
            Command::Close => {
                self.agent.set_panel_open(false);
                out.write_all(b"[chat closed]\n").await?;
            }
            Command::Toggle => {
                if self.agent.toggle_panel() {
                    self.render_all(out).await?;
                } else {
                    out.write_all(b"[chat closed]\n").await?;
                }
            }
            Command::Theme => {
                match self.display.toggle() {
                    Ok(theme) => {
                        let msg = format!("[theme: {}]\n", match theme {
                            Theme::Dark => "dark",
                            Theme::Light => "light",
                        });
                        out.write_all(msg.as_bytes()).await?;
                    }
                    Err(e) => {
                        warn!("Failed to persist display preference: {}", e);
                        out.write_all(b"[theme could not be saved]\n").await?;
                    }
                }
            }
            Command::History => {
                self.render_all(out).await?;
            }
            Command::Help => {
                out.write_all(format!("{}\n", HELP).as_bytes()).await?;
            }
            Command::Say(text) => {
                if !self.agent.snapshot().panel_open {
                    out.write_all(b"[chat is closed, type /open]\n").await?;
                    return Ok(true);
                }
                match self.agent.begin(text) {
                    Ok(pending) => {
                        self.in_flight = Some(tokio::spawn(pending.complete()));
                        self.render_new(out).await?;
                    }
                    Err(Rejection::Busy) => {
                        out.write_all(b"[waiting for a reply, message dropped]\n").await?;
                    }
                    Err(Rejection::Empty) => {}
                }
            }
        }
        out.flush().await?;
        Ok(true)
    }

    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
        where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
    {
        let mut lines = input.lines();
        out.write_all(format!("{}\n", HELP).as_bytes()).await?;
        self.render_all(out).await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line, out).await? {
                                break;
                            }
                        }
                        None => {
                            if self.in_flight.is_some() {
                                let result = wait_for(&mut self.in_flight).await;
                                self.finish_in_flight(result, out).await?;
                            }
                            break;
                        }
                    }
                }
                result = wait_for(&mut self.in_flight) => {
                    self.finish_in_flight(result, out).await?;
                }
            }
        }
        Ok(())
    }
}
