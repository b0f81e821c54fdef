use crate::agent::{ ChatAgent, ChatSnapshot, Rejection, SubmitOutcome };
use crate::config::preferences::{ DisplaySettings, Theme };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use axum::{
    routing::{ get, post },
    Router,
    extract::State,
    response::IntoResponse,
    http::StatusCode,
    Json,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    outcome: SubmitOutcome,
    chat: ChatSnapshot,
}

#[derive(Serialize)]
struct RejectedResponse {
    rejected: Rejection,
}

#[derive(Serialize)]
struct PanelResponse {
    panel_open: bool,
}

#[derive(Serialize)]
struct ThemeResponse {
    theme: Theme,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub agent: ChatAgent,
    pub display: Arc<Mutex<DisplaySettings>>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", get(chat_snapshot_handler).post(submit_handler))
        .route("/api/chat/panel", post(toggle_panel_handler))
        .route("/api/theme", get(theme_handler))
        .route("/api/theme/toggle", post(toggle_theme_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    http_port: u16,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
        e
    })?;
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn chat_snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.agent.snapshot())
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>
) -> impl IntoResponse {
    let pending = match state.agent.begin(&req.text) {
        Ok(p) => p,
        Err(rejected) => {
            let code = match rejected {
                Rejection::Empty => StatusCode::BAD_REQUEST,
                Rejection::Busy => StatusCode::CONFLICT,
            };
            return (code, Json(RejectedResponse { rejected })).into_response();
        }
    };

    // Finish the call even if the HTTP client goes away.
    match tokio::spawn(pending.complete()).await {
        Ok(outcome) =>
            (
                StatusCode::OK,
                Json(SubmitResponse { outcome, chat: state.agent.snapshot() }),
            ).into_response(),
        Err(e) => {
            error!("Chat task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { message: "Chat task failed".into() }),
            ).into_response()
        }
    }
}

async fn toggle_panel_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(PanelResponse { panel_open: state.agent.toggle_panel() })
}

async fn theme_handler(State(state): State<AppState>) -> impl IntoResponse {
    let display = state.display.lock().await;
    Json(ThemeResponse { theme: display.theme() })
}

async fn toggle_theme_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut display = state.display.lock().await;
    match display.toggle() {
        Ok(theme) => (StatusCode::OK, Json(ThemeResponse { theme })).into_response(),
        Err(e) => {
            error!("Failed to persist display preference: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { message: e.to_string() }),
            ).into_response()
        }
    }
}
