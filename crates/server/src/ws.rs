//! WebSocket chat relay.
//!
//! One connection per visitor. The client sends
//! `{"type":"chat","sessionId":...,"content":...}`; the server persists
//! the user turn, produces an assistant reply (model-backed when a
//! credential is available, canned acknowledgment otherwise), persists
//! it, and sends the reply envelope back. Sessions are independent;
//! connections are tracked in a registry keyed by connection id.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use refineai_agent::ChatAssistant;
use refineai_core::domain::chat::{ChatMessage, ChatMessageId, ChatRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEnvelope {
    #[serde(rename = "chat")]
    Chat {
        #[serde(rename = "sessionId")]
        session_id: String,
        content: String,
    },
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEnvelope {
    #[serde(rename = "chat")]
    Chat {
        #[serde(rename = "sessionId")]
        session_id: String,
        role: &'static str,
        content: String,
        timestamp: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay(socket, state))
}

async fn relay(mut socket: WebSocket, state: AppState) {
    let connection_id = state.connections.register();
    tracing::info!(
        event_name = "chat.connected",
        connection_id = %connection_id,
        active_connections = state.connections.active(),
        "chat connection opened"
    );

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => {
                let reply = handle_text(&state, &text).await;
                let payload = match serde_json::to_string(&reply) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::error!(
                            event_name = "chat.encode_failed",
                            connection_id = %connection_id,
                            error = %error,
                            "could not encode reply envelope"
                        );
                        continue;
                    }
                };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/Pong are answered by axum.
            _ => {}
        }
    }

    state.connections.unregister(&connection_id);
    tracing::info!(
        event_name = "chat.disconnected",
        connection_id = %connection_id,
        active_connections = state.connections.active(),
        "chat connection closed"
    );
}

async fn handle_text(state: &AppState, text: &str) -> ServerEnvelope {
    match serde_json::from_str::<ClientEnvelope>(text) {
        Ok(ClientEnvelope::Chat { session_id, content }) => {
            match handle_chat_turn(state, &session_id, &content).await {
                Ok(reply) => reply,
                Err(message) => ServerEnvelope::Error { message },
            }
        }
        Err(_) => ServerEnvelope::Error {
            message: "expected `{\"type\":\"chat\",\"sessionId\":...,\"content\":...}`"
                .to_string(),
        },
    }
}

/// Persists one user turn, produces the assistant reply, persists it,
/// and returns the reply envelope.
pub async fn handle_chat_turn(
    state: &AppState,
    session_id: &str,
    content: &str,
) -> Result<ServerEnvelope, String> {
    let session_id = session_id.trim();
    let content = content.trim();
    if session_id.is_empty() {
        return Err("`sessionId` must not be empty".to_string());
    }
    if content.is_empty() {
        return Err("`content` must not be empty".to_string());
    }

    state
        .chat_messages
        .append(ChatMessage {
            id: ChatMessageId(Uuid::new_v4().simple().to_string()),
            session_id: session_id.to_string(),
            role: ChatRole::User,
            content: content.to_string(),
            created_at: Utc::now(),
        })
        .await
        .map_err(|error| {
            tracing::error!(
                event_name = "chat.persist_failed",
                error = %error,
                "could not persist user turn"
            );
            "your message could not be saved, please try again".to_string()
        })?;

    let (llm, assistant_prompt) = match state.admin_settings().await {
        Ok(settings) => {
            let prompt = settings.and_then(|settings| settings.assistant_prompt);
            let llm = state.vision_llm().await.unwrap_or_default();
            (llm, prompt)
        }
        Err(_) => (None, None),
    };

    let assistant = ChatAssistant::new(llm, assistant_prompt);
    let reply = assistant.reply(content).await;
    let replied_at = Utc::now();

    state
        .chat_messages
        .append(ChatMessage {
            id: ChatMessageId(Uuid::new_v4().simple().to_string()),
            session_id: session_id.to_string(),
            role: ChatRole::Assistant,
            content: reply.clone(),
            created_at: replied_at,
        })
        .await
        .map_err(|error| {
            tracing::error!(
                event_name = "chat.persist_failed",
                error = %error,
                "could not persist assistant turn"
            );
            "the reply could not be saved, please try again".to_string()
        })?;

    tracing::info!(
        event_name = "chat.turn",
        session_id = %session_id,
        "chat turn relayed"
    );

    Ok(ServerEnvelope::Chat {
        session_id: session_id.to_string(),
        role: ChatRole::Assistant.as_str(),
        content: reply,
        timestamp: replied_at.to_rfc3339(),
    })
}
