//! Webhook server.
//!
//! Accepts `POST /message` with `{"user_id": .., "text": ..}` and answers
//! `{"reply": ..}`. `GET /health` reports liveness.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use votebox_contract::ContractBackend;
use votebox_types::UserId;

use crate::bot::Bot;
use crate::error::BotError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageRequest {
    pub user_id: UserId,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub reply: String,
}

/// Build the webhook router around a shared [`Bot`].
pub fn router<B: ContractBackend>(bot: Arc<Bot<B>>) -> Router {
    Router::new()
        .route("/message", post(message_handler::<B>))
        .route("/health", get(health_handler))
        .with_state(bot)
}

async fn message_handler<B: ContractBackend>(
    State(bot): State<Arc<Bot<B>>>,
    Json(request): Json<MessageRequest>,
) -> Json<MessageReply> {
    let reply = bot.handle(request.user_id, &request.text).await;
    Json(MessageReply { reply })
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// The webhook server, configured with a port and the bot it serves.
pub struct BotServer<B> {
    pub port: u16,
    pub bot: Arc<Bot<B>>,
}

impl<B: ContractBackend> BotServer<B> {
    pub fn new(port: u16, bot: Arc<Bot<B>>) -> Self {
        Self { port, bot }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start(
        &self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), BotError> {
        let app = router(Arc::clone(&self.bot));

        let addr = format!("0.0.0.0:{}", self.port);
        info!("webhook server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
