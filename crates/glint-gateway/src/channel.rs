//! Cross-context request/response channel between the overlay and the
//! background service.
//!
//! The overlay never touches the network or the record store directly; it
//! sends a typed request over an mpsc channel and suspends on a oneshot
//! reply. The wire vocabulary ([`Action`] plus the [`Envelope`] shape) is
//! fixed and versioned by this module.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::{Error, Result},
    types::{AuthState, ChatMessage, ConversationRecord, Settings},
};

/// Action vocabulary of the channel, with their wire names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "makeOpenAIRequest")]
    Complete,
    #[serde(rename = "saveConversation")]
    SaveConversation,
    #[serde(rename = "getUserSettings")]
    GetSettings,
    #[serde(rename = "checkAuthState")]
    CheckAuth,
}

/// Uniform success/error envelope for wire-level responses.
///
/// `error` is present exactly when `success` is false; any action-specific
/// payload rides in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Build a success envelope from a serializable payload
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            success: true,
            error: None,
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Build a failure envelope carrying the error description
    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            data: serde_json::Value::Null,
        }
    }
}

/// A request in flight from the overlay to the background service.
///
/// Each variant carries the oneshot sender the service replies on.
pub enum GatewayRequest {
    /// Relay a message sequence to the completion endpoint
    Complete {
        messages: Vec<ChatMessage>,
        model: String,
        max_tokens: u32,
        reply: oneshot::Sender<Result<String>>,
    },
    /// Hand a finished exchange to the record store
    SaveConversation {
        record: ConversationRecord,
        reply: oneshot::Sender<Result<String>>,
    },
    /// Fetch the signed-in user's settings
    GetSettings { reply: oneshot::Sender<Result<Settings>> },
    /// Report the current identity
    CheckAuth { reply: oneshot::Sender<Result<AuthState>> },
}

impl GatewayRequest {
    /// The wire action this request corresponds to
    pub fn action(&self) -> Action {
        match self {
            GatewayRequest::Complete { .. } => Action::Complete,
            GatewayRequest::SaveConversation { .. } => Action::SaveConversation,
            GatewayRequest::GetSettings { .. } => Action::GetSettings,
            GatewayRequest::CheckAuth { .. } => Action::CheckAuth,
        }
    }
}

/// Overlay-side handle to the background gateway.
///
/// Cloneable; every method suspends until the background side replies. A
/// closed channel surfaces as [`Error::ChannelClosed`], never a panic.
#[derive(Clone)]
pub struct GatewayClient {
    tx: mpsc::Sender<GatewayRequest>,
}

impl GatewayClient {
    /// Wrap an existing sender
    pub fn new(tx: mpsc::Sender<GatewayRequest>) -> Self {
        Self { tx }
    }

    /// Create a client plus the receiver the background side serves
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<GatewayRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    async fn call<T>(
        &self,
        request: GatewayRequest,
        rx: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        tracing::debug!(action = ?request.action(), "gateway request");
        self.tx.send(request).await.map_err(|_| Error::ChannelClosed)?;
        rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Relay a full message sequence (system instruction first, optional
    /// image reference last) and return the assistant's text reply.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: String,
        max_tokens: u32,
    ) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.call(
            GatewayRequest::Complete {
                messages,
                model,
                max_tokens,
                reply: tx,
            },
            rx,
        )
        .await
    }

    /// Mirror a finished exchange to the record store; returns the stored id
    pub async fn save_conversation(&self, record: ConversationRecord) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.call(GatewayRequest::SaveConversation { record, reply: tx }, rx)
            .await
    }

    /// Fetch the signed-in user's settings
    pub async fn get_settings(&self) -> Result<Settings> {
        let (tx, rx) = oneshot::channel();
        self.call(GatewayRequest::GetSettings { reply: tx }, rx).await
    }

    /// Report the current identity
    pub async fn check_auth(&self) -> Result<AuthState> {
        let (tx, rx) = oneshot::channel();
        self.call(GatewayRequest::CheckAuth { reply: tx }, rx).await
    }
}
