//! Background service: the execution context that owns credentials, the
//! auth/record-store collaborators, and the completion endpoint.
//!
//! The overlay reaches this service only through the request channel; the
//! service replies on the oneshot each request carries and never touches
//! overlay state.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    channel::{Action, Envelope, GatewayClient, GatewayRequest},
    completions::CompletionClient,
    error::{Error, Result},
    secret,
    types::{AuthState, AuthUser, ChatMessage, ConversationRecord, Settings, StoredConversation},
};

/// Settings document as held by the record store: user preferences plus the
/// encoded API key.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(flatten)]
    pub settings: Settings,
    pub encoded_api_key: Option<String>,
}

/// Identity collaborator
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, if any
    async fn current_user(&self) -> Option<AuthUser>;
}

/// Per-user document store collaborator
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save_conversation(&self, uid: &str, record: ConversationRecord) -> Result<String>;
    /// Stored conversations, newest first
    async fn list_conversations(&self, uid: &str, limit: usize) -> Result<Vec<StoredConversation>>;
    async fn delete_conversation(&self, uid: &str, id: &str) -> Result<()>;
    async fn user_settings(&self, uid: &str) -> Result<Option<StoredSettings>>;
}

/// The background gateway service
pub struct BackgroundService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn RecordStore>,
    completions: CompletionClient,
}

impl BackgroundService {
    /// Create a service over the given collaborators
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            auth,
            store,
            completions: CompletionClient::new(),
        }
    }

    /// Replace the completion client (custom endpoint, tests)
    pub fn with_completions(mut self, completions: CompletionClient) -> Self {
        self.completions = completions;
        self
    }

    /// Spawn the request loop, returning the overlay-side client and the
    /// task handle. The loop ends when every client is dropped.
    pub fn spawn(self, capacity: usize) -> (GatewayClient, JoinHandle<()>) {
        let (client, rx) = GatewayClient::channel(capacity);
        let handle = tokio::spawn(self.serve(rx));
        (client, handle)
    }

    /// Serve requests until the channel closes
    pub async fn serve(self, mut rx: mpsc::Receiver<GatewayRequest>) {
        while let Some(request) = rx.recv().await {
            self.handle(request).await;
        }
        tracing::debug!("gateway channel closed, background service stopping");
    }

    async fn handle(&self, request: GatewayRequest) {
        match request {
            GatewayRequest::Complete {
                messages,
                model,
                max_tokens,
                reply,
            } => {
                let _ = reply.send(self.handle_complete(&messages, &model, max_tokens).await);
            }
            GatewayRequest::SaveConversation { record, reply } => {
                let _ = reply.send(self.handle_save(record).await);
            }
            GatewayRequest::GetSettings { reply } => {
                let _ = reply.send(self.handle_get_settings().await);
            }
            GatewayRequest::CheckAuth { reply } => {
                let _ = reply.send(Ok(self.handle_check_auth().await));
            }
        }
    }

    /// Dispatch a JSON-level request, wrapping the result in the uniform
    /// envelope. This is the wire-conformance surface for hosts that speak
    /// the serialized contract instead of the typed channel.
    pub async fn handle_wire(&self, action: Action, data: serde_json::Value) -> Envelope {
        match action {
            Action::Complete => {
                let messages: Vec<ChatMessage> = match serde_json::from_value(
                    data.get("messages").cloned().unwrap_or_default(),
                ) {
                    Ok(m) => m,
                    Err(e) => return Envelope::err(e),
                };
                let model = data
                    .get("model")
                    .and_then(|v| v.as_str())
                    .unwrap_or("gpt-4o")
                    .to_string();
                let max_tokens = data
                    .get("maxTokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(500) as u32;
                match self.handle_complete(&messages, &model, max_tokens).await {
                    Ok(response) => Envelope::ok(serde_json::json!({ "response": response })),
                    Err(e) => Envelope::err(e),
                }
            }
            Action::SaveConversation => match serde_json::from_value(data) {
                Ok(record) => match self.handle_save(record).await {
                    Ok(id) => Envelope::ok(serde_json::json!({ "id": id })),
                    Err(e) => Envelope::err(e),
                },
                Err(e) => Envelope::err(e),
            },
            Action::GetSettings => match self.handle_get_settings().await {
                Ok(settings) => Envelope::ok(serde_json::json!({ "settings": settings })),
                Err(e) => Envelope::err(e),
            },
            Action::CheckAuth => Envelope::ok(self.handle_check_auth().await),
        }
    }

    /// Resolve the signed-in user's API key from stored settings
    async fn api_key(&self) -> Result<String> {
        let user = self.auth.current_user().await.ok_or(Error::Unauthenticated)?;
        let stored = self
            .store
            .user_settings(&user.uid)
            .await?
            .ok_or(Error::MissingCredential)?;
        stored
            .encoded_api_key
            .as_deref()
            .and_then(secret::decode_api_key)
            .ok_or(Error::MissingCredential)
    }

    async fn handle_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let api_key = self.api_key().await?;
        self.completions
            .complete(&api_key, model, messages, max_tokens)
            .await
    }

    async fn handle_save(&self, mut record: ConversationRecord) -> Result<String> {
        let user = self.auth.current_user().await.ok_or(Error::Unauthenticated)?;
        record.summary = record.summarize();

        let id = self.store.save_conversation(&user.uid, record).await?;
        tracing::debug!(%id, "conversation saved");

        // Retention pruning never blocks or fails the save itself
        if let Err(e) = self.prune_history(&user.uid).await {
            tracing::warn!("history pruning failed: {}", e);
        }
        Ok(id)
    }

    /// Drop the oldest stored conversations beyond the retention count
    async fn prune_history(&self, uid: &str) -> Result<()> {
        let max_history = match self.store.user_settings(uid).await? {
            Some(stored) if stored.settings.max_history > 0 => {
                stored.settings.max_history as usize
            }
            _ => return Ok(()),
        };

        let conversations = self.store.list_conversations(uid, 1000).await?;
        if conversations.len() <= max_history {
            return Ok(());
        }

        let excess = &conversations[max_history..];
        for stale in excess {
            self.store.delete_conversation(uid, &stale.id).await?;
        }
        tracing::debug!(pruned = excess.len(), "old conversations pruned");
        Ok(())
    }

    async fn handle_get_settings(&self) -> Result<Settings> {
        let user = self.auth.current_user().await.ok_or(Error::Unauthenticated)?;
        let stored = self.store.user_settings(&user.uid).await?;
        Ok(stored.map(|s| s.settings).unwrap_or_default())
    }

    async fn handle_check_auth(&self) -> AuthState {
        match self.auth.current_user().await {
            Some(user) => AuthState::signed_in(user),
            None => AuthState::anonymous(),
        }
    }
}

/// Fixed-identity auth provider for tests and embedding hosts without a
/// real auth backend.
pub struct StaticAuth {
    user: Option<AuthUser>,
}

impl StaticAuth {
    /// A provider that reports the given identity
    pub fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    /// A provider that reports no identity
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}

/// In-memory record store for tests and embedding hosts
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    settings: HashMap<String, StoredSettings>,
    conversations: HashMap<String, Vec<StoredConversation>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the settings document for a user
    pub fn set_settings(&self, uid: &str, stored: StoredSettings) {
        self.inner.lock().settings.insert(uid.to_string(), stored);
    }

    /// Number of conversations stored for a user
    pub fn conversation_count(&self, uid: &str) -> usize {
        self.inner
            .lock()
            .conversations
            .get(uid)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save_conversation(&self, uid: &str, record: ConversationRecord) -> Result<String> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = format!("conv-{}", inner.next_id);
        inner
            .conversations
            .entry(uid.to_string())
            .or_default()
            // Newest first
            .insert(0, StoredConversation { id: id.clone(), record });
        Ok(id)
    }

    async fn list_conversations(&self, uid: &str, limit: usize) -> Result<Vec<StoredConversation>> {
        let inner = self.inner.lock();
        Ok(inner
            .conversations
            .get(uid)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_conversation(&self, uid: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(list) = inner.conversations.get_mut(uid) {
            list.retain(|c| c.id != id);
        }
        Ok(())
    }

    async fn user_settings(&self, uid: &str) -> Result<Option<StoredSettings>> {
        Ok(self.inner.lock().settings.get(uid).cloned())
    }
}
