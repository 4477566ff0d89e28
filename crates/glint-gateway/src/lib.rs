//! glint-gateway: background inference gateway and record-store boundary
//!
//! Everything the overlay cannot do from the page context lives here: the
//! completion endpoint call, the auth/record-store collaborators, and the
//! request/response channel the overlay reaches them through.

pub mod channel;
pub mod completions;
pub mod error;
pub mod secret;
pub mod service;
pub mod types;

pub use channel::{Action, Envelope, GatewayClient, GatewayRequest};
pub use completions::CompletionClient;
pub use error::{Error, Result};
pub use service::{AuthProvider, BackgroundService, MemoryStore, RecordStore, StaticAuth, StoredSettings};
pub use types::*;
