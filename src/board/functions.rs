//! Clients for the two serverless functions next to the database:
//! `ai-assistant` (chat completion proxy) and `send-team-invitation`
//! (transactional email).

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::models::Session;

pub const ASSISTANT_FUNCTION: &str = "ai-assistant";
pub const INVITATION_FUNCTION: &str = "send-team-invitation";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub inviter_name: String,
}

#[async_trait]
pub trait EdgeFunctions: Send + Sync {
    async fn ask_assistant(&self, session: &Session, request: &ChatRequest) -> Result<ChatReply>;

    /// Returns the email provider's status payload as-is.
    async fn send_invitation(
        &self,
        session: &Session,
        request: &InvitationRequest,
    ) -> Result<serde_json::Value>;
}

/// Stand-in used with the in-memory backend: invitations are recorded,
/// the assistant is unavailable.
#[derive(Default)]
pub struct OfflineFunctions {
    sent: Mutex<Vec<InvitationRequest>>,
}

impl OfflineFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<InvitationRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EdgeFunctions for OfflineFunctions {
    async fn ask_assistant(&self, _session: &Session, _request: &ChatRequest) -> Result<ChatReply> {
        anyhow::bail!("The assistant is not available in offline mode")
    }

    async fn send_invitation(
        &self,
        _session: &Session,
        request: &InvitationRequest,
    ) -> Result<serde_json::Value> {
        self.sent
            .lock()
            .map_err(|e| anyhow::anyhow!("Invitation log lock poisoned: {}", e))?
            .push(request.clone());
        Ok(serde_json::json!({"id": "offline", "to": [request.email]}))
    }
}
