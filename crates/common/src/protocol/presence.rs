// WebSocket message types for the tessera-presence.v1 protocol.

use serde::{Deserialize, Serialize};

use crate::types::PresenceEntry;

/// Close code sent when a connection is rejected for policy reasons
/// (missing or invalid credential).
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code sent when the server cannot complete the handshake.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Messages accepted from clients after the handshake.
///
/// Frames that do not decode as one of these are dropped without a
/// reply; the connection stays open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Client -> Server: replace the sender's presence entry.
    PresenceUpdate {
        current_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource_id: Option<String>,
    },
}

/// Messages sent by the presence server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Server -> Client: the handshake credential was missing or rejected.
    AuthError { code: String },

    /// Server -> Client: the handshake failed for a non-credential reason.
    Error { code: String },

    /// Server -> Client: full room state, sent once to the joining
    /// connection only.
    PresenceSnapshot { users: Vec<PresenceEntry> },

    /// Server -> Client: another user's entry was replaced. Never
    /// delivered to the connection that sent the update.
    PresenceChanged {
        #[serde(flatten)]
        entry: PresenceEntry,
    },

    /// Server -> Client: a user's last open connection closed.
    UserLeftPresence { user_id: String },
}

pub fn decode_client_message(raw: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str::<ClientMessage>(raw)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
