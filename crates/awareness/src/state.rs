// Raw records observed on the ephemeral-state feed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Transport-session identifier assigned by the ephemeral-state feed.
/// Unrelated to the workspace `userId`; one user may hold several.
pub type ClientId = u64;

pub type PeerStateMap = HashMap<ClientId, RawPeerState>;

/// One peer's raw state as published on the feed.
///
/// Unknown fields are ignored so older clients keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawPeerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PeerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_elements: Option<LockedElements>,
}

/// Display name and assigned color for a peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerProfile {
    pub name: String,
    /// Hex color assigned to this peer (e.g. "#e06c75").
    pub color: String,
}

/// Last known pointer position. Idleness is judged by exact equality
/// of consecutive observations, not by distance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// Canvas elements currently locked by a peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LockedElements {
    pub element_ids: Vec<String>,
}

/// Change notification from the transport: which client identifiers
/// appeared, changed, or disappeared since the last event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwarenessChange {
    pub added: Vec<ClientId>,
    pub updated: Vec<ClientId>,
    pub removed: Vec<ClientId>,
}
