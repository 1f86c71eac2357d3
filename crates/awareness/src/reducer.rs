// Folds transport change events and wall-clock time into a UI-ready
// peer list with staleness and idle policies.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::state::{AwarenessChange, ClientId, PeerStateMap, PointerPosition, RawPeerState};

/// Peers silent for longer than this are hidden entirely. Covers
/// transports where disconnect notifications can be lost on unclean
/// network termination.
pub const STALE_AFTER_SECONDS: i64 = 10;

/// Peers whose pointer has not moved for longer than this are shown
/// as idle. Longer than the stale threshold on purpose: an idle peer
/// is still sending updates, just not moving.
pub const IDLE_AFTER_SECONDS: i64 = 30;

/// One entry of the derived view.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPresence {
    pub client_id: ClientId,
    pub name: String,
    pub color: String,
    pub pointer: Option<PointerPosition>,
    pub locked_elements: Vec<String>,
    pub last_update: DateTime<Utc>,
    pub is_idle: bool,
}

#[derive(Debug, Clone, Copy)]
struct PointerTrack {
    position: Option<PointerPosition>,
    moved_at: DateTime<Utc>,
}

/// Derives the visible peer list from the raw feed.
///
/// Holds the raw keyed state plus two auxiliary timers per peer that
/// the transport does not provide: when the peer was last heard from,
/// and when its pointer last actually moved. Staleness and idleness
/// are judged at read time against the caller-supplied clock, never
/// stored, so the event path and the periodic tick share one
/// derivation.
#[derive(Debug)]
pub struct AwarenessReducer {
    local_client_id: ClientId,
    stale_after: Duration,
    idle_after: Duration,
    peers: PeerStateMap,
    last_update: HashMap<ClientId, DateTime<Utc>>,
    pointer_tracks: HashMap<ClientId, PointerTrack>,
}

impl AwarenessReducer {
    pub fn new(local_client_id: ClientId) -> Self {
        Self::with_thresholds(
            local_client_id,
            Duration::seconds(STALE_AFTER_SECONDS),
            Duration::seconds(IDLE_AFTER_SECONDS),
        )
    }

    pub fn with_thresholds(
        local_client_id: ClientId,
        stale_after: Duration,
        idle_after: Duration,
    ) -> Self {
        Self {
            local_client_id,
            stale_after,
            idle_after,
            peers: PeerStateMap::new(),
            last_update: HashMap::new(),
            pointer_tracks: HashMap::new(),
        }
    }

    /// Fold one change event plus the transport's current state map,
    /// then derive. Timers advance only for identifiers named in the
    /// event; identifiers missing from the state map are skipped.
    pub fn apply_change(
        &mut self,
        change: &AwarenessChange,
        states: &PeerStateMap,
        now: DateTime<Utc>,
    ) -> Vec<PeerPresence> {
        for client_id in change.added.iter().chain(change.updated.iter()) {
            let Some(raw) = states.get(client_id) else {
                continue;
            };
            self.observe(*client_id, raw.clone(), now);
        }
        for client_id in &change.removed {
            self.forget(*client_id);
        }
        self.derive(now)
    }

    fn observe(&mut self, client_id: ClientId, raw: RawPeerState, now: DateTime<Utc>) {
        self.last_update.insert(client_id, now);

        let track = self
            .pointer_tracks
            .entry(client_id)
            .or_insert(PointerTrack { position: raw.pointer, moved_at: now });
        if track.position != raw.pointer {
            track.position = raw.pointer;
            track.moved_at = now;
        }

        self.peers.insert(client_id, raw);
    }

    fn forget(&mut self, client_id: ClientId) {
        self.peers.remove(&client_id);
        self.last_update.remove(&client_id);
        self.pointer_tracks.remove(&client_id);
    }

    /// Derive the visible peer list at `now`.
    ///
    /// Excluded: the local participant, peers not heard from within
    /// the stale threshold, and peers with no user profile (nothing to
    /// render). A peer is idle when it has a pointer that has not
    /// moved within the idle threshold. Output is ordered by client id.
    pub fn derive(&self, now: DateTime<Utc>) -> Vec<PeerPresence> {
        let mut view = Vec::new();
        for (client_id, raw) in &self.peers {
            if *client_id == self.local_client_id {
                continue;
            }
            let Some(profile) = raw.user.as_ref() else {
                continue;
            };
            let Some(last_update) = self.last_update.get(client_id).copied() else {
                continue;
            };
            if now - last_update > self.stale_after {
                continue;
            }

            let is_idle = match self.pointer_tracks.get(client_id) {
                Some(track) if track.position.is_some() => now - track.moved_at > self.idle_after,
                _ => false,
            };

            view.push(PeerPresence {
                client_id: *client_id,
                name: profile.name.clone(),
                color: profile.color.clone(),
                pointer: raw.pointer,
                locked_elements: raw
                    .locked_elements
                    .as_ref()
                    .map(|locked| locked.element_ids.clone())
                    .unwrap_or_default(),
                last_update,
                is_idle,
            });
        }
        view.sort_by_key(|peer| peer.client_id);
        view
    }
}
