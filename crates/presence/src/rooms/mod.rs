// Room registry and per-room presence bookkeeping.
//
// A room is one isolated presence partition. Every mutation for a room
// goes through that room's single state lock, so joins, updates, and
// disconnects are serialized per room while rooms never contend with
// each other. State is volatile: a restart loses everything and
// clients reconnect into empty rooms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use tessera_common::protocol::presence::ServerMessage;
use tessera_common::types::{PresenceEntry, UserIdentity};

/// Registry of all live rooms, keyed by the opaque room identifier.
///
/// Rooms are created lazily on first join and live for the process
/// lifetime; an empty room simply holds empty maps.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Arc<Room>>>>,
}

impl RoomRegistry {
    /// Look up a room, creating it on first use.
    pub async fn room(&self, room_id: &str) -> Arc<Room> {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Arc::clone(room);
        }
        let mut guard = self.rooms.write().await;
        Arc::clone(
            guard
                .entry(room_id.to_string())
                .or_insert_with(|| Arc::new(Room::new(room_id))),
        )
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

/// One isolated presence partition.
#[derive(Debug)]
pub struct Room {
    room_id: String,
    state: RwLock<RoomState>,
}

#[derive(Debug, Default)]
struct RoomState {
    /// userId -> latest entry. Contains a user iff their tab set is
    /// non-empty.
    users: HashMap<String, PresenceEntry>,
    /// userId -> open connection ids (multi-tab set).
    tabs: HashMap<String, HashSet<Uuid>>,
    /// Connection id -> identity + outbound channel.
    conns: HashMap<Uuid, ConnHandle>,
}

#[derive(Debug, Clone)]
struct ConnHandle {
    identity: UserIdentity,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl Room {
    fn new(room_id: &str) -> Self {
        Self { room_id: room_id.to_string(), state: RwLock::new(RoomState::default()) }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Attach an authenticated connection and return the snapshot of
    /// every other active user, for the joining connection only.
    ///
    /// Joining never broadcasts; peers learn about the newcomer from
    /// their first update.
    pub async fn join(
        &self,
        conn_id: Uuid,
        identity: UserIdentity,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Vec<PresenceEntry> {
        let mut state = self.state.write().await;

        let mut snapshot: Vec<PresenceEntry> = state
            .users
            .values()
            .filter(|entry| entry.user_id != identity.user_id)
            .cloned()
            .collect();
        snapshot.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        state.tabs.entry(identity.user_id.clone()).or_default().insert(conn_id);
        state
            .users
            .entry(identity.user_id.clone())
            .or_insert_with(|| PresenceEntry::initial(&identity));
        state.conns.insert(conn_id, ConnHandle { identity, outbound });

        snapshot
    }

    /// Replace the sender's entry wholesale and fan the change out to
    /// every other connection in the room. Returns `false` when the
    /// connection has no identity attached (the message is dropped).
    pub async fn apply_update(
        &self,
        conn_id: Uuid,
        current_path: String,
        resource_type: Option<String>,
        resource_id: Option<String>,
    ) -> bool {
        let (message, recipients) = {
            let mut state = self.state.write().await;
            let Some(handle) = state.conns.get(&conn_id) else {
                return false;
            };
            let identity = handle.identity.clone();
            let entry = PresenceEntry {
                user_id: identity.user_id.clone(),
                user_name: identity.user_name,
                user_image: identity.user_image,
                current_path,
                resource_type,
                resource_id,
            };
            state.users.insert(entry.user_id.clone(), entry.clone());
            (ServerMessage::PresenceChanged { entry }, recipients_excluding(&state, conn_id))
        };

        fan_out(&message, recipients);
        true
    }

    /// Detach a connection. The user's entry is removed and the room
    /// notified only when their last tab closes; closing one of
    /// several tabs mutates nothing visible.
    ///
    /// A connection that never joined (or was already detached) is a
    /// no-op, so concurrent disconnects for the same user produce at
    /// most one `user_left_presence`.
    pub async fn disconnect(&self, conn_id: Uuid) {
        let departed = {
            let mut state = self.state.write().await;
            let Some(handle) = state.conns.remove(&conn_id) else {
                return;
            };
            let user_id = handle.identity.user_id;

            let last_tab = match state.tabs.get_mut(&user_id) {
                Some(set) => {
                    set.remove(&conn_id);
                    set.is_empty()
                }
                None => false,
            };

            if last_tab {
                state.tabs.remove(&user_id);
                state.users.remove(&user_id);
                Some((
                    ServerMessage::UserLeftPresence { user_id },
                    recipients_excluding(&state, conn_id),
                ))
            } else {
                None
            }
        };

        if let Some((message, recipients)) = departed {
            fan_out(&message, recipients);
        }
    }

    /// Number of users currently present.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn contains_user(&self, user_id: &str) -> bool {
        self.state.read().await.users.contains_key(user_id)
    }

    /// Number of open connections for one user.
    pub async fn open_tabs(&self, user_id: &str) -> usize {
        self.state.read().await.tabs.get(user_id).map(HashSet::len).unwrap_or(0)
    }
}

fn recipients_excluding(
    state: &RoomState,
    exclude: Uuid,
) -> Vec<mpsc::UnboundedSender<ServerMessage>> {
    state
        .conns
        .iter()
        .filter(|(conn_id, _)| **conn_id != exclude)
        .map(|(_, handle)| handle.outbound.clone())
        .collect()
}

/// Best-effort, at-most-once delivery: a receiver that is already gone
/// is skipped.
fn fan_out(message: &ServerMessage, recipients: Vec<mpsc::UnboundedSender<ServerMessage>>) -> usize {
    let mut sent = 0;
    for recipient in recipients {
        if recipient.send(message.clone()).is_ok() {
            sent += 1;
        }
    }
    sent
}
