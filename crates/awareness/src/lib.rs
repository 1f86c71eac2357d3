// tessera-awareness: client-side derived view of the ephemeral
// peer-state feed (cursors, element locks, presence colors).
//
// The feed itself comes from an external awareness/broadcast channel;
// this crate turns its raw keyed records into a UI-ready peer list,
// hiding peers that have gone silent and dimming peers whose pointer
// has stopped moving.

pub mod reducer;
pub mod service;
pub mod state;

pub use reducer::{AwarenessReducer, PeerPresence, IDLE_AFTER_SECONDS, STALE_AFTER_SECONDS};
pub use service::{spawn_reducer, AwarenessHandle, AwarenessSignal, RECOMPUTE_TICK_MS};
pub use state::{
    AwarenessChange, ClientId, LockedElements, PeerProfile, PeerStateMap, PointerPosition,
    RawPeerState,
};
