// Serialized recomputation loop: one task owns the reducer, fed by
// transport change signals and a periodic tick.
//
// Staleness and idleness are functions of wall-clock time, so the
// view must keep advancing even when the transport goes quiet; that
// is what the tick is for. Running both triggers on a single task
// keeps the auxiliary timer maps race-free without locks.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::reducer::{AwarenessReducer, PeerPresence};
use crate::state::{AwarenessChange, PeerStateMap};

/// Fixed recomputation cadence.
pub const RECOMPUTE_TICK_MS: u64 = 1_000;

/// One transport notification: the change event plus the feed's
/// current keyed state map.
#[derive(Debug, Clone)]
pub struct AwarenessSignal {
    pub change: AwarenessChange,
    pub states: PeerStateMap,
}

/// Handle to a running reducer loop.
pub struct AwarenessHandle {
    /// Latest derived view; updated on every signal and every tick.
    pub view: watch::Receiver<Vec<PeerPresence>>,
    pub task: JoinHandle<()>,
}

/// Spawn the reducer loop for one joined session. The task stops when
/// every signal sender is dropped or when the view receiver goes away.
pub fn spawn_reducer(
    reducer: AwarenessReducer,
    signals: mpsc::UnboundedReceiver<AwarenessSignal>,
) -> AwarenessHandle {
    spawn_reducer_with_tick(reducer, signals, Duration::from_millis(RECOMPUTE_TICK_MS))
}

fn spawn_reducer_with_tick(
    mut reducer: AwarenessReducer,
    mut signals: mpsc::UnboundedReceiver<AwarenessSignal>,
    tick_period: Duration,
) -> AwarenessHandle {
    let (view_sender, view_receiver) = watch::channel(Vec::new());

    let task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(tick_period);
        tick.reset(); // skip immediate first tick

        loop {
            let view = tokio::select! {
                maybe_signal = signals.recv() => {
                    match maybe_signal {
                        Some(signal) => {
                            reducer.apply_change(&signal.change, &signal.states, Utc::now())
                        }
                        None => {
                            debug!("awareness feed closed, stopping reducer");
                            break;
                        }
                    }
                }
                _ = tick.tick() => reducer.derive(Utc::now()),
            };

            if view_sender.send(view).is_err() {
                debug!("awareness view receiver dropped, stopping reducer");
                break;
            }
        }
    });

    AwarenessHandle { view: view_receiver, task }
}
