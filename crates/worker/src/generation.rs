//! Worker generation state.
//!
//! A generation is one worker built from one build manifest. The lifecycle
//! controller drives it through install and activate; hosts observe the
//! transitions through a watch channel.

use std::sync::atomic::{AtomicBool, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Signals a generation sends to the hosting environment.
pub trait WorkerControl: Send + Sync {
    /// Supersede the active generation without waiting for clients to close.
    fn skip_waiting(&self);

    /// Take control of already open clients.
    fn claim_clients(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this generation will never activate.
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationStatus {
    pub state: WorkerState,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
}

#[derive(Debug)]
pub struct Generation {
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl Generation {
    pub fn new() -> Self {
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self { state, skip_waiting: AtomicBool::new(false), clients_claimed: AtomicBool::new(false) }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: WorkerState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(?previous, ?next, "worker state changed");
    }

    /// Move to `next` only if the current state is one of `from`, atomically.
    ///
    /// On refusal the current state is returned and nothing is published.
    pub(crate) fn transition(&self, from: &[WorkerState], next: WorkerState) -> Result<WorkerState, WorkerState> {
        let mut outcome = Err(next);
        self.state.send_if_modified(|state| {
            if !from.contains(state) {
                outcome = Err(*state);
                return false;
            }
            outcome = Ok(std::mem::replace(state, next));
            true
        });
        if let Ok(previous) = outcome {
            tracing::debug!(?previous, ?next, "worker state changed");
        }
        outcome
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> GenerationStatus {
        GenerationStatus {
            state: self.state(),
            skip_waiting: self.skip_waiting_requested(),
            clients_claimed: self.clients_claimed(),
        }
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerControl for Generation {
    fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    fn claim_clients(&self) {
        self.clients_claimed.store(true, Ordering::SeqCst);
    }
}
