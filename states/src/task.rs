//! Identity and cancellation for command runs.
//!
//! Every flush of a command spawns one task. The task is identified by the
//! command's `TypeId` plus the generation that flush produced, and carries a
//! `CancellationToken` so a newer run (or teardown) can stop it.

use std::any::TypeId;

use tokio_util::sync::CancellationToken;

/// Unique identifier for a spawned command run.
///
/// Two runs of the same command share a `type_id`; the one with the higher
/// `generation` is the newer one and the only one allowed to write state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self { type_id, generation }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to a spawned run with cooperative cancellation.
///
/// Cancelling does not abort the task by itself; the runtime races the
/// command future against `cancelled()` and stops polling it.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
