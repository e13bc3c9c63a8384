use std::{future::Future, pin::Pin};

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, LatestOnlyUpdater, StateStore};

/// The future a command hands back to the runtime.
pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A side effect dispatched explicitly (or through a subscription).
///
/// Side effects never run implicitly: a command only runs when it is enqueued
/// with `StateCtx::enqueue_command` (or by a state it is subscribed to
/// changing) and then flushed with `StateCtx::flush_commands`.
pub trait Command: Send + Sync + 'static {
    /// Runs synchronously during the flush, before the snapshot is taken.
    ///
    /// Use it for state that must be visible as soon as the command is
    /// dispatched (e.g. a loading flag).
    fn prepare(&self, _states: &mut StateStore) {}

    /// Build the async body of this run.
    ///
    /// The runtime stops polling the future once `cancel` fires, which happens
    /// when a newer run of the same command is flushed or the context is torn
    /// down.
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture;
}
