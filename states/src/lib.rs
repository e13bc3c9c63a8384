//! A small state runtime: typed states, explicit commands, latest-only updates.
//!
//! Side effects live in [`Command`]s. A command reads a frozen
//! [`CommandSnapshot`] and writes back through a [`LatestOnlyUpdater`], whose
//! writes are dropped as soon as a newer run of the same command is flushed or
//! the owning [`StateCtx`] is torn down.

mod command;
mod ctx;
mod error;
mod snapshot;
mod state;
mod store;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use ctx::StateCtx;
pub use error::Error;
pub use snapshot::CommandSnapshot;
pub use state::{State, state_assign_impl};
pub use store::StateStore;
pub use task::{TaskHandle, TaskId};
pub use updater::{LatestOnlyUpdater, Updater};
