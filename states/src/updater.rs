use std::{
    any::{Any, TypeId, type_name},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use flume::Sender;
use log::debug;

use crate::State;

pub(crate) enum UpdateKind {
    Replace(Box<dyn Any + Send>),
    Mutate(Box<dyn FnOnce(&mut dyn Any) + Send>),
}

/// A pending write to one state, applied by `StateCtx::sync_updates`.
pub(crate) struct Update {
    pub(crate) id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) kind: UpdateKind,
    pub(crate) guard: Option<Generation>,
}

impl Update {
    fn replace<T: State>(value: T) -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind: UpdateKind::Replace(Box::new(value)),
            guard: None,
        }
    }

    fn mutate<T: State>(f: impl FnOnce(&mut T) + Send + 'static) -> Self {
        let apply = move |any: &mut dyn Any| {
            if let Some(state) = any.downcast_mut::<T>() {
                f(state);
            }
        };
        Self {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind: UpdateKind::Mutate(Box::new(apply)),
            guard: None,
        }
    }

    /// `false` once a newer run of the same command has been dispatched.
    pub(crate) fn is_current(&self) -> bool {
        self.guard.as_ref().is_none_or(Generation::is_latest)
    }
}

/// A generation number plus the shared counter it is compared against.
#[derive(Debug, Clone)]
pub(crate) struct Generation {
    value: u64,
    latest: Arc<AtomicU64>,
}

impl Generation {
    pub(crate) fn new(value: u64, latest: Arc<AtomicU64>) -> Self {
        Self { value, latest }
    }

    pub(crate) fn is_latest(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.value
    }
}

/// Sends state updates back to the owning `StateCtx`.
///
/// Updates are queued and only become visible after `StateCtx::sync_updates`.
/// Once the context is dropped the channel is closed and updates are discarded.
#[derive(Debug, Clone)]
pub struct Updater {
    send: Sender<Update>,
}

impl std::fmt::Debug for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl Updater {
    pub(crate) fn new(send: Sender<Update>) -> Self {
        Self { send }
    }

    /// Replace the whole state with `value`.
    pub fn set<T: State>(&self, value: T) {
        self.push(Update::replace(value));
    }

    /// Mutate the state in place when the update is applied.
    pub fn update<T: State>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        self.push(Update::mutate(f));
    }

    fn push(&self, update: Update) {
        let type_name = update.type_name;
        if self.send.send(update).is_err() {
            debug!("StateCtx is gone, discarded update for {type_name}");
        }
    }
}

/// An [`Updater`] bound to one run of a command.
///
/// Every dispatch of a command advances that command's generation. Writes from
/// a run whose generation is no longer the latest are dropped, both when sent
/// and again when applied, so a slow superseded run never overwrites the
/// result of a newer one. Tearing the context down advances every generation.
#[derive(Debug, Clone)]
pub struct LatestOnlyUpdater {
    inner: Updater,
    generation: Generation,
}

impl LatestOnlyUpdater {
    pub(crate) fn new(inner: Updater, generation: Generation) -> Self {
        Self { inner, generation }
    }

    /// Generation number of the run this updater belongs to.
    pub fn generation(&self) -> u64 {
        self.generation.value
    }

    pub fn is_latest(&self) -> bool {
        self.generation.is_latest()
    }

    pub fn set<T: State>(&self, value: T) {
        self.push(Update::replace(value));
    }

    pub fn update<T: State>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        self.push(Update::mutate(f));
    }

    fn push(&self, mut update: Update) {
        if !self.is_latest() {
            debug!(
                "Dropped stale update for {} from generation {}",
                update.type_name, self.generation.value
            );
            return;
        }
        update.guard = Some(self.generation.clone());
        self.inner.push(update);
    }
}
