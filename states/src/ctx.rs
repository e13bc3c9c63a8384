use std::{
    any::{TypeId, type_name},
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use flume::{Receiver, Sender};
use log::{debug, error, warn};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::updater::{Generation, Update};
use crate::{Command, Error, LatestOnlyUpdater, State, StateStore, TaskHandle, TaskId, Updater};

struct RegisteredCommand {
    name: &'static str,
    command: Arc<dyn Command>,
    latest: Arc<AtomicU64>,
}

/// Owner of all states and the runner for commands.
///
/// Typical frame:
/// 1. mutate inputs with [`StateCtx::update`] (may enqueue subscribed commands)
/// 2. [`StateCtx::flush_commands`] to spawn the enqueued runs
/// 3. [`StateCtx::sync_updates`] to apply whatever finished runs sent back
///
/// `flush_commands` spawns onto a Tokio `JoinSet` and therefore must be called
/// from within a Tokio runtime.
pub struct StateCtx {
    store: StateStore,
    commands: BTreeMap<TypeId, RegisteredCommand>,
    queue: Vec<TypeId>,
    // state type -> commands re-run when it changes
    subscriptions: BTreeMap<TypeId, Vec<TypeId>>,
    running: BTreeMap<TypeId, TaskHandle>,
    tasks: JoinSet<()>,
    send: Sender<Update>,
    recv: Receiver<Update>,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            store: StateStore::new(),
            commands: BTreeMap::new(),
            queue: Vec::new(),
            subscriptions: BTreeMap::new(),
            running: BTreeMap::new(),
            tasks: JoinSet::new(),
            send,
            recv,
        }
    }

    pub fn add_state<T: State>(&mut self, state: T) {
        self.store.insert(state);
    }

    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(
            TypeId::of::<C>(),
            RegisteredCommand {
                name: type_name::<C>(),
                command: Arc::new(command),
                latest: Arc::new(AtomicU64::new(0)),
            },
        );
    }

    /// Re-run `C` every time `S` changes through [`StateCtx::update`].
    pub fn subscribe<S: State, C: Command>(&mut self) {
        let commands = self.subscriptions.entry(TypeId::of::<S>()).or_default();
        if !commands.contains(&TypeId::of::<C>()) {
            commands.push(TypeId::of::<C>());
        }
    }

    pub fn contains<T: State>(&self) -> bool {
        self.store.contains::<T>()
    }

    pub fn try_state<T: State>(&self) -> Result<&T, Error> {
        self.store.try_get::<T>()
    }

    /// # Panics
    /// Panics if `T` was never added.
    pub fn state<T: State>(&self) -> &T {
        self.store.get::<T>()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Mutate a state in place.
    ///
    /// Returns whether the value changed. A change enqueues every command
    /// subscribed to `T`; an unchanged value enqueues nothing.
    pub fn update<T>(&mut self, f: impl FnOnce(&mut T)) -> Result<bool, Error>
    where
        T: State + Clone + PartialEq,
    {
        let state = self.store.try_get_mut::<T>()?;
        let before = state.clone();
        f(state);
        let changed = *state != before;

        if changed && let Some(subscribers) = self.subscriptions.get(&TypeId::of::<T>()) {
            debug!(
                "{} changed, enqueue {} subscribed command(s)",
                type_name::<T>(),
                subscribers.len()
            );
            self.queue.extend(subscribers.iter().copied());
        }
        Ok(changed)
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    pub fn enqueue_command<C: Command>(&mut self) -> Result<(), Error> {
        if !self.commands.contains_key(&TypeId::of::<C>()) {
            return Err(Error::command_not_registered(type_name::<C>()));
        }
        self.queue.push(TypeId::of::<C>());
        Ok(())
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Spawn every enqueued command.
    ///
    /// For each run: the previous run of the same command is cancelled, the
    /// command's generation advances, `prepare` runs against the live states,
    /// and the async body is spawned with a snapshot taken after `prepare`.
    pub fn flush_commands(&mut self) {
        for id in std::mem::take(&mut self.queue) {
            let Some(registered) = self.commands.get(&id) else {
                warn!("Skipped unregistered command {id:?}");
                continue;
            };

            if let Some(previous) = self.running.remove(&id) {
                debug!(
                    "{} superseded run {}",
                    registered.name,
                    previous.id().generation()
                );
                previous.cancel();
            }

            let generation = registered.latest.fetch_add(1, Ordering::AcqRel) + 1;
            let command = registered.command.clone();
            let name = registered.name;

            command.prepare(&mut self.store);
            let snap = self.store.snapshot();

            let token = CancellationToken::new();
            let handle = TaskHandle::new(TaskId::new(id, generation), token.clone());
            let updater = LatestOnlyUpdater::new(
                self.updater(),
                Generation::new(generation, registered.latest.clone()),
            );

            let future = command.run(snap, updater, token.clone());
            self.tasks.spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => debug!("{name} run {generation} cancelled"),
                    _ = future => debug!("{name} run {generation} finished"),
                }
            });
            self.running.insert(id, handle);
        }
    }

    /// Reap finished runs, then apply every update received so far.
    ///
    /// Returns how many updates were applied.
    pub fn sync_updates(&mut self) -> usize {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join_error(joined);
        }

        let mut applied = 0;
        while let Ok(update) = self.recv.try_recv() {
            if self.store.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Flush, then wait for every spawned run, syncing after each one.
    pub async fn flush_and_await(&mut self) {
        self.sync_updates();
        self.flush_commands();

        while let Some(joined) = self.tasks.join_next().await {
            log_join_error(joined);
            self.sync_updates();
        }

        self.sync_updates();
    }

    /// Invalidate every run: no update sent by an in-flight run will apply.
    pub fn invalidate(&mut self) {
        for registered in self.commands.values() {
            registered.latest.fetch_add(1, Ordering::AcqRel);
        }
        for (_, handle) in std::mem::take(&mut self.running) {
            handle.cancel();
        }
        self.queue.clear();
    }

    /// Cancel and wait out every task, then discard queued updates.
    pub async fn shutdown(&mut self) {
        self.invalidate();
        self.tasks.shutdown().await;
        let discarded = self.recv.drain().count();
        if discarded > 0 {
            debug!("Discarded {discarded} update(s) on shutdown");
        }
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(err) = joined
        && !err.is_cancelled()
    {
        error!("Command task failed: {err}");
    }
}

impl Drop for StateCtx {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("store", &self.store)
            .field("commands", &self.commands.len())
            .field("queue", &self.queue.len())
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
