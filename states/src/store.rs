use std::any::{TypeId, type_name};
use std::collections::BTreeMap;

use log::warn;

use crate::updater::{Update, UpdateKind};
use crate::{CommandSnapshot, Error, State};

/// Typed storage for every state a `StateCtx` owns.
#[derive(Default)]
pub struct StateStore {
    states: BTreeMap<TypeId, Box<dyn State>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), Box::new(state));
    }

    pub fn contains<T: State>(&self) -> bool {
        self.states.contains_key(&TypeId::of::<T>())
    }

    pub fn try_get<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>(), "state store"))
    }

    pub fn try_get_mut<T: State>(&mut self) -> Result<&mut T, Error> {
        self.states
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>(), "state store"))
    }

    /// # Panics
    /// Panics if `T` was never added.
    pub fn get<T: State>(&self) -> &T {
        self.try_get::<T>()
            .unwrap_or_else(|_| panic!("State {} is not registered", type_name::<T>()))
    }

    /// # Panics
    /// Panics if `T` was never added.
    pub fn get_mut<T: State>(&mut self) -> &mut T {
        self.try_get_mut::<T>()
            .unwrap_or_else(|_| panic!("State {} is not registered", type_name::<T>()))
    }

    pub fn snapshot(&self) -> CommandSnapshot {
        let mut snap = CommandSnapshot::new();
        for (id, state) in &self.states {
            if let Some(cloned) = state.snapshot() {
                snap.insert_cloned(*id, cloned);
            }
        }
        snap
    }

    /// Apply a queued update. Returns `false` when it was skipped.
    pub(crate) fn apply(&mut self, update: Update) -> bool {
        if !update.is_current() {
            return false;
        }
        let Some(state) = self.states.get_mut(&update.id) else {
            warn!("Update for unregistered state {} ignored", update.type_name);
            return false;
        };
        match update.kind {
            UpdateKind::Replace(value) => state.assign_box(value),
            UpdateKind::Mutate(apply) => apply(state.as_any_mut()),
        }
        true
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("states", &self.states.len())
            .finish()
    }
}
