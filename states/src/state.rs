use std::any::{Any, type_name};

use log::warn;

/// A value owned by [`StateCtx`](crate::StateCtx), keyed by its concrete type.
///
/// States are mutated on the owner's side only: either directly through
/// `StateCtx::update` or by applying updates that commands send through an
/// [`Updater`](crate::Updater).
pub trait State: Any + Send {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone handed to commands when they are flushed.
    ///
    /// Returning `None` hides the state from command snapshots.
    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    /// Replace `self` with a boxed value of the same concrete type.
    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Shared `assign_box` body for states.
///
/// A value of the wrong type is logged and dropped; the current value stays.
pub fn state_assign_impl<T: State>(this: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *this = *value,
        Err(_) => warn!(
            "Ignored update for {}: value has a different type",
            type_name::<T>()
        ),
    }
}
