//! The users provider: a mounted handle over a `StateCtx`.
//!
//! Mounting registers the users states and the refresh command, subscribes
//! the refresh to nationality changes and starts the first fetch. Consumers
//! read [`UsersView`] through the handle, so there is no "outside the
//! provider" case to guard. Code that only holds a shared `StateCtx` reads
//! through [`read_users`], which does check.

use chrono::{DateTime, Utc};
use log::{error, info};
use roster_states::StateCtx;
use thiserror::Error;

use crate::BusinessConfig;
use crate::users::refresh_command::RefreshUsersCommand;
use crate::users::state::{Pagination, SearchState, SettingsState, UsersState, UsersView};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("read_users must be used within a UsersProvider")]
    NotMounted,
}

/// Register the users provider in an existing context and kick off the
/// initial fetch.
///
/// Must be called from within a Tokio runtime.
pub fn install(ctx: &mut StateCtx, config: BusinessConfig, settings: SettingsState) {
    info!(
        "Mounting users provider (api: {}, nationality: {:?})",
        config.api_url(),
        settings.search_nationality
    );
    ctx.add_state(config);
    ctx.add_state(settings);
    ctx.add_state(SearchState::default());
    ctx.add_state(UsersState::default());
    ctx.record_command(RefreshUsersCommand);
    ctx.subscribe::<SettingsState, RefreshUsersCommand>();

    if let Err(err) = ctx.enqueue_command::<RefreshUsersCommand>() {
        error!("Failed to enqueue the initial refresh: {err}");
    }
    ctx.flush_commands();
}

/// Read the users view from a context the provider was installed into.
pub fn read_users(ctx: &StateCtx) -> Result<UsersView<'_>, ProviderError> {
    let users = ctx
        .try_state::<UsersState>()
        .map_err(|_| ProviderError::NotMounted)?;
    let search = ctx
        .try_state::<SearchState>()
        .map_err(|_| ProviderError::NotMounted)?;
    Ok(users.view(&search.debounced_search))
}

#[derive(Debug)]
pub struct UsersProvider {
    ctx: StateCtx,
}

impl UsersProvider {
    /// Mount with no nationality filter.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(config: BusinessConfig) -> Self {
        Self::mount_with(config, SettingsState::default())
    }

    pub fn mount_with(config: BusinessConfig, settings: SettingsState) -> Self {
        let mut ctx = StateCtx::new();
        install(&mut ctx, config, settings);
        Self { ctx }
    }

    pub fn read(&self) -> UsersView<'_> {
        let search = &self.ctx.state::<SearchState>().debounced_search;
        self.ctx.state::<UsersState>().view(search)
    }

    /// Change the server-side filter.
    ///
    /// Returns `true` when the value changed and a refresh was started.
    pub fn set_nationality(&mut self, nationality: impl Into<String>) -> bool {
        let nationality = nationality.into();
        let changed = match self
            .ctx
            .update::<SettingsState>(|settings| settings.search_nationality = nationality)
        {
            Ok(changed) => changed,
            Err(err) => {
                error!("Failed to update nationality: {err}");
                false
            }
        };
        self.ctx.flush_commands();
        changed
    }

    /// Change the client-side filter. Never refetches.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if let Err(err) = self
            .ctx
            .update::<SearchState>(|state| state.debounced_search = search)
        {
            error!("Failed to update search: {err}");
        }
    }

    /// Re-run the fetch with the current nationality and cursor.
    pub fn refresh(&mut self) {
        if let Err(err) = self.ctx.enqueue_command::<RefreshUsersCommand>() {
            error!("Failed to enqueue refresh: {err}");
            return;
        }
        self.ctx.flush_commands();
    }

    pub fn nationality(&self) -> &str {
        &self.ctx.state::<SettingsState>().search_nationality
    }

    pub fn search(&self) -> &str {
        &self.ctx.state::<SearchState>().debounced_search
    }

    pub fn pagination(&self) -> &Pagination {
        self.ctx.state::<UsersState>().pagination()
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.ctx.state::<UsersState>().last_fetched_at()
    }

    /// Apply results of runs that have settled. Call once per frame.
    pub fn sync(&mut self) -> usize {
        self.ctx.sync_updates()
    }

    pub fn in_flight(&self) -> usize {
        self.ctx.task_count()
    }

    /// Wait until every in-flight refresh has settled and been applied.
    pub async fn settle(&mut self) {
        self.ctx.flush_and_await().await;
    }

    pub fn ctx(&self) -> &StateCtx {
        &self.ctx
    }

    /// Cancel every in-flight refresh and discard its results. The last
    /// applied users, cursor and error stay readable.
    pub async fn teardown(&mut self) {
        info!("Tearing down users provider");
        self.ctx.shutdown().await;
    }

    pub async fn unmount(mut self) {
        self.teardown().await;
    }
}
