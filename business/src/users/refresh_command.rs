//! Refresh of the users list.
//!
//! `RefreshUsersCommand` is the only writer of [`UsersState`]. It is enqueued
//! once when the provider mounts and again every time [`SettingsState`]
//! changes. Each run:
//! - marks the cache as loading as soon as it is flushed (`prepare`)
//! - fetches the page for the current nationality and cursor
//! - replaces the users and cursor on success, or records the error
//! - clears the loading flag either way
//!
//! A run that has been superseded by a newer one never writes. Cancellation
//! drops the run's future mid-fetch, so there is no cancel check in the body.

use chrono::Utc;
use log::{error, info, warn};
use roster_states::{
    Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater, StateStore,
};
use tokio_util::sync::CancellationToken;

use crate::BusinessConfig;
use crate::users::api::{self as users_api, FetchUsersParams};
use crate::users::model::format_users_response;
use crate::users::state::{SettingsState, UsersState};

#[derive(Debug, Default)]
pub struct RefreshUsersCommand;

impl Command for RefreshUsersCommand {
    fn prepare(&self, states: &mut StateStore) {
        match states.try_get_mut::<UsersState>() {
            Ok(users) => users.begin_refresh(),
            Err(err) => warn!("RefreshUsersCommand: {err}"),
        }
    }

    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let api_url = snap.state::<BusinessConfig>().api_url();
        let params = FetchUsersParams {
            nationality: snap.state::<SettingsState>().search_nationality.clone(),
            pagination: snap.state::<UsersState>().pagination().clone(),
        };

        Box::pin(async move {
            info!(
                "RefreshUsersCommand: fetching page {} (nationality: {:?}, run {})",
                params.pagination.page,
                params.nationality,
                updater.generation()
            );

            match users_api::fetch_users(api_url.as_str(), &params).await {
                Ok(response) => {
                    let users = format_users_response(response.results);
                    let info = response.info;
                    info!(
                        "RefreshUsersCommand: fetched {} users (page {}, seed {})",
                        users.len(),
                        info.page,
                        info.seed
                    );
                    let fetched_at = Utc::now();
                    updater.update::<UsersState>(move |state| {
                        state.finish_success(users, &info, fetched_at);
                    });
                }
                Err(err) => {
                    error!("RefreshUsersCommand: {err}");
                    updater.update::<UsersState>(move |state| state.finish_error(err));
                }
            }
        })
    }
}
