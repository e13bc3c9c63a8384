//! States owned by the users provider and the derived view.

use std::any::Any;

use chrono::{DateTime, Utc};
use roster_states::{State, state_assign_impl};

use crate::USERS_LIMIT;
use crate::users::api::FetchUsersError;
use crate::users::model::{ResponseInfo, User};

/// Server-side filter input. A change re-runs the refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsState {
    pub search_nationality: String,
}

impl State for SettingsState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

/// Client-side filter input, already debounced by whoever owns the text box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub debounced_search: String,
}

impl State for SearchState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

/// Cursor echoed back to the API. `page` and `seed` come from the last
/// response; `limit` is always [`USERS_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub seed: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: USERS_LIMIT,
            seed: String::new(),
        }
    }
}

/// Cache written only by `RefreshUsersCommand`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersState {
    users: Vec<User>,
    is_loading: bool,
    error: Option<FetchUsersError>,
    pagination: Pagination,
    last_fetched_at: Option<DateTime<Utc>>,
}

impl UsersState {
    /// Users of the last successful fetch, unfiltered.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&FetchUsersError> {
        self.error.as_ref()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    pub fn view(&self, search: &str) -> UsersView<'_> {
        UsersView {
            users: derive_view(&self.users, search),
            is_loading: self.is_loading,
            error: self.error.as_ref(),
        }
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// Replace the page (never append) and take the cursor from `info`.
    pub(crate) fn finish_success(&mut self, users: Vec<User>, info: &ResponseInfo, at: DateTime<Utc>) {
        self.users = users;
        self.pagination.page = info.page;
        self.pagination.seed.clone_from(&info.seed);
        self.last_fetched_at = Some(at);
        self.is_loading = false;
    }

    /// Keep users and cursor as they were; only record the error.
    pub(crate) fn finish_error(&mut self, error: FetchUsersError) {
        self.error = Some(error);
        self.is_loading = false;
    }
}

impl State for UsersState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

/// What the rendering layer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersView<'a> {
    pub users: Vec<&'a User>,
    pub is_loading: bool,
    pub error: Option<&'a FetchUsersError>,
}

/// Narrow `users` to those whose first or last name contains `search`,
/// ignoring case. An empty `search` keeps everything. Order is preserved.
pub fn derive_view<'a, I>(users: I, search: &str) -> Vec<&'a User>
where
    I: IntoIterator<Item = &'a User>,
{
    if search.is_empty() {
        return users.into_iter().collect();
    }
    let needle = search.to_lowercase();
    users
        .into_iter()
        .filter(|user| user.name_contains(&needle))
        .collect()
}
