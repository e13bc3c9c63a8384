//! Business layer for the roster client: configuration, the users API and
//! the users provider built on `roster-states`.

mod config;
pub mod http;
pub mod users;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub use config::{BusinessConfig, USERS_LIMIT};
pub use users::{
    FetchUsersError, FetchUsersParams, Pagination, ProviderError, RefreshUsersCommand,
    SearchState, SettingsState, User, UsersProvider, UsersState, UsersView, derive_view,
    fetch_users, format_users_response, read_users,
};
