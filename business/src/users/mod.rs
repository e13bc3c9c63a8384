//! Users list domain module.
//!
//! - `model`: wire types and the formatted `User`
//! - `api`: the fetch against the users endpoint
//! - `state`: provider states and the pure `derive_view` filter
//! - `refresh_command`: the only writer of `UsersState`
//! - `provider`: the mounted handle consumers read through

pub mod api;
pub mod model;
pub mod provider;
pub mod refresh_command;
pub mod state;

pub use api::{FetchUsersError, FetchUsersParams, fetch_users};
pub use model::{Location, Picture, RawUser, ResponseInfo, User, UsersResponse, format_users_response};
pub use provider::{ProviderError, UsersProvider, install, read_users};
pub use refresh_command::RefreshUsersCommand;
pub use state::{Pagination, SearchState, SettingsState, UsersState, UsersView, derive_view};
