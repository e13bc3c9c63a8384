//! Users API client helpers.
//!
//! Performs the network IO for the users list. Callers (the refresh command)
//! map the result into state updates.

use log::debug;
use thiserror::Error;

use crate::http::Client;
use crate::users::model::{UsersEnvelope, UsersResponse};
use crate::users::state::Pagination;

/// Any failure of a users fetch. Callers treat every variant the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchUsersError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API returned status: {0}")]
    Status(u16),
    #[error("failed to parse users response: {0}")]
    Decode(String),
    #[error("API reported an error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchUsersParams {
    /// Nationality code (e.g. `"fr"`); empty means any nationality.
    pub nationality: String,
    pub pagination: Pagination,
}

impl FetchUsersParams {
    /// Query string pairs in request order. Empty `seed`/`nat` are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.pagination.page.to_string()),
            ("results", self.pagination.limit.to_string()),
        ];
        if !self.pagination.seed.is_empty() {
            pairs.push(("seed", self.pagination.seed.clone()));
        }
        if !self.nationality.is_empty() {
            pairs.push(("nat", self.nationality.clone()));
        }
        pairs
    }
}

/// GET `{api_url}/?page=..&results=..[&seed=..][&nat=..]`
pub async fn fetch_users(
    api_url: &str,
    params: &FetchUsersParams,
) -> Result<UsersResponse, FetchUsersError> {
    let url = format!("{}/", api_url.trim_end_matches('/'));
    debug!("GET {url} {:?}", params.query_pairs());

    let response = Client::get(url)
        .header("accept", "application/json")
        .query(params.query_pairs())
        .send()
        .await
        .map_err(|e| FetchUsersError::Transport(e.to_string()))?;

    if !response.is_success() {
        return Err(FetchUsersError::Status(response.status));
    }

    match response
        .json::<UsersEnvelope>()
        .map_err(|e| FetchUsersError::Decode(e.to_string()))?
    {
        UsersEnvelope::Failure { error } => Err(FetchUsersError::Api(error)),
        UsersEnvelope::Page(page) => Ok(page),
    }
}
