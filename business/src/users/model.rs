//! Wire types for the randomuser.me-compatible API and the formatted [`User`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `info` envelope of a page: the cursor to echo back on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub seed: String,
    pub page: u32,
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub info: ResponseInfo,
    pub results: Vec<RawUser>,
}

/// The API answers some failures with `200 OK` and `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UsersEnvelope {
    Failure { error: String },
    Page(UsersResponse),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawName {
    #[serde(default)]
    pub title: String,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStreet {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub street: RawStreet,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    /// Numeric for some nationalities, a string for others.
    #[serde(default)]
    pub postcode: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLogin {
    pub uuid: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDob {
    pub date: DateTime<Utc>,
    pub age: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub thumbnail: String,
}

/// One entry of `results` as the API sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub gender: String,
    pub name: RawName,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: Option<RawLogin>,
    #[serde(default)]
    pub dob: Option<RawDob>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub cell: String,
    #[serde(default)]
    pub picture: Option<Picture>,
    #[serde(default)]
    pub nat: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postcode: String,
}

/// A user as the rest of the app sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub email: String,
    pub username: String,
    pub phone: String,
    pub cell: String,
    pub nationality: String,
    pub location: Option<Location>,
    pub picture: Option<Picture>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub age: Option<u32>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match on first or last name.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn name_contains(&self, needle: &str) -> bool {
        self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
    }
}

fn postcode_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl From<RawLocation> for Location {
    fn from(raw: RawLocation) -> Self {
        let street = match (raw.street.number, raw.street.name.is_empty()) {
            (_, true) => String::new(),
            (0, false) => raw.street.name,
            (number, false) => format!("{number} {}", raw.street.name),
        };
        Self {
            street,
            postcode: postcode_to_string(&raw.postcode),
            city: raw.city,
            state: raw.state,
            country: raw.country,
        }
    }
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        let (id, username) = match raw.login {
            Some(login) => (login.uuid, login.username),
            None => (raw.email.clone(), String::new()),
        };
        let (date_of_birth, age) = match raw.dob {
            Some(dob) => (Some(dob.date), Some(dob.age)),
            None => (None, None),
        };
        Self {
            id,
            title: raw.name.title,
            first_name: raw.name.first,
            last_name: raw.name.last,
            gender: raw.gender,
            email: raw.email,
            username,
            phone: raw.phone,
            cell: raw.cell,
            nationality: raw.nat,
            location: raw.location.map(Location::from),
            picture: raw.picture,
            date_of_birth,
            age,
        }
    }
}

/// Normalize a page of raw results, keeping server order.
pub fn format_users_response(results: Vec<RawUser>) -> Vec<User> {
    results.into_iter().map(User::from).collect()
}
