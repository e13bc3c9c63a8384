use std::any::Any;
use std::env::vars;

use log::info;
use roster_states::{State, state_assign_impl};
use serde::Deserialize;
use ustr::Ustr;

/// Page size requested from the users API. Not adjustable at runtime.
pub const USERS_LIMIT: u32 = 25;

const DEFAULT_API_BASE_URL: &str = "https://randomuser.me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    pub api_base_url: String,
}

/// Environment overrides, read from `ROSTER_*` variables.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    roster_api_base_url: Option<String>,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
        }
    }

    /// Build the config from the process environment.
    ///
    /// `ROSTER_API_BASE_URL` overrides the default API host.
    pub fn from_env() -> anyhow::Result<Self> {
        info!("Loading business configuration from environment variables");
        let raw: RawConfig = serde_env::from_iter(vars())?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        match raw.roster_api_base_url {
            Some(url) if !url.trim().is_empty() => {
                info!("Using provided ROSTER_API_BASE_URL: {url}");
                Self::new(url.trim_end_matches('/'))
            }
            _ => Self::default(),
        }
    }

    pub fn api_url(&self) -> Ustr {
        if self.api_base_url.is_empty() {
            Ustr::from("/api")
        } else {
            Ustr::from(&format!("{}/api", self.api_base_url))
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl State for BusinessConfig {
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
