//! Test utilities for exercising the users provider against a mock server.
//!
//! # Example
//!
//! ```ignore
//! let test_ctx = TestContext::new().await;
//! test_ctx
//!     .mock_users_page(None, page_body("abc", 2, vec![sample_raw_user("Ann", "Lee")]))
//!     .await;
//!
//! let mut provider = UsersProvider::mount(test_ctx.config());
//! provider.settle().await;
//! ```

#![cfg(all(test, not(target_arch = "wasm32")))]

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

use crate::BusinessConfig;

const USERS_PATH: &str = "/api/";

/// Holds the mock server for the lifetime of a test.
pub struct TestContext {
    pub mock_server: MockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            mock_server: MockServer::start().await,
        }
    }

    pub fn config(&self) -> BusinessConfig {
        BusinessConfig::new(self.mock_server.uri())
    }

    /// Respond to users requests for `nationality` (`None` = no `nat` param).
    pub async fn mock_users_page(&self, nationality: Option<&str>, body: Value) {
        self.mount_users(nationality, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    pub async fn mock_users_page_delayed(
        &self,
        nationality: Option<&str>,
        body: Value,
        delay: Duration,
    ) {
        self.mount_users(
            nationality,
            ResponseTemplate::new(200).set_body_json(body).set_delay(delay),
        )
        .await;
    }

    pub async fn mock_users_status(&self, nationality: Option<&str>, status: u16) {
        self.mount_users(
            nationality,
            ResponseTemplate::new(status).set_body_json(json!({ "error": "unavailable" })),
        )
        .await;
    }

    /// `200 OK` with the API's `{"error": ...}` body.
    pub async fn mock_users_api_error(&self, nationality: Option<&str>, message: &str) {
        self.mount_users(
            nationality,
            ResponseTemplate::new(200).set_body_json(json!({ "error": message })),
        )
        .await;
    }

    async fn mount_users(&self, nationality: Option<&str>, response: ResponseTemplate) {
        let mock = Mock::given(method("GET")).and(path(USERS_PATH));
        let mock = match nationality {
            Some(nat) => mock.and(query_param("nat", nat)),
            None => mock.and(query_param_is_missing("nat")),
        };
        mock.respond_with(response).mount(&self.mock_server).await;
    }

    /// Query parameters of every users request received so far, in order.
    pub async fn users_queries(&self) -> Vec<HashMap<String, String>> {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == USERS_PATH)
            .map(|request| request.url.query_pairs().into_owned().collect())
            .collect()
    }
}

pub fn sample_raw_user(first: &str, last: &str) -> Value {
    json!({
        "gender": "female",
        "name": { "title": "Ms", "first": first, "last": last },
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "login": { "uuid": format!("{first}-{last}"), "username": first.to_lowercase() },
        "dob": { "date": "1990-01-01T00:00:00.000Z", "age": 36 },
        "phone": "000-000",
        "cell": "111-111",
        "nat": "US"
    })
}

pub fn page_body(seed: &str, page: u32, results: Vec<Value>) -> Value {
    json!({
        "info": { "seed": seed, "results": results.len(), "page": page, "version": "1.4" },
        "results": results
    })
}
