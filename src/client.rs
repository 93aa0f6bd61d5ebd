//! API client for the cluster's REST interface
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// API surface the collectors depend on
///
/// `api_version` is the path segment after `/api/` (`v1`, `v2`, `internal`).
/// Bodies come back decoded but untyped.
#[async_trait]
pub trait ApiClient: Send + Sync + 'static {
    /// Issue a GET request
    async fn get(&self, api_version: &str, path: &str, timeout_secs: u64) -> Result<Value>;

    /// Issue a POST request with a JSON body
    async fn post(&self, api_version: &str, path: &str, body: &Value, timeout_secs: u64) -> Result<Value>;

    /// The software version reported by the cluster
    async fn cluster_version(&self, timeout_secs: u64) -> Result<String> {
        let body = self.get("v1", "/cluster/me", timeout_secs).await?;
        body.get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ExporterError::decode("/cluster/me", "missing 'version'"))
    }
}

/// reqwest-backed client using HTTP basic authentication
pub struct CdmClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl CdmClient {
    /// Create a new client for the node in `config`
    pub fn new(config: &ExporterConfig) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base_url: format!("https://{}/api", config.node_ip),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, api_version: &str, path: &str) -> String {
        format!("{}/{}{}", self.base_url, api_version, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<Value> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<Value>().await?;
        trace!("Response from {}: {}", path, body);
        Ok(body)
    }
}

#[async_trait]
impl ApiClient for CdmClient {
    async fn get(&self, api_version: &str, path: &str, timeout_secs: u64) -> Result<Value> {
        debug!("GET {} {}", api_version, path);
        let request = self
            .http
            .get(self.url(api_version, path))
            .timeout(Duration::from_secs(timeout_secs));
        self.send(request, path).await
    }

    async fn post(&self, api_version: &str, path: &str, body: &Value, timeout_secs: u64) -> Result<Value> {
        debug!("POST {} {}", api_version, path);
        let request = self
            .http
            .post(self.url(api_version, path))
            .json(body)
            .timeout(Duration::from_secs(timeout_secs));
        self.send(request, path).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// A call recorded by [`MockClient`]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub method: &'static str,
        pub api_version: String,
        pub path: String,
        pub body: Option<Value>,
        pub timeout_secs: u64,
    }

    /// Serves canned responses keyed by method and path.
    ///
    /// A key may hold several responses; they are served in order and the last
    /// one repeats. A key with no response fails the call.
    #[derive(Default)]
    pub struct MockClient {
        responses: Mutex<HashMap<(String, String), VecDeque<Value>>>,
        failures: Mutex<Vec<(String, String)>>,
        calls: Mutex<Vec<Call>>,
        version: Mutex<Option<String>>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_get(self, path: &str, body: Value) -> Self {
            self.push("GET", path, body);
            self
        }

        pub fn on_post(self, path: &str, body: Value) -> Self {
            self.push("POST", path, body);
            self
        }

        pub fn fail_get(self, path: &str) -> Self {
            self.failures.lock().unwrap().push(("GET".into(), path.into()));
            self
        }

        pub fn with_version(self, version: &str) -> Self {
            *self.version.lock().unwrap() = Some(version.to_string());
            self
        }

        fn push(&self, method: &str, path: &str, body: Value) {
            self.responses
                .lock()
                .unwrap()
                .entry((method.to_string(), path.to_string()))
                .or_default()
                .push_back(body);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, method: &str, path: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.method == method && c.path == path)
                .count()
        }

        fn record(&self, method: &'static str, api_version: &str, path: &str, body: Option<Value>, timeout_secs: u64) {
            self.calls.lock().unwrap().push(Call {
                method,
                api_version: api_version.to_string(),
                path: path.to_string(),
                body,
                timeout_secs,
            });
        }

        fn respond(
            &self,
            method: &'static str,
            api_version: &str,
            path: &str,
            body: Option<Value>,
            timeout_secs: u64,
        ) -> Result<Value> {
            self.record(method, api_version, path, body, timeout_secs);

            let key = (method.to_string(), path.to_string());
            if self.failures.lock().unwrap().contains(&key) {
                return Err(ExporterError::Status { path: path.to_string(), status: 500 });
            }

            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(&key) {
                Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
                Some(queue) if queue.len() == 1 => Ok(queue[0].clone()),
                _ => Err(ExporterError::Status { path: path.to_string(), status: 404 }),
            }
        }
    }

    #[async_trait]
    impl ApiClient for MockClient {
        async fn get(&self, api_version: &str, path: &str, timeout_secs: u64) -> Result<Value> {
            self.respond("GET", api_version, path, None, timeout_secs)
        }

        async fn post(&self, api_version: &str, path: &str, body: &Value, timeout_secs: u64) -> Result<Value> {
            self.respond("POST", api_version, path, Some(body.clone()), timeout_secs)
        }

        async fn cluster_version(&self, timeout_secs: u64) -> Result<String> {
            self.record("GET", "v1", "/cluster/me", None, timeout_secs);
            match self.version.lock().unwrap().clone() {
                Some(version) => Ok(version),
                None => Err(ExporterError::Status { path: "/cluster/me".into(), status: 503 }),
            }
        }
    }
}
