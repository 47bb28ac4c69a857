//! HTTP backend for a live Prowlarr server.
//!
//! Every call opens its own short-lived [`ureq::Agent`] with the configured
//! global timeout and drops it when the call returns. Nothing is pooled
//! between operations.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{CategoryGroup, Credentials, DEFAULT_TIMEOUT, Resource, SystemStatus, Tag};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

const API_KEY_HEADER: &str = "X-Api-Key";
const USER_AGENT: &str = concat!("prowlarr-api/", env!("CARGO_PKG_VERSION"));

/// Backend talking to Prowlarr over HTTP(S).
///
/// # Example
///
/// ```no_run
/// use prowlarr_api::backend::Backend;
/// use prowlarr_api::backend::http::HttpBackend;
/// use prowlarr_api::{Credentials, Resource};
///
/// let backend = HttpBackend::new(Credentials::new("http://localhost:9696", "0123456789abcdef0123456789abcdef"));
/// let indexers = backend.list(Resource::Indexer).unwrap();
/// println!("{} indexers configured", indexers.len());
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    credentials: Credentials,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend with the default request timeout.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    /// Create a backend with a custom request timeout.
    #[must_use]
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }

    /// Credentials used for every request.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Open a session for a single operation.
    fn session(&self) -> ureq::Agent {
        session(self.timeout)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.credentials.api_url(path);
        log::debug!("GET {url}");
        let response = self
            .session()
            .get(&url)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call()?;
        let value = check_status(response)?.body_mut().read_json()?;
        Ok(value)
    }

    fn send<T: DeserializeOwned>(&self, method: Method, path: &str, payload: &Value) -> Result<T> {
        let url = self.credentials.api_url(path);
        log::debug!("{} {url}", method.as_str());
        log::trace!("{} {url} body={payload}", method.as_str());
        let session = self.session();
        let request = match method {
            Method::Post => session.post(&url),
            Method::Put => session.put(&url),
        };
        let response = request
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(payload)?;
        let value = check_status(response)?.body_mut().read_json()?;
        Ok(value)
    }

    fn remove(&self, path: &str) -> Result<()> {
        let url = self.credentials.api_url(path);
        log::debug!("DELETE {url}");
        let response = self
            .session()
            .delete(&url)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header("User-Agent", USER_AGENT)
            .call()?;
        check_status(response)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Post,
    Put,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Build an agent with a global timeout.
///
/// Failing status codes are returned as responses so [`check_status`] can
/// read the body Prowlarr explains them with.
pub(crate) fn session(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Turn a 4xx or 5xx response into an error carrying its body.
pub(crate) fn check_status(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<ureq::http::Response<ureq::Body>> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }
    let body = response.body_mut().read_to_string().unwrap_or_default();
    log::debug!("HTTP {status} body={body}");
    Err(Error::from_status(status, &body))
}

impl Backend for HttpBackend {
    fn list(&self, resource: Resource) -> Result<Vec<Value>> {
        self.get(resource.path())
    }

    fn schema(&self, resource: Resource) -> Result<Vec<Value>> {
        self.get(&format!("{}/schema", resource.path()))
    }

    fn create(&self, resource: Resource, payload: &Value) -> Result<Value> {
        self.send(Method::Post, resource.path(), payload)
    }

    fn update(&self, resource: Resource, id: i64, payload: &Value) -> Result<Value> {
        self.send(Method::Put, &format!("{}/{id}", resource.path()), payload)
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        self.remove(&format!("{}/{id}", resource.path()))
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        self.get("tag")
    }

    fn create_tag(&self, label: &str) -> Result<Tag> {
        self.send(Method::Post, "tag", &json!({ "label": label }))
    }

    fn delete_tag(&self, id: i64) -> Result<()> {
        self.remove(&format!("tag/{id}"))
    }

    fn categories(&self) -> Result<Vec<CategoryGroup>> {
        self.get("indexer/categories")
    }

    fn system_status(&self) -> Result<SystemStatus> {
        self.get("system/status")
    }
}
