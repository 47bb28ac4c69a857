//! Bootstrap metadata from `initialize.js`.
//!
//! Prowlarr serves `GET /initialize.js` as a JavaScript assignment:
//!
//! ```text
//! window.Prowlarr = {
//!   apiRoot: '/api/v1',
//!   apiKey: '0123456789abcdef0123456789abcdef',
//!   ...
//! };
//! ```
//!
//! The assignment is located with a regular expression and the object
//! literal, which uses unquoted keys and single-quoted strings, is parsed as
//! JSON5. When authentication is disabled for the caller's address the API
//! key is embedded, which is how the key is discovered when none is
//! configured.

use crate::backend::http::{check_status, session};
use crate::error::{Error, Result};
use crate::types::InitializeJs;
use regex::Regex;
use serde_json::{Map, Value};
use std::time::Duration;

const ASSIGNMENT_PATTERN: &str = r"(?s)^\s*window\.Prowlarr\s*=\s*(\{.*\})\s*;?\s*$";

/// Fetch and parse `<host_url>/initialize.js`.
///
/// The API key header is only sent when a key is already known.
pub fn fetch(host_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<InitializeJs> {
    let url = format!("{}/initialize.js", host_url.trim_end_matches('/'));
    log::debug!("GET {url}");
    let mut request = session(timeout).get(&url);
    if let Some(key) = api_key {
        request = request.header("X-Api-Key", key);
    }
    let mut response = check_status(request.call()?)?;
    let body = response.body_mut().read_to_string()?;
    let parsed = parse(&body)?;
    log::debug!(
        "GET {url} -> version={:?} api_key={}",
        parsed.version,
        if parsed.api_key.is_some() { "present" } else { "absent" }
    );
    Ok(parsed)
}

/// Parse the body of `initialize.js`.
pub fn parse(body: &str) -> Result<InitializeJs> {
    let assignment = Regex::new(ASSIGNMENT_PATTERN)?;
    let object = assignment
        .captures(body)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::InitializeJs(format!("no matches in response: {body}")))?;

    let properties: Map<String, Value> = json5::from_str(object.as_str())
        .map_err(|e| Error::InitializeJs(format!("invalid object literal: {e}")))?;
    let get = |key: &str| {
        properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Ok(InitializeJs {
        api_root: get("apiRoot"),
        api_key: get("apiKey"),
        url_base: get("urlBase"),
        version: get("version"),
        instance_name: get("instanceName"),
    })
}
