//! Error types for Prowlarr API operations.
//!
//! Errors carry a category so callers can print a short description and
//! actionable advice without matching on every variant.

use std::fmt;
use std::io;

/// Result type alias for Prowlarr API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The server could not be reached or timed out.
    Network,
    /// The API key was rejected.
    Auth,
    /// The requested resource does not exist.
    NotFound,
    /// The server rejected the payload.
    Rejected,
    /// The server answered with something we could not parse.
    InvalidResponse,
    /// Local configuration problem (bad URL, missing key).
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Resource not found",
            Self::Rejected => "Request rejected by Prowlarr",
            Self::InvalidResponse => "Invalid response from Prowlarr",
            Self::Config => "Invalid connection settings",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that Prowlarr is running and reachable, then try again",
            Self::Auth => "Check the API key (Settings -> General -> Security in Prowlarr)",
            Self::NotFound => "The resource may have been removed outside of this tool",
            Self::Rejected => "Run with -vv to see the payload and compare it with the Prowlarr UI",
            Self::InvalidResponse => "Make sure the URL points at a Prowlarr instance",
            Self::Config => "Check hostname, port, protocol and url_base in the config file",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Prowlarr.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// A resource id was not found on the server.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// API resource name.
        resource: String,
        /// Remote id.
        id: i64,
    },

    /// `initialize.js` did not contain the expected assignment.
    #[error("unable to parse initialize.js: {0}")]
    InitializeJs(String),

    /// No API key was configured and none could be discovered.
    #[error("no API key available for {host_url}")]
    MissingApiKey {
        /// Instance the key was needed for.
        host_url: String,
    },

    /// Invalid response from the API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// IO error while reading a response body.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Error for a response with a failing status code.
    ///
    /// Prowlarr answers rejected payloads with a list of validation failures,
    /// which are summarised as `property: message`. Any other body is kept as
    /// it is.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let detail = serde_json::from_str::<Vec<serde_json::Value>>(body)
            .ok()
            .map(|failures| {
                failures
                    .iter()
                    .filter_map(|failure| {
                        let message = failure.get("errorMessage")?.as_str()?;
                        Some(match failure.get("propertyName").and_then(|p| p.as_str()) {
                            Some(property) if !property.is_empty() => format!("{property}: {message}"),
                            _ => message.to_string(),
                        })
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .filter(|detail| !detail.is_empty())
            .unwrap_or_else(|| body.to_string());
        let message = if detail.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {detail}")
        };
        Self::http(message, Some(status))
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { status, .. } => match status {
                Some(401 | 403) => ErrorCategory::Auth,
                Some(404) => ErrorCategory::NotFound,
                Some(400 | 409 | 422) => ErrorCategory::Rejected,
                Some(_) => ErrorCategory::Other,
                None => ErrorCategory::Network,
            },
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InitializeJs(_) | Error::InvalidResponse(_) => ErrorCategory::InvalidResponse,
            Error::MissingApiKey { .. } => ErrorCategory::Config,
            Error::Io(_) => ErrorCategory::Network,
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Other(format!("invalid pattern: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_text() {
        for category in [
            ErrorCategory::Network,
            ErrorCategory::Auth,
            ErrorCategory::NotFound,
            ErrorCategory::Rejected,
            ErrorCategory::InvalidResponse,
            ErrorCategory::Config,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
        assert!(format!("{}", ErrorCategory::Auth).contains("Authentication"));
    }

    #[test]
    fn test_http_status_categories() {
        assert_eq!(Error::http("HTTP 401", Some(401)).category(), ErrorCategory::Auth);
        assert_eq!(Error::http("HTTP 403", Some(403)).category(), ErrorCategory::Auth);
        assert_eq!(
            Error::http("HTTP 404", Some(404)).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::http("HTTP 400", Some(400)).category(),
            ErrorCategory::Rejected
        );
        assert_eq!(Error::http("HTTP 500", Some(500)).category(), ErrorCategory::Other);
        assert_eq!(
            Error::http("connection refused", None).category(),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_from_status_validation_failures() {
        let body = r#"[
            {"propertyName": "BaseUrl", "errorMessage": "Invalid Url", "severity": "error"},
            {"propertyName": "", "errorMessage": "Unable to connect to indexer"}
        ]"#;
        let err = Error::from_status(400, body);
        assert_eq!(err.category(), ErrorCategory::Rejected);
        assert_eq!(
            err.to_string(),
            "HTTP request failed: HTTP 400: BaseUrl: Invalid Url; Unable to connect to indexer"
        );
    }

    #[test]
    fn test_from_status_plain_body() {
        let err = Error::from_status(500, "  Internal Server Error\n");
        assert_eq!(err.to_string(), "HTTP request failed: HTTP 500: Internal Server Error");
        let err = Error::from_status(401, "");
        assert_eq!(err.to_string(), "HTTP request failed: HTTP 401");
        assert_eq!(err.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_from_ureq_status_code() {
        let err: Error = ureq::Error::StatusCode(401).into();
        match err {
            Error::HttpError { message, status } => {
                assert_eq!(message, "HTTP 401");
                assert_eq!(status, Some(401));
            }
            _ => panic!("Expected Error::HttpError"),
        }
    }

    #[test]
    fn test_missing_api_key_display() {
        let err = Error::MissingApiKey {
            host_url: "http://localhost:9696".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("localhost:9696"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.category(), ErrorCategory::InvalidResponse);
    }
}
