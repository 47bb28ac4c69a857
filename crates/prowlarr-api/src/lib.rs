//! # prowlarr-api
//!
//! Blocking client for the Prowlarr v1 REST API.
//!
//! The API is consumed through the [`Backend`] trait: list/create/update/delete
//! and schema listing for every configurable collection, plus the tag and
//! category lookups needed to translate names into ids.
//!
//! ## Example
//!
//! ```no_run
//! use prowlarr_api::{Backend, Credentials, HttpBackend, Resource};
//! use std::time::Duration;
//!
//! let credentials = Credentials::new("http://localhost:9696", "0123456789abcdef0123456789abcdef");
//! let backend = HttpBackend::with_timeout(credentials, Duration::from_secs(10));
//!
//! for client in backend.list(Resource::DownloadClient).unwrap() {
//!     println!("{}", client["name"]);
//! }
//! ```
//!
//! ## API key discovery
//!
//! When no key is configured, [`initialize::fetch`] scrapes the key from
//! `initialize.js`, which Prowlarr embeds when authentication is disabled for
//! the caller.

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod initialize;
pub mod types;

pub use backend::http::HttpBackend;
pub use backend::{Backend, Call, MockBackend};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    Category, CategoryGroup, Credentials, DEFAULT_TIMEOUT, InitializeJs, Resource, SystemStatus,
    Tag,
};
