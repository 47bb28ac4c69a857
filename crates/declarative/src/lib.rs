//! # Declarative
//!
//! A framework for reconciling remote API collections against local definitions.
//!
//! Local definitions are typed serde structures. Each collection is described
//! by a [`ResourceKind`]: a discriminator per implementation and a remote map
//! saying where each local attribute lives in the remote JSON. From that the
//! engine derives decoding, field diffing, create/update payloads and
//! deletion of unmanaged objects.
//!
//! ## Core Concepts
//!
//! - **RemoteMapEntry**: how one local attribute maps to a remote key or `fields` entry
//! - **Snapshot**: the remote objects, schemas and lookup tables for one collection
//! - **Plan**: ordered create/update/delete actions with field-level changes
//! - **Endpoint**: the CRUD calls the engine issues
//!
//! ## Flow
//!
//! ```text
//! Snapshot::fetch ──► plan ──► execute
//!    list              diff       create / update / delete
//!    schemas (lazy)    encode
//!    lookups (lazy)
//! ```
//!
//! [`reconcile`] runs all three, skipping `execute` on a dry run.

pub mod collection;
pub mod context;
pub mod diff;
pub mod executor;
pub mod lookup;
pub mod mapping;
pub mod planner;
pub mod remote_map;
pub mod resource;
pub mod snapshot;
pub mod types;

// Re-export main types at crate root
pub use collection::{Collection, Definitions};
pub use context::{Endpoint, LookupSource, NoLookups};
pub use diff::{FieldChange, MASK};
pub use executor::{Reconciled, execute, reconcile};
pub use lookup::{LookupTable, Lookups};
pub use mapping::{ExtraFields, is_secret_field};
pub use planner::{Action, Plan, plan};
pub use remote_map::{Codec, RemoteEnum, RemoteMapEntry};
pub use resource::{RemoteType, ResourceKind};
pub use snapshot::{RemoteResource, Snapshot};
pub use types::{ExecuteSummary, ReconcileError, ReconcileOptions};
