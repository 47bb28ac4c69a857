//! Prowlarr instance settings
//!
//! One module per configurable collection. Each declares its local definition
//! type and a [`ResourceKind`] describing how it maps onto the REST API; the
//! [`ProwlarrSettings`] aggregator runs them in dependency order.

pub mod applications;
pub mod download_clients;
pub mod indexers;
pub mod notifications;
pub mod proxies;
pub mod sync_profiles;
pub mod tags;


use crate::api::{ApiEndpoint, ApiLookups, TAGS};
use crate::types::Validation;
use anyhow::{Context, Result};
use declarative::planner::definition_tree;
use declarative::{
    Collection, Definitions, ExecuteSummary, LookupSource, Reconciled, ReconcileOptions,
    RemoteMapEntry, RemoteType, ResourceKind, Snapshot,
};
use prowlarr_api::{Backend, Resource, Tag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use applications::{Application, Applications};
use download_clients::{DownloadClient, DownloadClients};
use indexers::{Indexer, Indexers};
use notifications::{Notification, Notifications};
use proxies::{Proxies, Proxy};
use sync_profiles::{SyncProfile, SyncProfiles};
use tags::TagsSettings;

/// Tags of a resource, by label locally and by id remotely.
pub(crate) const TAGS_ENTRY: RemoteMapEntry = RemoteMapEntry::attr("tags", "tags").lookup(TAGS);

// ============================================================================
// Implementations
// ============================================================================

/// Local type names paired with the `implementation` the server reports.
pub(crate) struct Implementations(&'static [(&'static str, &'static str)]);

impl Implementations {
    pub(crate) const fn new(table: &'static [(&'static str, &'static str)]) -> Self {
        Self(table)
    }

    /// Discriminator of a remote object, from its `implementation`.
    pub(crate) fn remote_type(&self, raw: &Value) -> RemoteType {
        let implementation = raw
            .get("implementation")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.0
            .iter()
            .find(|(_, remote)| remote.eq_ignore_ascii_case(implementation))
            .map_or_else(
                || RemoteType::Unsupported(implementation.to_string()),
                |(local, _)| RemoteType::Known((*local).to_string()),
            )
    }

    pub(crate) fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        let Some((_, remote)) = self.0.iter().find(|(local, _)| *local == kind) else {
            return false;
        };
        ["implementation", "implementationName"].iter().any(|key| {
            schema
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|value| value.eq_ignore_ascii_case(remote))
        })
    }
}

// ============================================================================
// Settings tree
// ============================================================================

/// `prowlarr.settings`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProwlarrSettings {
    #[serde(default)]
    pub tags: TagsSettings,
    #[serde(default)]
    pub indexers: IndexersSettings,
    #[serde(default)]
    pub apps: AppsSettings,
    #[serde(default)]
    pub download_clients: Collection<DownloadClient>,
    #[serde(default)]
    pub notifications: Collection<Notification>,
}

/// `prowlarr.settings.indexers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexersSettings {
    #[serde(default)]
    pub indexers: Collection<Indexer>,
    #[serde(default)]
    pub proxies: Collection<Proxy>,
}

/// `prowlarr.settings.apps`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppsSettings {
    #[serde(default)]
    pub applications: Collection<Application>,
    #[serde(default)]
    pub sync_profiles: Collection<SyncProfile>,
}

fn validate_collection<D>(
    tree: &str,
    collection: &Collection<D>,
    validate: impl Fn(&D, &str) -> Validation,
) -> Validation {
    for (name, definition) in collection.definitions.iter() {
        validate(definition, &definition_tree(tree, name))?;
    }
    Ok(())
}

/// What one apply or diff run did, or would do.
#[derive(Debug, Clone, Default)]
pub struct SettingsReport {
    pub tags_created: Vec<String>,
    /// Per collection, in reconcile order.
    pub sections: Vec<Reconciled>,
    pub tags_deleted: Vec<Tag>,
}

impl SettingsReport {
    pub fn changed(&self) -> bool {
        !self.tags_created.is_empty()
            || !self.tags_deleted.is_empty()
            || self.sections.iter().any(Reconciled::changed)
    }

    /// Totals across every collection, tags excluded.
    pub fn summary(&self) -> ExecuteSummary {
        let mut total = ExecuteSummary::default();
        for section in &self.sections {
            total.merge(&section.summary);
        }
        total
    }
}

impl ProwlarrSettings {
    pub fn validate(&self, tree: &str) -> Validation {
        self.tags.validate(&format!("{tree}.tags"))?;
        validate_collection(
            &format!("{tree}.indexers.indexers"),
            &self.indexers.indexers,
            Indexer::validate,
        )?;
        validate_collection(
            &format!("{tree}.indexers.proxies"),
            &self.indexers.proxies,
            Proxy::validate,
        )?;
        validate_collection(
            &format!("{tree}.apps.applications"),
            &self.apps.applications,
            Application::validate,
        )?;
        validate_collection(
            &format!("{tree}.apps.sync_profiles"),
            &self.apps.sync_profiles,
            SyncProfile::validate,
        )?;
        validate_collection(
            &format!("{tree}.download_clients"),
            &self.download_clients,
            DownloadClient::validate,
        )?;
        validate_collection(
            &format!("{tree}.notifications"),
            &self.notifications,
            Notification::validate,
        )
    }

    /// Bring the server in line with these settings.
    ///
    /// Tags are created first so every other section can reference them,
    /// proxies and download clients come before the indexers that use them,
    /// and unused tags are deleted last. On a dry run nothing is mutated and
    /// tags that would be created resolve to placeholder ids.
    pub fn reconcile(
        &self,
        tree: &str,
        backend: &dyn Backend,
        options: ReconcileOptions,
    ) -> Result<SettingsReport> {
        let tags_tree = format!("{tree}.tags");
        let tags_created = self
            .tags
            .create_missing(&tags_tree, backend, options.dry_run)?;
        let lookups = if options.dry_run {
            ApiLookups::new(backend).with_pending_tags(tags_created.clone())
        } else {
            ApiLookups::new(backend)
        };
        let run = Run {
            backend,
            lookups: &lookups,
            options,
        };

        let sections = vec![
            run.section(
                &Proxies,
                Resource::IndexerProxy,
                &format!("{tree}.indexers.proxies"),
                &self.indexers.proxies,
            )?,
            run.section(
                &DownloadClients,
                Resource::DownloadClient,
                &format!("{tree}.download_clients"),
                &self.download_clients,
            )?,
            run.section(
                &SyncProfiles,
                Resource::AppProfile,
                &format!("{tree}.apps.sync_profiles"),
                &self.apps.sync_profiles,
            )?,
            run.section(
                &Applications,
                Resource::Application,
                &format!("{tree}.apps.applications"),
                &self.apps.applications,
            )?,
            run.section(
                &Indexers,
                Resource::Indexer,
                &format!("{tree}.indexers.indexers"),
                &self.indexers.indexers,
            )?,
            run.section(
                &Notifications,
                Resource::Notification,
                &format!("{tree}.notifications"),
                &self.notifications,
            )?,
        ];

        let tags_deleted = self
            .tags
            .delete_unused(&tags_tree, backend, options.dry_run)?;

        let report = SettingsReport {
            tags_created,
            sections,
            tags_deleted,
        };
        log::debug!("{tree}: changed={}", report.changed());
        Ok(report)
    }

    /// Read the current settings of a server.
    ///
    /// Remote objects using implementations this tool does not manage are
    /// left out.
    pub fn from_remote(backend: &dyn Backend) -> Result<Self> {
        let lookups = ApiLookups::new(backend);
        Ok(Self {
            tags: TagsSettings::from_remote(backend)?,
            indexers: IndexersSettings {
                indexers: dump(&Indexers, backend, Resource::Indexer, &lookups)?,
                proxies: dump(&Proxies, backend, Resource::IndexerProxy, &lookups)?,
            },
            apps: AppsSettings {
                applications: dump(&Applications, backend, Resource::Application, &lookups)?,
                sync_profiles: dump(&SyncProfiles, backend, Resource::AppProfile, &lookups)?,
            },
            download_clients: dump(&DownloadClients, backend, Resource::DownloadClient, &lookups)?,
            notifications: dump(&Notifications, backend, Resource::Notification, &lookups)?,
        })
    }
}

struct Run<'a> {
    backend: &'a dyn Backend,
    lookups: &'a dyn LookupSource,
    options: ReconcileOptions,
}

impl Run<'_> {
    fn section<K: ResourceKind>(
        &self,
        kind: &K,
        resource: Resource,
        tree: &str,
        collection: &Collection<K::Definition>,
    ) -> Result<Reconciled> {
        let endpoint = ApiEndpoint::new(self.backend, resource);
        let reconciled =
            declarative::reconcile(kind, tree, collection, &endpoint, self.lookups, self.options)
                .with_context(|| format!("failed to reconcile {tree}"))?;
        log::debug!(
            "{tree}: {} created, {} modified, {} deleted",
            reconciled.summary.created,
            reconciled.summary.modified,
            reconciled.summary.removed
        );
        Ok(reconciled)
    }
}

fn dump<K: ResourceKind>(
    kind: &K,
    backend: &dyn Backend,
    resource: Resource,
    lookups: &dyn LookupSource,
) -> Result<Collection<K::Definition>> {
    let endpoint = ApiEndpoint::new(backend, resource);
    let snapshot = Snapshot::fetch(kind, &endpoint, lookups, &Definitions::new())
        .with_context(|| format!("failed to read remote {}", kind.name()))?;
    let definitions = snapshot
        .resources
        .into_iter()
        .filter_map(|remote| match remote.definition {
            Some(definition) => Some((remote.name, definition)),
            None => {
                log::warn!(
                    "{}: skipping '{}', its implementation is not supported",
                    kind.name(),
                    remote.name
                );
                None
            }
        })
        .collect();
    Ok(Collection {
        delete_unmanaged: false,
        definitions,
    })
}
