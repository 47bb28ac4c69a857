//! Execution engine - issues the calls a plan describes

use crate::collection::Collection;
use crate::context::{Endpoint, LookupSource};
use crate::planner::{Action, Plan, plan};
use crate::resource::ResourceKind;
use crate::snapshot::Snapshot;
use crate::types::{ExecuteSummary, ReconcileOptions};
use anyhow::{Context, Result};

/// Execute a plan against an endpoint
///
/// Actions run sequentially in plan order. The first failing call aborts the
/// run; calls already made are not rolled back.
pub fn execute(plan: &Plan, endpoint: &dyn Endpoint) -> Result<ExecuteSummary> {
    let mut summary = ExecuteSummary::default();
    for action in &plan.actions {
        let def_tree = plan.definition_tree(action.name());
        match action {
            Action::Create { name, payload } => {
                let created = endpoint
                    .create(payload)
                    .with_context(|| format!("{def_tree}: failed to create"))?;
                log::debug!(
                    "{}: created '{name}' with id {}",
                    plan.kind,
                    created.get("id").map_or_else(|| "?".to_string(), ToString::to_string)
                );
                summary.created += 1;
            }
            Action::Update {
                name, id, payload, ..
            } => {
                endpoint
                    .update(*id, payload)
                    .with_context(|| format!("{def_tree}: failed to update"))?;
                log::debug!("{}: updated '{name}' (id {id})", plan.kind);
                summary.modified += 1;
            }
            Action::Delete { name, id } => {
                endpoint
                    .delete(*id)
                    .with_context(|| format!("{def_tree}: failed to delete"))?;
                log::debug!("{}: deleted '{name}' (id {id})", plan.kind);
                summary.removed += 1;
            }
            Action::Unmanaged { .. } => summary.unmanaged += 1,
            Action::Unchanged { .. } => summary.unchanged += 1,
        }
    }
    Ok(summary)
}

/// Outcome of reconciling one collection
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub plan: Plan,
    /// What was done, or what would have been done on a dry run.
    pub summary: ExecuteSummary,
}

impl Reconciled {
    /// Whether remote state changed, or would have.
    pub fn changed(&self) -> bool {
        self.summary.changed()
    }
}

/// Fetch, plan and (unless dry running) execute one collection.
pub fn reconcile<K: ResourceKind>(
    kind: &K,
    tree: &str,
    collection: &Collection<K::Definition>,
    endpoint: &dyn Endpoint,
    lookups: &dyn LookupSource,
    options: ReconcileOptions,
) -> Result<Reconciled> {
    let snapshot = Snapshot::fetch(kind, endpoint, lookups, &collection.definitions)?;
    let plan = plan(kind, tree, collection, &snapshot)?;
    let summary = if options.dry_run {
        plan.summary()
    } else {
        execute(&plan, endpoint)?
    };
    Ok(Reconciled { plan, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Definitions;
    use crate::context::testing::{MemoryEndpoint, Request, StaticLookups};
    use crate::lookup::LookupTable;
    use crate::resource::testing::{Client, Clients};
    use serde_json::{Value, json};

    const TREE: &str = "prowlarr.settings.download_clients";

    fn remote(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "implementation": "Deluge",
            "enable": true,
            "tags": [],
            "fields": [{"name": "host", "value": "localhost"}]
        })
    }

    fn deluge(host: &str) -> Client {
        Client::Deluge {
            enable: true,
            tags: vec![],
            host: host.to_string(),
        }
    }

    fn collection(definitions: Vec<(&str, Client)>, delete_unmanaged: bool) -> Collection<Client> {
        Collection {
            delete_unmanaged,
            definitions: definitions
                .into_iter()
                .map(|(n, d)| (n.to_string(), d))
                .collect::<Definitions<_>>(),
        }
    }

    fn run(
        endpoint: &MemoryEndpoint,
        collection: &Collection<Client>,
        dry_run: bool,
    ) -> Result<Reconciled> {
        let lookups = StaticLookups::new(vec![LookupTable::new("tags")]);
        reconcile(
            &Clients,
            TREE,
            collection,
            endpoint,
            &lookups,
            ReconcileOptions { dry_run },
        )
    }

    fn schemas() -> Vec<Value> {
        vec![json!({"implementation": "Deluge", "enable": false, "tags": [], "fields": []})]
    }

    #[test]
    fn test_execute_empty_plan() {
        let endpoint = MemoryEndpoint::new(vec![], vec![]);
        let result = run(&endpoint, &Collection::default(), false).unwrap();
        assert_eq!(result.summary.total(), 0);
        assert!(!result.changed());
    }

    #[test]
    fn test_execute_no_changes() {
        let endpoint = MemoryEndpoint::new(vec![remote(1, "Deluge")], vec![]);
        let result = run(&endpoint, &collection(vec![("Deluge", deluge("localhost"))], false), false)
            .unwrap();
        assert_eq!(result.summary.unchanged, 1);
        assert!(endpoint.requests.borrow().is_empty());
    }

    #[test]
    fn test_execute_with_changes() {
        let endpoint = MemoryEndpoint::new(vec![remote(1, "Deluge"), remote(2, "Stale")], schemas());
        let desired = collection(
            vec![("Deluge", deluge("deluge")), ("New", deluge("new"))],
            true,
        );
        let result = run(&endpoint, &desired, false).unwrap();
        assert_eq!(result.summary.modified, 1);
        assert_eq!(result.summary.created, 1);
        assert_eq!(result.summary.removed, 1);

        let requests = endpoint.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert!(matches!(requests[0], Request::Update(1, _)));
        assert!(matches!(requests[1], Request::Create(_)));
        assert_eq!(requests[2], Request::Delete(2));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let endpoint = MemoryEndpoint::new(vec![remote(1, "Deluge")], schemas());
        let desired = collection(
            vec![("Deluge", deluge("deluge")), ("New", deluge("new"))],
            false,
        );
        assert!(run(&endpoint, &desired, false).unwrap().changed());
        endpoint.requests.borrow_mut().clear();

        let second = run(&endpoint, &desired, false).unwrap();
        assert!(!second.changed());
        assert!(endpoint.requests.borrow().is_empty());
    }

    #[test]
    fn test_dry_run_makes_no_calls() {
        let endpoint = MemoryEndpoint::new(vec![remote(1, "Deluge")], schemas());
        let desired = collection(vec![("Deluge", deluge("deluge"))], true);
        let result = run(&endpoint, &desired, true).unwrap();
        assert!(result.changed());
        assert_eq!(result.summary.modified, 1);
        assert!(endpoint.requests.borrow().is_empty());
    }
}
