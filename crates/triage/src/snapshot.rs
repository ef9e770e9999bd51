//! Resource snapshots as supplied by the cluster collaborator.
//!
//! Snapshots use the upstream `k8s-openapi` object model. Anything that cannot
//! be decoded into a supported kind is kept as [`Snapshot::Unrecognized`] so the
//! detector can still report it.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::SnapshotError;
use crate::fault::ResourceKind;

/// One resource's observed state.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Pod(Box<Pod>),
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
    DaemonSet(Box<DaemonSet>),
    ReplicaSet(Box<ReplicaSet>),
    Node(Box<Node>),
    Job(Box<Job>),
    CronJob(Box<CronJob>),
    /// Unsupported kind or a document that failed to decode
    Unrecognized {
        kind: String,
        namespace: Option<String>,
        name: String,
        reason: String,
    },
}

impl Snapshot {
    /// Decode a raw Kubernetes object, dispatching on its `kind` field.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self::from_kind_and_value(&kind, value)
    }

    /// Decode a raw object as the given kind.
    #[must_use]
    pub fn from_kind_and_value(kind: &str, value: Value) -> Self {
        match ResourceKind::parse(kind) {
            ResourceKind::Pod => decode(kind, value, Self::Pod),
            ResourceKind::Deployment => decode(kind, value, Self::Deployment),
            ResourceKind::StatefulSet => decode(kind, value, Self::StatefulSet),
            ResourceKind::DaemonSet => decode(kind, value, Self::DaemonSet),
            ResourceKind::ReplicaSet => decode(kind, value, Self::ReplicaSet),
            ResourceKind::Node => decode(kind, value, Self::Node),
            ResourceKind::Job => decode(kind, value, Self::Job),
            ResourceKind::CronJob => decode(kind, value, Self::CronJob),
            ResourceKind::Other(_) => {
                let reason = if kind.is_empty() {
                    "object has no kind".to_string()
                } else {
                    format!("unsupported kind {kind}")
                };
                unrecognized(kind, &value, reason)
            }
        }
    }

    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            Self::Pod(_) => ResourceKind::Pod,
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::StatefulSet(_) => ResourceKind::StatefulSet,
            Self::DaemonSet(_) => ResourceKind::DaemonSet,
            Self::ReplicaSet(_) => ResourceKind::ReplicaSet,
            Self::Node(_) => ResourceKind::Node,
            Self::Job(_) => ResourceKind::Job,
            Self::CronJob(_) => ResourceKind::CronJob,
            Self::Unrecognized { kind, .. } => ResourceKind::parse(kind),
        }
    }

    /// Object metadata, if the snapshot decoded.
    #[must_use]
    pub fn metadata(&self) -> Option<&ObjectMeta> {
        match self {
            Self::Pod(o) => Some(&o.metadata),
            Self::Deployment(o) => Some(&o.metadata),
            Self::StatefulSet(o) => Some(&o.metadata),
            Self::DaemonSet(o) => Some(&o.metadata),
            Self::ReplicaSet(o) => Some(&o.metadata),
            Self::Node(o) => Some(&o.metadata),
            Self::Job(o) => Some(&o.metadata),
            Self::CronJob(o) => Some(&o.metadata),
            Self::Unrecognized { .. } => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unrecognized { name, .. } => name,
            _ => self
                .metadata()
                .and_then(|m| m.name.as_deref())
                .unwrap_or("unknown"),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Unrecognized { namespace, .. } => namespace.as_deref(),
            _ => self.metadata().and_then(|m| m.namespace.as_deref()),
        }
    }
}

fn decode<T, F>(kind: &str, value: Value, wrap: F) -> Snapshot
where
    T: DeserializeOwned,
    F: FnOnce(Box<T>) -> Snapshot,
{
    match serde_json::from_value::<T>(value.clone()) {
        Ok(object) => wrap(Box::new(object)),
        Err(e) => {
            debug!("Failed to decode {kind} snapshot: {e}");
            unrecognized(kind, &value, e.to_string())
        }
    }
}

fn unrecognized(kind: &str, value: &Value, reason: String) -> Snapshot {
    let metadata = value.get("metadata");
    Snapshot::Unrecognized {
        kind: kind.to_string(),
        namespace: metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .map(String::from),
        name: metadata
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        reason,
    }
}

/// Parse a snapshot document.
///
/// Accepts a JSON array of objects, a Kubernetes `List` (`{"items": [...]}`),
/// or a single object.
pub fn parse_snapshots(json: &str) -> Result<Vec<Snapshot>, SnapshotError> {
    let document: Value = serde_json::from_str(json)?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert("items".to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    };

    Ok(items.into_iter().map(Snapshot::from_value).collect())
}

/// Load a snapshot document from disk.
pub fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>, SnapshotError> {
    let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshots(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_decodes_pod() {
        let snapshot = Snapshot::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web-1", "namespace": "shop"},
            "status": {"phase": "Running"}
        }));

        assert!(matches!(snapshot, Snapshot::Pod(_)));
        assert_eq!(snapshot.name(), "web-1");
        assert_eq!(snapshot.namespace(), Some("shop"));
        assert_eq!(snapshot.resource_kind(), ResourceKind::Pod);
    }

    #[test]
    fn test_unsupported_kind_is_unrecognized() {
        let snapshot = Snapshot::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": "edge", "namespace": "shop"}
        }));

        match snapshot {
            Snapshot::Unrecognized { kind, name, namespace, .. } => {
                assert_eq!(kind, "Ingress");
                assert_eq!(name, "edge");
                assert_eq!(namespace.as_deref(), Some("shop"));
            }
            other => panic!("expected unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_object_is_unrecognized() {
        let snapshot = Snapshot::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "broken", "namespace": "shop"},
            "status": {"containerStatuses": "not-a-list"}
        }));

        assert!(matches!(snapshot, Snapshot::Unrecognized { .. }));
        assert_eq!(snapshot.name(), "broken");
    }

    #[test]
    fn test_parse_list_document() {
        let doc = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"apiVersion": "v1", "kind": "Node", "metadata": {"name": "worker-1"}},
                {"apiVersion": "batch/v1", "kind": "Job", "metadata": {"name": "backup", "namespace": "ops"}}
            ]
        });

        let snapshots = parse_snapshots(&doc.to_string()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].resource_kind(), ResourceKind::Node);
        assert_eq!(snapshots[1].resource_kind(), ResourceKind::Job);
    }

    #[test]
    fn test_parse_array_and_single_object() {
        let array = json!([
            {"apiVersion": "apps/v1", "kind": "Deployment", "metadata": {"name": "api", "namespace": "shop"}}
        ]);
        assert_eq!(parse_snapshots(&array.to_string()).unwrap().len(), 1);

        let single = json!({"apiVersion": "v1", "kind": "Node", "metadata": {"name": "n1"}});
        let snapshots = parse_snapshots(&single.to_string()).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name(), "n1");
    }

    #[test]
    fn test_parse_invalid_json_errors() {
        assert!(parse_snapshots("{not json").is_err());
    }

    #[test]
    fn test_load_snapshots_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(
            &path,
            r#"[{"apiVersion": "v1", "kind": "Node", "metadata": {"name": "n1"}}]"#,
        )
        .unwrap();

        let snapshots = load_snapshots(&path).unwrap();
        assert_eq!(snapshots.len(), 1);

        let missing = load_snapshots(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(SnapshotError::Read { .. })));
    }
}
