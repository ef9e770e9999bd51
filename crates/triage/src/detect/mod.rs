//! Fault detection.
//!
//! Maps one resource snapshot to zero or more [`FaultRecord`]s. Detection is
//! pure and total: it never fails, and any state it does not understand is
//! reported as [`FaultKind::Unknown`].

mod batch;
mod node;
mod pod;
mod workload;

use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::fault::{ContextKey, FaultRecord, ResourceKind};
use crate::snapshot::Snapshot;
use crate::taxonomy::FaultKind;

/// Restart count above which a running container is flagged
pub const RESTART_THRESHOLD: i32 = 5;

/// Detect faults in a single snapshot.
#[must_use]
pub fn detect(snapshot: &Snapshot) -> Vec<FaultRecord> {
    match snapshot {
        Snapshot::Pod(pod) => pod::detect(pod),
        Snapshot::Deployment(deployment) => workload::detect_deployment(deployment),
        Snapshot::StatefulSet(sts) => workload::detect_stateful_set(sts),
        Snapshot::DaemonSet(ds) => workload::detect_daemon_set(ds),
        Snapshot::ReplicaSet(rs) => workload::detect_replica_set(rs),
        Snapshot::Node(node) => node::detect(node),
        Snapshot::Job(job) => batch::detect_job(job),
        Snapshot::CronJob(cron_job) => batch::detect_cron_job(cron_job),
        Snapshot::Unrecognized {
            kind,
            namespace,
            name,
            reason,
        } => vec![FaultRecord::new(
            FaultKind::Unknown,
            ResourceKind::parse(kind),
            namespace.clone(),
            name.clone(),
            format!("Unrecognized state for {} {name}", display_kind(kind)),
        )
        .with_description(format!("{}\n{reason}", FaultKind::Unknown.description()))
        .with_symptom(reason.clone())],
    }
}

/// Detect faults in a raw Kubernetes object of the given kind.
#[must_use]
pub fn detect_value(kind: &str, value: Value) -> Vec<FaultRecord> {
    detect(&Snapshot::from_kind_and_value(kind, value))
}

/// Detect faults across a batch of snapshots, preserving snapshot order.
#[must_use]
pub fn detect_all(snapshots: &[Snapshot]) -> Vec<FaultRecord> {
    snapshots.iter().flat_map(detect).collect()
}

fn display_kind(kind: &str) -> &str {
    if kind.is_empty() {
        "resource"
    } else {
        kind
    }
}

/// Record for a resource whose status block is missing entirely.
fn missing_status(kind: ResourceKind, meta: &ObjectMeta) -> FaultRecord {
    let name = object_name(meta);
    FaultRecord::new(
        FaultKind::Unknown,
        kind.clone(),
        meta.namespace.clone(),
        name.clone(),
        format!("{kind} {name} reports no status"),
    )
    .with_description(format!(
        "{}\nThe {kind} has no status block; the controller may not have observed it yet.",
        FaultKind::Unknown.description()
    ))
}

fn object_name(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_else(|| "unknown".to_string())
}

/// Resolve the controlling owner of an object.
///
/// Pods created by a Deployment are owned by a ReplicaSet whose name carries
/// the `pod-template-hash`; those are attributed to the Deployment instead.
fn resolve_owner(meta: &ObjectMeta) -> Option<(String, String)> {
    let refs = meta.owner_references.as_ref()?;
    let owner = refs
        .iter()
        .find(|r| r.controller == Some(true))
        .or_else(|| refs.first())?;

    if owner.kind == "ReplicaSet" {
        let hash = meta
            .labels
            .as_ref()
            .and_then(|labels| labels.get("pod-template-hash"));
        if let Some(hash) = hash {
            if let Some(deployment) = owner.name.strip_suffix(&format!("-{hash}")) {
                return Some(("Deployment".to_string(), deployment.to_string()));
            }
        }
    }

    Some((owner.kind.clone(), owner.name.clone()))
}

/// Attach owner context, falling back to the resource itself.
fn with_owner(record: FaultRecord, meta: &ObjectMeta, self_kind: &ResourceKind) -> FaultRecord {
    let (kind, name) =
        resolve_owner(meta).unwrap_or_else(|| (self_kind.to_string(), object_name(meta)));
    record
        .with_context(ContextKey::OwnerKind, kind)
        .with_context(ContextKey::OwnerName, name)
}

/// Render a resource quantity map entry (`cpu`, `memory`) across containers.
///
/// Single-container specs render the bare value, multi-container specs render
/// `name=value` pairs.
fn container_quantities(containers: &[Container], resource: &str, limits: bool) -> Option<String> {
    let values: Vec<(String, &Quantity)> = containers
        .iter()
        .filter_map(|c| {
            let requirements = c.resources.as_ref()?;
            let map = if limits {
                requirements.limits.as_ref()
            } else {
                requirements.requests.as_ref()
            }?;
            map.get(resource).map(|q| (c.name.clone(), q))
        })
        .collect();

    match values.as_slice() {
        [] => None,
        [(_, q)] if containers.len() == 1 => Some(q.0.clone()),
        many => Some(
            many.iter()
                .map(|(name, q)| format!("{name}={}", q.0))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

/// Attach CPU/memory requests and limits for the given containers.
fn with_resources(record: FaultRecord, containers: &[Container]) -> FaultRecord {
    record
        .with_optional_context(
            ContextKey::CpuRequest,
            container_quantities(containers, "cpu", false),
        )
        .with_optional_context(
            ContextKey::CpuLimit,
            container_quantities(containers, "cpu", true),
        )
        .with_optional_context(
            ContextKey::MemoryRequest,
            container_quantities(containers, "memory", false),
        )
        .with_optional_context(
            ContextKey::MemoryLimit,
            container_quantities(containers, "memory", true),
        )
}

fn format_selector(selector: &BTreeMap<String, String>) -> Option<String> {
    if selector.is_empty() {
        return None;
    }
    Some(
        selector
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Render any serializable scalar (timestamps in particular) as its JSON string form.
pub(crate) fn render<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value).ok()? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
