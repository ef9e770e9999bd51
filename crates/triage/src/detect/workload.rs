//! Controller workload detection: Deployments, StatefulSets, DaemonSets, ReplicaSets.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::{format_selector, missing_status, object_name, with_owner, with_resources};
use crate::fault::{ContextKey, FaultRecord, ResourceKind};
use crate::taxonomy::FaultKind;

/// Condition fields common to every apps/v1 condition type.
struct Condition<'a> {
    type_: &'a str,
    status: &'a str,
    reason: Option<&'a str>,
    message: Option<&'a str>,
}

/// Replica counts normalised across workload kinds.
#[derive(Debug, Clone, Copy, Default)]
struct Replicas {
    desired: i32,
    ready: i32,
    available: Option<i32>,
    updated: Option<i32>,
}

fn base_record(
    kind: FaultKind,
    resource_kind: ResourceKind,
    meta: &ObjectMeta,
    summary: String,
    replicas: Replicas,
    template: Option<&PodTemplateSpec>,
) -> FaultRecord {
    let record = FaultRecord::new(
        kind,
        resource_kind.clone(),
        meta.namespace.clone(),
        object_name(meta),
        summary,
    )
    .with_context(ContextKey::DesiredReplicas, replicas.desired.to_string())
    .with_context(ContextKey::ReadyReplicas, replicas.ready.to_string())
    .with_optional_context(
        ContextKey::AvailableReplicas,
        replicas.available.map(|n| n.to_string()),
    )
    .with_optional_context(
        ContextKey::UpdatedReplicas,
        replicas.updated.map(|n| n.to_string()),
    );

    let record = with_owner(record, meta, &resource_kind);
    match template.and_then(|t| t.spec.as_ref()) {
        Some(spec) => with_resources(record, &spec.containers)
            .with_optional_context(
                ContextKey::NodeSelector,
                spec.node_selector.as_ref().and_then(format_selector),
            ),
        None => record,
    }
}

fn with_condition(record: FaultRecord, condition: &Condition<'_>) -> FaultRecord {
    let record = record
        .with_context(ContextKey::ConditionType, condition.type_)
        .with_optional_context(ContextKey::ConditionReason, condition.reason)
        .with_optional_context(ContextKey::ConditionMessage, condition.message);
    match condition.message {
        Some(message) => record.with_symptom(message),
        None => record,
    }
}

fn describe(kind: FaultKind, replicas: Replicas, extra: Option<&str>) -> String {
    let mut description = format!(
        "{}\n{} of {} replicas ready",
        kind.description(),
        replicas.ready,
        replicas.desired
    );
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        description.push('\n');
        description.push_str(extra);
    }
    description
}

pub(super) fn detect_deployment(deployment: &Deployment) -> Vec<FaultRecord> {
    let meta = &deployment.metadata;
    let Some(status) = deployment.status.as_ref() else {
        return vec![missing_status(ResourceKind::Deployment, meta)];
    };
    let spec = deployment.spec.as_ref();
    let replicas = Replicas {
        desired: spec.and_then(|s| s.replicas).unwrap_or(1),
        ready: status.ready_replicas.unwrap_or(0),
        available: Some(status.available_replicas.unwrap_or(0)),
        updated: status.updated_replicas,
    };
    if replicas.desired == 0 {
        return Vec::new();
    }

    let name = object_name(meta);
    let template = spec.map(|s| &s.template);
    let conditions: Vec<Condition<'_>> = status
        .conditions
        .iter()
        .flatten()
        .map(|c| Condition {
            type_: &c.type_,
            status: &c.status,
            reason: c.reason.as_deref(),
            message: c.message.as_deref(),
        })
        .collect();

    let progressing = conditions.iter().find(|c| {
        c.type_ == "Progressing"
            && c.status == "False"
            && c.reason == Some("ProgressDeadlineExceeded")
    });
    if let Some(condition) = progressing {
        let kind = FaultKind::DeploymentProgressDeadline;
        let record = base_record(
            kind,
            ResourceKind::Deployment,
            meta,
            format!("Deployment {name} rollout exceeded its progress deadline"),
            replicas,
            template,
        )
        .with_description(describe(kind, replicas, condition.message));
        return vec![with_condition(record, condition)];
    }

    let unavailable = conditions
        .iter()
        .find(|c| c.type_ == "Available" && c.status == "False");
    if unavailable.is_some() || replicas.available == Some(0) {
        let kind = FaultKind::DeploymentUnavailable;
        let record = base_record(
            kind,
            ResourceKind::Deployment,
            meta,
            format!("Deployment {name} has no available replicas"),
            replicas,
            template,
        )
        .with_description(describe(kind, replicas, unavailable.and_then(|c| c.message)));
        return vec![match unavailable {
            Some(condition) => with_condition(record, condition),
            None => record,
        }];
    }

    if replicas.ready < replicas.desired {
        let kind = FaultKind::ReplicaMismatch;
        let record = base_record(
            kind,
            ResourceKind::Deployment,
            meta,
            format!(
                "Deployment {name} has {}/{} replicas ready",
                replicas.ready, replicas.desired
            ),
            replicas,
            template,
        )
        .with_description(describe(kind, replicas, None));
        return vec![record];
    }

    Vec::new()
}

pub(super) fn detect_stateful_set(sts: &StatefulSet) -> Vec<FaultRecord> {
    let meta = &sts.metadata;
    let Some(status) = sts.status.as_ref() else {
        return vec![missing_status(ResourceKind::StatefulSet, meta)];
    };
    let spec = sts.spec.as_ref();
    let replicas = Replicas {
        desired: spec.and_then(|s| s.replicas).unwrap_or(1),
        ready: status.ready_replicas.unwrap_or(0),
        available: status.available_replicas,
        updated: status.updated_replicas,
    };
    if replicas.ready >= replicas.desired {
        return Vec::new();
    }

    let pvc_names: Vec<String> = spec
        .and_then(|s| s.volume_claim_templates.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|pvc| pvc.metadata.name.clone())
        .collect();

    let kind = FaultKind::StatefulSetNotReady;
    let name = object_name(meta);
    let record = base_record(
        kind,
        ResourceKind::StatefulSet,
        meta,
        format!(
            "StatefulSet {name} has {}/{} replicas ready",
            replicas.ready, replicas.desired
        ),
        replicas,
        spec.map(|s| &s.template),
    )
    .with_description(describe(kind, replicas, None))
    .with_optional_context(
        ContextKey::PvcNames,
        (!pvc_names.is_empty()).then(|| pvc_names.join(", ")),
    );
    vec![record]
}

pub(super) fn detect_daemon_set(ds: &DaemonSet) -> Vec<FaultRecord> {
    let meta = &ds.metadata;
    let Some(status) = ds.status.as_ref() else {
        return vec![missing_status(ResourceKind::DaemonSet, meta)];
    };
    let replicas = Replicas {
        desired: status.desired_number_scheduled,
        ready: status.number_ready,
        available: status.number_available,
        updated: status.updated_number_scheduled,
    };
    let misscheduled = status.number_misscheduled;
    let unavailable = status.number_unavailable.unwrap_or(0);

    if misscheduled == 0 && unavailable == 0 && replicas.ready >= replicas.desired {
        return Vec::new();
    }

    let kind = FaultKind::DaemonSetNotScheduled;
    let name = object_name(meta);
    let mut details = Vec::new();
    if misscheduled > 0 {
        details.push(format!("{misscheduled} pods running on nodes they should not"));
    }
    if unavailable > 0 {
        details.push(format!("{unavailable} pods unavailable"));
    }
    let not_scheduled = status.desired_number_scheduled - status.current_number_scheduled;
    if not_scheduled > 0 {
        details.push(format!("{not_scheduled} nodes have no daemon pod scheduled"));
    }

    let mut record = base_record(
        kind,
        ResourceKind::DaemonSet,
        meta,
        format!(
            "DaemonSet {name} has {}/{} pods ready",
            replicas.ready, replicas.desired
        ),
        replicas,
        ds.spec.as_ref().map(|s| &s.template),
    )
    .with_description(describe(kind, replicas, Some(details.join("\n").as_str())));
    for detail in details {
        record = record.with_symptom(detail);
    }
    vec![record]
}

pub(super) fn detect_replica_set(rs: &ReplicaSet) -> Vec<FaultRecord> {
    let meta = &rs.metadata;
    let Some(status) = rs.status.as_ref() else {
        return vec![missing_status(ResourceKind::ReplicaSet, meta)];
    };
    let spec = rs.spec.as_ref();
    let replicas = Replicas {
        desired: spec.and_then(|s| s.replicas).unwrap_or(1),
        ready: status.ready_replicas.unwrap_or(0),
        available: status.available_replicas,
        updated: None,
    };
    let name = object_name(meta);
    let template = spec.and_then(|s| s.template.as_ref());

    let failure = status
        .conditions
        .iter()
        .flatten()
        .find(|c| c.type_ == "ReplicaFailure" && c.status == "True");
    if let Some(c) = failure {
        let condition = Condition {
            type_: &c.type_,
            status: &c.status,
            reason: c.reason.as_deref(),
            message: c.message.as_deref(),
        };
        let kind = FaultKind::ReplicaFailure;
        let record = base_record(
            kind,
            ResourceKind::ReplicaSet,
            meta,
            format!("ReplicaSet {name} failed to create pods"),
            replicas,
            template,
        )
        .with_description(describe(kind, replicas, condition.message));
        return vec![with_condition(record, &condition)];
    }

    if replicas.ready < replicas.desired {
        let kind = FaultKind::ReplicaMismatch;
        let record = base_record(
            kind,
            ResourceKind::ReplicaSet,
            meta,
            format!(
                "ReplicaSet {name} has {}/{} replicas ready",
                replicas.ready, replicas.desired
            ),
            replicas,
            template,
        )
        .with_description(describe(kind, replicas, None));
        return vec![record];
    }

    Vec::new()
}
