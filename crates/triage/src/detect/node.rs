//! Node condition detection.

use k8s_openapi::api::core::v1::{Node, NodeCondition};

use super::{missing_status, object_name};
use crate::fault::{ContextKey, FaultRecord, ResourceKind};
use crate::taxonomy::FaultKind;

/// Pressure conditions that are faults when `True`.
const PRESSURE_CONDITIONS: &[(&str, FaultKind)] = &[
    ("MemoryPressure", FaultKind::NodeMemoryPressure),
    ("DiskPressure", FaultKind::NodeDiskPressure),
    ("PIDPressure", FaultKind::NodePidPressure),
    ("NetworkUnavailable", FaultKind::NodeNetworkUnavailable),
];

pub(super) fn detect(node: &Node) -> Vec<FaultRecord> {
    let meta = &node.metadata;
    let Some(status) = node.status.as_ref() else {
        return vec![missing_status(ResourceKind::Node, meta)];
    };
    let name = object_name(meta);
    let taints = node
        .spec
        .as_ref()
        .and_then(|s| s.taints.as_ref())
        .filter(|t| !t.is_empty())
        .map(|taints| {
            taints
                .iter()
                .map(|t| match &t.value {
                    Some(value) => format!("{}={value}:{}", t.key, t.effect),
                    None => format!("{}:{}", t.key, t.effect),
                })
                .collect::<Vec<_>>()
                .join(", ")
        });

    let record = |kind: FaultKind, summary: String, condition: Option<&NodeCondition>| {
        let mut description = kind.description().to_string();
        if let Some(message) = condition.and_then(|c| c.message.as_deref()) {
            description.push('\n');
            description.push_str(message);
        }
        let mut record = FaultRecord::new(kind, ResourceKind::Node, None, name.clone(), summary)
            .with_description(description)
            .with_context(ContextKey::OwnerKind, "Node")
            .with_context(ContextKey::OwnerName, name.clone())
            .with_context(ContextKey::NodeName, name.clone())
            .with_optional_context(ContextKey::Taints, taints.clone());
        if let Some(c) = condition {
            record = record
                .with_context(ContextKey::ConditionType, c.type_.clone())
                .with_optional_context(ContextKey::ConditionReason, c.reason.clone())
                .with_optional_context(ContextKey::ConditionMessage, c.message.clone())
                .with_symptom(format!(
                    "{}={}{}",
                    c.type_,
                    c.status,
                    c.reason
                        .as_deref()
                        .map(|r| format!(" ({r})"))
                        .unwrap_or_default()
                ));
        }
        record
    };

    let conditions = status.conditions.as_deref().unwrap_or_default();
    let mut faults = Vec::new();

    let ready = conditions.iter().find(|c| c.type_ == "Ready");
    if !ready.is_some_and(|c| c.status == "True") {
        let state = ready.map_or("Unknown", |c| c.status.as_str());
        faults.push(record(
            FaultKind::NodeNotReady,
            format!("Node {name} is NotReady (Ready={state})"),
            ready,
        ));
    }

    for (type_, kind) in PRESSURE_CONDITIONS {
        if let Some(c) = conditions
            .iter()
            .find(|c| c.type_ == *type_ && c.status == "True")
        {
            faults.push(record(
                *kind,
                format!("Node {name} reports {type_}"),
                Some(c),
            ));
        }
    }

    if node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false)
    {
        faults.push(
            record(
                FaultKind::NodeUnschedulable,
                format!("Node {name} is cordoned"),
                None,
            )
            .with_symptom("spec.unschedulable=true"),
        );
    }

    faults
}
