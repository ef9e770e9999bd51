//! Fault records and their typed context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::taxonomy::{FaultKind, Severity};

/// Kubernetes resource kinds the detector understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Node,
    Job,
    CronJob,
    /// Any kind without a detector. Only ever paired with `FaultKind::Unknown`.
    Other(String),
}

impl ResourceKind {
    /// Parse a Kubernetes `kind` string. Unsupported kinds map to `Other`.
    #[must_use]
    pub fn parse(kind: &str) -> Self {
        match kind {
            "Pod" => Self::Pod,
            "Deployment" => Self::Deployment,
            "StatefulSet" => Self::StatefulSet,
            "DaemonSet" => Self::DaemonSet,
            "ReplicaSet" => Self::ReplicaSet,
            "Node" => Self::Node,
            "Job" => Self::Job,
            "CronJob" => Self::CronJob,
            other => Self::Other(other.to_string()),
        }
    }

    /// The Kubernetes `kind` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::ReplicaSet => "ReplicaSet",
            Self::Node => "Node",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Other(kind) => kind,
        }
    }

    /// Whether resources of this kind live in a namespace.
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::Node)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys that may appear in a fault's context.
///
/// Closed set so the prompt builder can emit context through a declarative
/// table instead of ad-hoc lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKey {
    IssueCategory,
    OwnerKind,
    OwnerName,
    ClusterId,
    ContainerName,
    Image,
    ExitCode,
    TerminationReason,
    TerminationMessage,
    WaitingReason,
    WaitingMessage,
    RestartCount,
    PodPhase,
    PodReason,
    NodeName,
    ConditionType,
    ConditionReason,
    ConditionMessage,
    PvcNames,
    CpuRequest,
    CpuLimit,
    MemoryRequest,
    MemoryLimit,
    DesiredReplicas,
    ReadyReplicas,
    AvailableReplicas,
    UpdatedReplicas,
    Taints,
    NodeSelector,
    BackoffLimit,
    FailedPods,
    Schedule,
    LastScheduleTime,
    LastSuccessfulTime,
}

impl ContextKey {
    /// Stable wire name (camelCase).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::IssueCategory => "issueCategory",
            Self::OwnerKind => "ownerKind",
            Self::OwnerName => "ownerName",
            Self::ClusterId => "clusterId",
            Self::ContainerName => "containerName",
            Self::Image => "image",
            Self::ExitCode => "exitCode",
            Self::TerminationReason => "terminationReason",
            Self::TerminationMessage => "terminationMessage",
            Self::WaitingReason => "waitingReason",
            Self::WaitingMessage => "waitingMessage",
            Self::RestartCount => "restartCount",
            Self::PodPhase => "podPhase",
            Self::PodReason => "podReason",
            Self::NodeName => "nodeName",
            Self::ConditionType => "conditionType",
            Self::ConditionReason => "conditionReason",
            Self::ConditionMessage => "conditionMessage",
            Self::PvcNames => "pvcNames",
            Self::CpuRequest => "cpuRequest",
            Self::CpuLimit => "cpuLimit",
            Self::MemoryRequest => "memoryRequest",
            Self::MemoryLimit => "memoryLimit",
            Self::DesiredReplicas => "desiredReplicas",
            Self::ReadyReplicas => "readyReplicas",
            Self::AvailableReplicas => "availableReplicas",
            Self::UpdatedReplicas => "updatedReplicas",
            Self::Taints => "taints",
            Self::NodeSelector => "nodeSelector",
            Self::BackoffLimit => "backoffLimit",
            Self::FailedPods => "failedPods",
            Self::Schedule => "schedule",
            Self::LastScheduleTime => "lastScheduleTime",
            Self::LastSuccessfulTime => "lastSuccessfulTime",
        }
    }

    /// Label used when the key is rendered for humans or prompts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::IssueCategory => "Issue Category",
            Self::OwnerKind => "Owner Kind",
            Self::OwnerName => "Owner Name",
            Self::ClusterId => "Cluster",
            Self::ContainerName => "Container",
            Self::Image => "Image",
            Self::ExitCode => "Exit Code",
            Self::TerminationReason => "Termination Reason",
            Self::TerminationMessage => "Termination Message",
            Self::WaitingReason => "Waiting Reason",
            Self::WaitingMessage => "Waiting Message",
            Self::RestartCount => "Restart Count",
            Self::PodPhase => "Pod Phase",
            Self::PodReason => "Pod Reason",
            Self::NodeName => "Node",
            Self::ConditionType => "Condition",
            Self::ConditionReason => "Condition Reason",
            Self::ConditionMessage => "Condition Message",
            Self::PvcNames => "PVCs",
            Self::CpuRequest => "CPU Request",
            Self::CpuLimit => "CPU Limit",
            Self::MemoryRequest => "Memory Request",
            Self::MemoryLimit => "Memory Limit",
            Self::DesiredReplicas => "Desired Replicas",
            Self::ReadyReplicas => "Ready Replicas",
            Self::AvailableReplicas => "Available Replicas",
            Self::UpdatedReplicas => "Updated Replicas",
            Self::Taints => "Taints",
            Self::NodeSelector => "Node Selector",
            Self::BackoffLimit => "Backoff Limit",
            Self::FailedPods => "Failed Pods",
            Self::Schedule => "Schedule",
            Self::LastScheduleTime => "Last Schedule",
            Self::LastSuccessfulTime => "Last Success",
        }
    }
}

/// Typed context attached to a fault record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultContext(BTreeMap<ContextKey, String>);

impl FaultContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: ContextKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: ContextKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Set a value. Empty values are ignored.
    pub fn insert(&mut self, key: ContextKey, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContextKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single detected abnormality on one resource.
///
/// Records are built once by the detector and treated as immutable afterwards.
/// Use [`FaultRecord::derive_with`] to get a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub severity: Severity,
    pub resource_kind: ResourceKind,
    pub namespace: Option<String>,
    pub resource_name: String,
    /// One-line summary
    pub summary: String,
    /// Multi-line description
    pub description: String,
    pub symptoms: Vec<String>,
    pub context: FaultContext,
    pub detected_at: DateTime<Utc>,
}

impl FaultRecord {
    /// Create a record. Severity is copied from the kind.
    #[must_use]
    pub fn new(
        kind: FaultKind,
        resource_kind: ResourceKind,
        namespace: Option<String>,
        resource_name: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            resource_kind,
            namespace,
            resource_name: resource_name.into(),
            summary: summary.into(),
            description: String::new(),
            symptoms: Vec::new(),
            context: FaultContext::new(),
            detected_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_symptom(mut self, symptom: impl Into<String>) -> Self {
        let symptom = symptom.into();
        if !symptom.is_empty() {
            self.symptoms.push(symptom);
        }
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: ContextKey, value: impl Into<String>) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Same as [`with_context`](Self::with_context) but only sets present values.
    #[must_use]
    pub fn with_optional_context<V: Into<String>>(self, key: ContextKey, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_context(key, v),
            None => self,
        }
    }

    #[must_use]
    pub fn detected_at(mut self, at: DateTime<Utc>) -> Self {
        self.detected_at = at;
        self
    }

    /// Derive a new record with one context value set, leaving `self` untouched.
    #[must_use]
    pub fn derive_with(&self, key: ContextKey, value: impl Into<String>) -> Self {
        self.clone().with_context(key, value)
    }

    /// Derive a new record tagged with the cluster it was detected in.
    #[must_use]
    pub fn with_cluster_id(&self, cluster_id: &str) -> Self {
        self.derive_with(ContextKey::ClusterId, cluster_id)
    }

    /// `namespace/name`, or just `name` for cluster-scoped resources.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.resource_name),
            None => self.resource_name.clone(),
        }
    }

    /// Owner kind from context, defaulting to the resource's own kind.
    #[must_use]
    pub fn owner_kind(&self) -> &str {
        self.context
            .get(ContextKey::OwnerKind)
            .unwrap_or_else(|| self.resource_kind.as_str())
    }

    /// Owner name from context, defaulting to the resource's own name.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        self.context
            .get(ContextKey::OwnerName)
            .unwrap_or(&self.resource_name)
    }
}
