//! Fault taxonomy.
//!
//! Defines the closed set of fault kinds the detector can emit together with
//! their stable codes, descriptions and severities. Everything downstream
//! (correlation, fingerprinting, prompt rules, fallback remediation) dispatches
//! on these types with exhaustive matches.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Severity of a detected fault.
///
/// Ordering is defined by [`Severity::rank`], not by declaration order:
/// `Critical` is the most severe and compares as the smallest value, so sorting
/// ascending puts the worst faults first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Ordinal rank (0 = most severe).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Whether this severity is at least as severe as `threshold`.
    #[must_use]
    pub fn is_at_least(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }

    /// Lowercase name for logging/labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Classification of detected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    // Container failures
    /// Container killed by the kernel OOM killer
    OomKilled,
    /// Container repeatedly crashing and backing off
    CrashLoopBackOff,
    /// Image pull failing with back-off
    ImagePullBackOff,
    /// Image pull failed
    ErrImagePull,
    /// Image reference cannot be parsed
    InvalidImageName,
    /// Referenced ConfigMap/Secret/key missing
    CreateContainerConfigError,
    /// Runtime could not create the container
    CreateContainerError,
    /// Container exited with a non-zero code
    ContainerError,
    /// Connection-level failures reported by the container
    NetworkError,
    /// Liveness probe failing
    LivenessProbeFailed,
    /// Readiness probe failing
    ReadinessProbeFailed,
    /// Running container with an unusual number of restarts
    HighRestartCount,

    // Pod lifecycle
    /// Pod stuck in Pending
    PodPending,
    /// Pod evicted by the kubelet
    PodEvicted,
    /// Pod in Failed phase
    PodFailed,

    // Workload controllers
    /// Deployment has no available replicas
    DeploymentUnavailable,
    /// Deployment rollout exceeded its progress deadline
    DeploymentProgressDeadline,
    /// Ready replicas below desired
    ReplicaMismatch,
    /// ReplicaSet could not create pods
    ReplicaFailure,
    /// StatefulSet replicas not ready
    #[serde(rename = "STATEFULSET_NOT_READY")]
    StatefulSetNotReady,
    /// DaemonSet pods missing or misscheduled
    #[serde(rename = "DAEMONSET_NOT_SCHEDULED")]
    DaemonSetNotScheduled,

    // Nodes
    /// Node not Ready
    NodeNotReady,
    /// Node under memory pressure
    NodeMemoryPressure,
    /// Node under disk pressure
    NodeDiskPressure,
    /// Node under PID pressure
    NodePidPressure,
    /// Node network not configured
    NodeNetworkUnavailable,
    /// Node cordoned
    NodeUnschedulable,

    // Batch
    /// Job failed
    JobFailed,
    /// Job exhausted its retry budget
    JobBackoffLimitExceeded,
    /// Job exceeded activeDeadlineSeconds
    JobDeadlineExceeded,
    /// CronJob's most recent run did not succeed
    #[serde(rename = "CRONJOB_LAST_RUN_FAILED")]
    CronJobLastRunFailed,
    /// CronJob suspended
    #[serde(rename = "CRONJOB_SUSPENDED")]
    CronJobSuspended,

    /// Unrecognized or malformed state
    Unknown,
}

impl FaultKind {
    /// Every kind, in declaration order.
    pub const ALL: [FaultKind; 33] = [
        Self::OomKilled,
        Self::CrashLoopBackOff,
        Self::ImagePullBackOff,
        Self::ErrImagePull,
        Self::InvalidImageName,
        Self::CreateContainerConfigError,
        Self::CreateContainerError,
        Self::ContainerError,
        Self::NetworkError,
        Self::LivenessProbeFailed,
        Self::ReadinessProbeFailed,
        Self::HighRestartCount,
        Self::PodPending,
        Self::PodEvicted,
        Self::PodFailed,
        Self::DeploymentUnavailable,
        Self::DeploymentProgressDeadline,
        Self::ReplicaMismatch,
        Self::ReplicaFailure,
        Self::StatefulSetNotReady,
        Self::DaemonSetNotScheduled,
        Self::NodeNotReady,
        Self::NodeMemoryPressure,
        Self::NodeDiskPressure,
        Self::NodePidPressure,
        Self::NodeNetworkUnavailable,
        Self::NodeUnschedulable,
        Self::JobFailed,
        Self::JobBackoffLimitExceeded,
        Self::JobDeadlineExceeded,
        Self::CronJobLastRunFailed,
        Self::CronJobSuspended,
        Self::Unknown,
    ];

    /// Stable code used in fingerprints and prompts.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::OomKilled => "OOM_KILLED",
            Self::CrashLoopBackOff => "CRASH_LOOP_BACK_OFF",
            Self::ImagePullBackOff => "IMAGE_PULL_BACK_OFF",
            Self::ErrImagePull => "ERR_IMAGE_PULL",
            Self::InvalidImageName => "INVALID_IMAGE_NAME",
            Self::CreateContainerConfigError => "CREATE_CONTAINER_CONFIG_ERROR",
            Self::CreateContainerError => "CREATE_CONTAINER_ERROR",
            Self::ContainerError => "CONTAINER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::LivenessProbeFailed => "LIVENESS_PROBE_FAILED",
            Self::ReadinessProbeFailed => "READINESS_PROBE_FAILED",
            Self::HighRestartCount => "HIGH_RESTART_COUNT",
            Self::PodPending => "POD_PENDING",
            Self::PodEvicted => "POD_EVICTED",
            Self::PodFailed => "POD_FAILED",
            Self::DeploymentUnavailable => "DEPLOYMENT_UNAVAILABLE",
            Self::DeploymentProgressDeadline => "DEPLOYMENT_PROGRESS_DEADLINE",
            Self::ReplicaMismatch => "REPLICA_MISMATCH",
            Self::ReplicaFailure => "REPLICA_FAILURE",
            Self::StatefulSetNotReady => "STATEFULSET_NOT_READY",
            Self::DaemonSetNotScheduled => "DAEMONSET_NOT_SCHEDULED",
            Self::NodeNotReady => "NODE_NOT_READY",
            Self::NodeMemoryPressure => "NODE_MEMORY_PRESSURE",
            Self::NodeDiskPressure => "NODE_DISK_PRESSURE",
            Self::NodePidPressure => "NODE_PID_PRESSURE",
            Self::NodeNetworkUnavailable => "NODE_NETWORK_UNAVAILABLE",
            Self::NodeUnschedulable => "NODE_UNSCHEDULABLE",
            Self::JobFailed => "JOB_FAILED",
            Self::JobBackoffLimitExceeded => "JOB_BACKOFF_LIMIT_EXCEEDED",
            Self::JobDeadlineExceeded => "JOB_DEADLINE_EXCEEDED",
            Self::CronJobLastRunFailed => "CRONJOB_LAST_RUN_FAILED",
            Self::CronJobSuspended => "CRONJOB_SUSPENDED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::OomKilled => "Container was killed after exceeding its memory limit",
            Self::CrashLoopBackOff => "Container keeps crashing and Kubernetes is backing off restarts",
            Self::ImagePullBackOff => "Container image cannot be pulled; kubelet is backing off",
            Self::ErrImagePull => "Container image pull failed",
            Self::InvalidImageName => "Container image reference is invalid",
            Self::CreateContainerConfigError => {
                "Container configuration references a missing ConfigMap, Secret or key"
            }
            Self::CreateContainerError => "Container runtime failed to create the container",
            Self::ContainerError => "Container terminated with a non-zero exit code",
            Self::NetworkError => "Container reports network connectivity failures",
            Self::LivenessProbeFailed => "Liveness probe is failing and the container is being restarted",
            Self::ReadinessProbeFailed => "Readiness probe is failing; pod receives no traffic",
            Self::HighRestartCount => "Container has restarted an unusual number of times",
            Self::PodPending => "Pod cannot be scheduled or started",
            Self::PodEvicted => "Pod was evicted by the kubelet",
            Self::PodFailed => "Pod terminated in the Failed phase",
            Self::DeploymentUnavailable => "Deployment has no available replicas",
            Self::DeploymentProgressDeadline => "Deployment rollout exceeded its progress deadline",
            Self::ReplicaMismatch => "Ready replicas are below the desired count",
            Self::ReplicaFailure => "ReplicaSet failed to create pods",
            Self::StatefulSetNotReady => "StatefulSet replicas are not ready",
            Self::DaemonSetNotScheduled => "DaemonSet pods are missing or misscheduled",
            Self::NodeNotReady => "Node is not Ready",
            Self::NodeMemoryPressure => "Node is under memory pressure",
            Self::NodeDiskPressure => "Node is under disk pressure",
            Self::NodePidPressure => "Node is running out of process IDs",
            Self::NodeNetworkUnavailable => "Node network is unavailable",
            Self::NodeUnschedulable => "Node is cordoned and accepts no new pods",
            Self::JobFailed => "Job failed",
            Self::JobBackoffLimitExceeded => "Job exceeded its backoff limit",
            Self::JobDeadlineExceeded => "Job exceeded its active deadline",
            Self::CronJobLastRunFailed => "CronJob's most recent run did not complete successfully",
            Self::CronJobSuspended => "CronJob is suspended",
            Self::Unknown => "Unrecognized resource state",
        }
    }

    /// Severity assigned to this kind.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::OomKilled
            | Self::CrashLoopBackOff
            | Self::NodeNotReady
            | Self::NodeNetworkUnavailable
            | Self::DeploymentUnavailable => Severity::Critical,

            Self::ImagePullBackOff
            | Self::ErrImagePull
            | Self::CreateContainerConfigError
            | Self::CreateContainerError
            | Self::ContainerError
            | Self::PodPending
            | Self::PodFailed
            | Self::DeploymentProgressDeadline
            | Self::ReplicaFailure
            | Self::StatefulSetNotReady
            | Self::NodeMemoryPressure
            | Self::NodeDiskPressure
            | Self::JobFailed
            | Self::JobBackoffLimitExceeded
            | Self::JobDeadlineExceeded => Severity::High,

            Self::InvalidImageName
            | Self::NetworkError
            | Self::LivenessProbeFailed
            | Self::ReadinessProbeFailed
            | Self::HighRestartCount
            | Self::PodEvicted
            | Self::ReplicaMismatch
            | Self::DaemonSetNotScheduled
            | Self::NodePidPressure
            | Self::CronJobLastRunFailed => Severity::Medium,

            Self::NodeUnschedulable | Self::CronJobSuspended | Self::Unknown => Severity::Low,
        }
    }

    /// Whether the remediation for this kind is ambiguous enough to warrant
    /// exploratory sampling.
    #[must_use]
    pub fn is_exploratory(self) -> bool {
        matches!(
            self,
            Self::NetworkError
                | Self::Unknown
                | Self::LivenessProbeFailed
                | Self::ReadinessProbeFailed
        )
    }

    /// Look up a kind by its stable code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
