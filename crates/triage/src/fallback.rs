//! Static remediation used when no completion is available.
//!
//! Every fault kind maps to a fixed root cause and two to four ordered steps,
//! so a diagnosis can always be produced offline.

use serde::Serialize;

use crate::fault::{ContextKey, FaultRecord};
use crate::taxonomy::FaultKind;

/// Remediation produced without the completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackDiagnosis {
    pub root_cause: String,
    pub diagnosis: String,
    pub solutions: Vec<String>,
    pub preventions: Vec<String>,
}

struct Guidance {
    root_cause: &'static str,
    solutions: &'static [&'static str],
    preventions: &'static [&'static str],
}

const GENERIC: Guidance = Guidance {
    root_cause: "The resource is in an unexpected state",
    solutions: &[
        "Inspect the resource with kubectl describe and review its recent events",
        "Check the logs of the affected containers for errors",
        "Compare the current spec with the last known good revision",
    ],
    preventions: &["Alert on resource status changes before they affect users"],
};

fn guidance(kind: FaultKind) -> Guidance {
    match kind {
        FaultKind::OomKilled => Guidance {
            root_cause: "The container exceeded its memory limit and was killed by the kernel",
            solutions: &[
                "Review actual memory usage with kubectl top pod and compare it with the configured limit",
                "Raise resources.limits.memory on the owning workload to cover peak usage plus headroom",
                "Check the application for memory leaks or unbounded caches and cap its heap or buffers",
            ],
            preventions: &[
                "Set memory requests and limits from observed usage",
                "Alert when memory usage exceeds 80% of the limit",
            ],
        },
        FaultKind::CrashLoopBackOff => Guidance {
            root_cause: "The container exits shortly after starting and is being restarted with back-off",
            solutions: &[
                "Read the logs of the previous run with kubectl logs --previous",
                "Verify the command, arguments and required environment variables",
                "Confirm that dependent services and mounted configuration are available",
            ],
            preventions: &["Validate configuration and startup in a staging environment before rollout"],
        },
        FaultKind::ImagePullBackOff | FaultKind::ErrImagePull => Guidance {
            root_cause: "The container image cannot be pulled from its registry",
            solutions: &[
                "Verify that the image name and tag exist in the registry",
                "Check imagePullSecrets and registry credentials for the namespace",
                "Confirm that nodes can reach the registry over the network",
            ],
            preventions: &["Pin images to tags or digests produced by the build pipeline"],
        },
        FaultKind::InvalidImageName => Guidance {
            root_cause: "The image reference is not a valid image name",
            solutions: &[
                "Correct the image field to the registry/repository:tag format",
                "Redeploy the workload with the corrected image reference",
            ],
            preventions: &["Lint manifests for image reference format in CI"],
        },
        FaultKind::CreateContainerConfigError => Guidance {
            root_cause: "The container configuration references a missing Secret or ConfigMap",
            solutions: &[
                "List the Secrets and ConfigMaps referenced by the pod and check that each exists",
                "Create the missing object or fix the key referenced by the environment or volume",
                "Restart the pod once the referenced objects exist",
            ],
            preventions: &["Deploy configuration objects before the workloads that reference them"],
        },
        FaultKind::CreateContainerError => Guidance {
            root_cause: "The container runtime failed to create the container",
            solutions: &[
                "Describe the pod and read the runtime error in its events",
                "Check volume mounts, security context and the container command",
                "Inspect the node runtime with crictl if the error is not visible from the API",
            ],
            preventions: &["Test security context and mount changes in staging"],
        },
        FaultKind::ContainerError => Guidance {
            root_cause: "The container terminated with a non-zero exit code",
            solutions: &[
                "Read the container logs around the time of termination",
                "Look up the meaning of the exit code for the application",
                "Fix the failing code path or configuration and redeploy",
            ],
            preventions: &["Add startup and smoke tests that exercise the failing path"],
        },
        FaultKind::NetworkError => Guidance {
            root_cause: "The container failed while connecting to a network dependency",
            solutions: &[
                "Verify that the target Service exists and has ready endpoints",
                "Check DNS resolution from inside the pod",
                "Review NetworkPolicies that may block the connection",
            ],
            preventions: &[
                "Retry dependency connections with back-off during startup",
                "Monitor endpoint availability of critical services",
            ],
        },
        FaultKind::LivenessProbeFailed => Guidance {
            root_cause: "The liveness probe failed and the kubelet restarted the container",
            solutions: &[
                "Check that the probe path, port and command match the application",
                "Increase initialDelaySeconds or timeoutSeconds if the application starts or answers slowly",
                "Investigate application hangs or resource starvation during the probe window",
            ],
            preventions: &["Use a startupProbe for slow-starting applications"],
        },
        FaultKind::ReadinessProbeFailed => Guidance {
            root_cause: "The readiness probe is failing so the pod receives no traffic",
            solutions: &[
                "Check that the readiness endpoint reports the application's real state",
                "Verify that dependencies checked by the readiness endpoint are reachable",
                "Adjust probe thresholds if the endpoint is slow under load",
            ],
            preventions: &["Keep readiness checks lightweight and independent of optional dependencies"],
        },
        FaultKind::HighRestartCount => Guidance {
            root_cause: "The container restarts repeatedly",
            solutions: &[
                "Inspect logs of previous runs with kubectl logs --previous",
                "Check termination reasons and exit codes for a recurring pattern",
                "Review resource limits and probe configuration",
            ],
            preventions: &["Alert on restart rate rather than total restart count"],
        },
        FaultKind::PodPending => Guidance {
            root_cause: "The pod cannot be scheduled onto a node",
            solutions: &[
                "Describe the pod and read the FailedScheduling event",
                "Compare resource requests with allocatable capacity on the nodes",
                "Check node selectors, affinity rules, taints and unbound PersistentVolumeClaims",
            ],
            preventions: &["Keep spare cluster capacity or enable the cluster autoscaler"],
        },
        FaultKind::PodEvicted => Guidance {
            root_cause: "The kubelet evicted the pod because the node ran low on resources",
            solutions: &[
                "Check which resource was under pressure on the node at eviction time",
                "Set requests that reflect real usage so the pod is not evicted first",
                "Delete the evicted pod objects once the workload is healthy again",
            ],
            preventions: &["Use the Guaranteed QoS class for critical workloads"],
        },
        FaultKind::PodFailed => Guidance {
            root_cause: "All containers in the pod terminated and at least one failed",
            solutions: &[
                "Read the termination reason and logs of each container",
                "Fix the failing container and recreate the pod through its owner",
            ],
            preventions: &["Manage pods through a controller instead of creating them directly"],
        },
        FaultKind::DeploymentUnavailable => Guidance {
            root_cause: "The deployment has no available replicas",
            solutions: &[
                "List the deployment's pods and diagnose the failing ones",
                "Check the rollout status with kubectl rollout status",
                "Roll back with kubectl rollout undo if the last revision introduced the failure",
            ],
            preventions: &["Use a PodDisruptionBudget and progressive rollouts"],
        },
        FaultKind::DeploymentProgressDeadline => Guidance {
            root_cause: "The rollout did not make progress within progressDeadlineSeconds",
            solutions: &[
                "Check the new ReplicaSet's pods for scheduling or startup failures",
                "Roll back with kubectl rollout undo",
                "Fix the failing revision and roll out again",
            ],
            preventions: &["Gate rollouts on readiness in a canary stage"],
        },
        FaultKind::ReplicaMismatch => Guidance {
            root_cause: "Fewer replicas are ready than desired",
            solutions: &[
                "Identify the pods that are not ready and diagnose them",
                "Check whether pending pods are blocked on scheduling",
            ],
            preventions: &["Alert when ready replicas stay below desired for several minutes"],
        },
        FaultKind::ReplicaFailure => Guidance {
            root_cause: "The ReplicaSet controller cannot create pods",
            solutions: &[
                "Read the ReplicaFailure condition message for the rejection reason",
                "Check ResourceQuota, LimitRange and admission webhooks in the namespace",
                "Adjust the pod template or quota and let the controller retry",
            ],
            preventions: &["Track quota usage per namespace"],
        },
        FaultKind::StatefulSetNotReady => Guidance {
            root_cause: "The StatefulSet has pods that are not ready",
            solutions: &[
                "Diagnose the lowest-ordinal pod that is not ready, since later pods wait on it",
                "Check that the PersistentVolumeClaims from volumeClaimTemplates are bound",
                "Verify the headless Service used for pod identity exists",
            ],
            preventions: &["Monitor PVC binding and storage class capacity"],
        },
        FaultKind::DaemonSetNotScheduled => Guidance {
            root_cause: "The DaemonSet is not running a ready pod on every eligible node",
            solutions: &[
                "Compare nodes with the DaemonSet's tolerations and node selector",
                "Check the failing pods on the affected nodes",
                "Review node resource pressure preventing scheduling",
            ],
            preventions: &["Give node agents a high priority class"],
        },
        FaultKind::NodeNotReady => Guidance {
            root_cause: "The node is not reporting Ready to the control plane",
            solutions: &[
                "Check kubelet status with systemctl status kubelet on the node",
                "Read kubelet logs with journalctl -u kubelet",
                "Verify network connectivity between the node and the API server",
                "Drain and replace the node if it cannot be recovered",
            ],
            preventions: &["Enable node auto-repair or health checks in the node pool"],
        },
        FaultKind::NodeMemoryPressure => Guidance {
            root_cause: "The node is running out of memory",
            solutions: &[
                "Find the largest memory consumers with kubectl top pod on the node",
                "Set memory limits on workloads that have none",
                "Add capacity or move workloads off the node",
            ],
            preventions: &["Reserve system memory with kubelet eviction thresholds"],
        },
        FaultKind::NodeDiskPressure => Guidance {
            root_cause: "The node is running out of disk space",
            solutions: &[
                "Remove unused images with crictl rmi --prune",
                "Find pods writing large logs or emptyDir data",
                "Expand the node's disk or rotate logs more aggressively",
            ],
            preventions: &["Set ephemeral-storage limits on workloads"],
        },
        FaultKind::NodePidPressure => Guidance {
            root_cause: "The node is running out of process IDs",
            solutions: &[
                "Find the pods spawning the most processes",
                "Fix process leaks or set a pod PID limit",
            ],
            preventions: &["Configure podPidsLimit in the kubelet"],
        },
        FaultKind::NodeNetworkUnavailable => Guidance {
            root_cause: "The node's network is not configured",
            solutions: &[
                "Check the CNI plugin pods on the node",
                "Review CNI logs and node routes",
                "Restart the CNI agent on the node once the cause is fixed",
            ],
            preventions: &["Monitor CNI daemon health on every node"],
        },
        FaultKind::NodeUnschedulable => Guidance {
            root_cause: "The node is cordoned and accepts no new pods",
            solutions: &[
                "Confirm whether the node was cordoned for maintenance",
                "Uncordon it with kubectl uncordon when maintenance is complete",
            ],
            preventions: &["Track cordoned nodes and their maintenance windows"],
        },
        FaultKind::JobFailed => Guidance {
            root_cause: "The job's pods failed",
            solutions: &[
                "Read the logs of the failed job pods",
                "Fix the failing command or input and rerun the job",
            ],
            preventions: &["Make jobs idempotent so they can be retried safely"],
        },
        FaultKind::JobBackoffLimitExceeded => Guidance {
            root_cause: "The job failed more times than its backoffLimit allows",
            solutions: &[
                "Read the logs of the failed attempts for a common error",
                "Fix the underlying failure before recreating the job",
                "Raise backoffLimit only if the failures are transient",
            ],
            preventions: &["Alert on the first failed attempt of critical jobs"],
        },
        FaultKind::JobDeadlineExceeded => Guidance {
            root_cause: "The job ran longer than activeDeadlineSeconds",
            solutions: &[
                "Check whether the job was slow or stuck",
                "Raise activeDeadlineSeconds or split the work into smaller jobs",
            ],
            preventions: &["Track job durations and alert on regressions"],
        },
        FaultKind::CronJobLastRunFailed => Guidance {
            root_cause: "The most recent scheduled run did not complete successfully",
            solutions: &[
                "Find the job created by the last schedule and read its pod logs",
                "Fix the failure and trigger a manual run with kubectl create job --from=cronjob/<name>",
            ],
            preventions: &["Alert when lastSuccessfulTime falls behind the schedule"],
        },
        FaultKind::CronJobSuspended => Guidance {
            root_cause: "The CronJob is suspended and schedules no runs",
            solutions: &[
                "Confirm whether the suspension is intentional",
                "Resume it with kubectl patch cronjob <name> -p '{\"spec\":{\"suspend\":false}}'",
            ],
            preventions: &["Record the reason and owner when suspending scheduled work"],
        },
        FaultKind::Unknown => GENERIC,
    }
}

/// One-paragraph statement of what was observed on the resource.
#[must_use]
pub fn describe(record: &FaultRecord) -> String {
    let mut diagnosis = format!(
        "{} on {}: {}",
        record.kind.description(),
        record.display_name(),
        record.summary
    );
    if let Some(message) = record
        .context
        .get(ContextKey::TerminationMessage)
        .or_else(|| record.context.get(ContextKey::ConditionMessage))
    {
        diagnosis.push_str(". ");
        diagnosis.push_str(message);
    }
    diagnosis
}

/// Produce a diagnosis for `record` from the static table. Always succeeds.
#[must_use]
pub fn fallback(record: &FaultRecord) -> FallbackDiagnosis {
    let guidance = guidance(record.kind);

    FallbackDiagnosis {
        root_cause: guidance.root_cause.to_string(),
        diagnosis: describe(record),
        solutions: guidance.solutions.iter().map(ToString::to_string).collect(),
        preventions: guidance.preventions.iter().map(ToString::to_string).collect(),
    }
}
