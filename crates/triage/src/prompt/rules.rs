//! Static prompt text: the process header, per-fault rule blocks and output footers.

use crate::cache::issue_category;
use crate::fault::FaultRecord;
use crate::taxonomy::FaultKind;

pub const SYSTEM_HEADER: &str = "You are a senior Kubernetes site reliability engineer \
diagnosing a single failing workload. Work only from the evidence provided.

Process:
1. Read the fault summary and context fields first; they come from the live resource state.
2. Use the log excerpt and events to confirm or refute the obvious cause.
3. Name one root cause. If the evidence is ambiguous, say which additional check would settle it.
4. Propose the smallest change that fixes the fault.

Constraints:
- Never suggest deleting namespaces, PersistentVolumes or the cluster's system components.
- Never invent resource names, images or values that do not appear in the input.
- Prefer declarative fixes (editing the owning controller) over patching individual pods.
- Keep the answer under 400 words.";

pub const SOLUTION_FORMAT: &str = "Solution format:
- Number each step at the start of the line (1., 2., 3.).
- Put every shell command on its own line inside backticks.
- Put YAML or JSON snippets in fenced code blocks.
- Use at most 5 steps; the first step must be a diagnostic command that confirms the cause.";

pub const OUTPUT_FORMAT: &str = "Output format, with exactly these three headers in this order:

### Root Cause
One or two sentences naming the cause.

### Solution
The numbered steps.

### Prevention
Two to four bullet points starting with \"- \".";

const OOM_KILLED: &str = "Rules for OOM_KILLED:
- Compare the memory limit with the memory request and with the usage pattern in the logs.
- Distinguish a genuine leak (steady growth, then kill) from an undersized limit (killed at startup or under load).
- For JVM, Node.js or Go workloads check that heap settings are derived from the container limit.
- Raise the limit on the owning controller, never on the pod itself.";

const CRASH_LOOP: &str = "Rules for CRASH_LOOP_BACK_OFF:
- The useful evidence is the previous container run: its exit code, termination message and last log lines.
- Exit code 1 or 2 usually means an application error or bad configuration; 126/127 a wrong command or entrypoint.
- Check recently changed ConfigMaps, Secrets and environment variables referenced by the container.
- Do not recommend increasing restart back-off; fix the crash.";

const IMAGE_PULL: &str = "Rules for image pull failures:
- Check the image reference for typos, a missing tag or a registry hostname error.
- Check whether the registry requires credentials and whether imagePullSecrets is set on the pod or service account.
- For ErrImagePull with rate-limit messages, recommend a registry mirror or authenticated pulls.
- Use the exact image string from the context; do not guess a different tag.";

const INVALID_IMAGE_NAME: &str = "Rules for INVALID_IMAGE_NAME:
- The image reference fails to parse; look for uppercase characters, spaces, a double colon or an empty tag.
- Template rendering errors (Helm, Kustomize) often produce this; check the rendered manifest.";

const CREATE_CONTAINER_CONFIG: &str = "Rules for CREATE_CONTAINER_CONFIG_ERROR:
- A referenced ConfigMap, Secret or key does not exist in the pod's namespace.
- Name the missing object from the waiting message and show how to create it or fix the reference.
- Mention optional: true only if the workload can genuinely run without the value.";

const CREATE_CONTAINER: &str = "Rules for CREATE_CONTAINER_ERROR:
- The runtime rejected the container spec: check volume mounts, subPath, securityContext and the entrypoint.
- Quote the runtime message from the context and map it to the field that causes it.";

const CONTAINER_ERROR: &str = "Rules for CONTAINER_ERROR:
- Interpret the exit code: 1 application error, 137 killed (SIGKILL), 139 segfault, 143 SIGTERM.
- Use the termination message and logs to find the failing code path or configuration.
- If the container is a one-shot task, say whether restartPolicy or the Job spec should change.";

const NETWORK_ERROR: &str = "Rules for NETWORK_ERROR:
- Identify the destination (host, service, port) from the messages and logs.
- Check in order: the target Service exists and has endpoints, DNS resolves, NetworkPolicies allow the traffic.
- For connection refused, the target is reachable but nothing listens; for timeouts, suspect policies or routing.
- Consider whether the dependency is simply not ready yet and the app lacks retry on startup.";

const LIVENESS_PROBE: &str = "Rules for LIVENESS_PROBE_FAILED:
- Decide whether the application is actually unhealthy or the probe is too aggressive.
- Compare initialDelaySeconds, timeoutSeconds and failureThreshold with the application's startup time.
- Recommend a startupProbe for slow-starting applications instead of a long liveness delay.";

const READINESS_PROBE: &str = "Rules for READINESS_PROBE_FAILED:
- The container runs but receives no traffic; check what the readiness endpoint depends on.
- A readiness probe that checks downstream dependencies can take a whole service down; say so if that is the case.
- Verify the probe port and path match the container's listening port.";

const HIGH_RESTARTS: &str = "Rules for HIGH_RESTART_COUNT:
- The container currently runs but restarted many times; use the last termination reason and exit code.
- Look for periodic patterns: memory growth, liveness timeouts under load, or dependency flaps.";

const PENDING_PVC_STATEFULSET: &str = "Rules for POD_PENDING (storage, StatefulSet):
- The pod waits for a PersistentVolumeClaim created from the StatefulSet's volumeClaimTemplates.
- Check the StorageClass named in the template exists and can provision in the pod's zone.
- Fix the volumeClaimTemplates entry on the StatefulSet in place (or recreate the StatefulSet with --cascade=orphan); do not create a standalone PersistentVolumeClaim.
- Existing claims keep their old spec; say whether the stuck claim must be deleted after the template is fixed.";

const PENDING_PVC: &str = "Rules for POD_PENDING (storage):
- Find the unbound PersistentVolumeClaim named in the context and check its StorageClass and access mode.
- If no dynamic provisioner exists, a matching PersistentVolume must be created.
- Check for zone or node affinity conflicts between the volume and schedulable nodes.";

const PENDING_RESOURCES: &str = "Rules for POD_PENDING (insufficient resources):
- Compare the pod's CPU and memory requests with node allocatable capacity.
- Decide between lowering requests, scaling the node pool, or evicting lower-priority workloads.
- Check for ResourceQuota or LimitRange objects that inflate requests.";

const PENDING_TAINT: &str = "Rules for POD_PENDING (taints):
- Name the taint that blocks scheduling and whether it is intentional (dedicated nodes) or a condition taint.
- Add a toleration only if the workload is meant to run on those nodes; otherwise fix the node.";

const PENDING_NODE: &str = "Rules for POD_PENDING (node selection):
- Compare the nodeSelector and affinity rules with the labels actually present on nodes.
- Check whether required anti-affinity makes the replica count unschedulable.";

const PENDING_GENERIC: &str = "Rules for POD_PENDING:
- Use the scheduler message in the context to decide whether the problem is resources, storage, taints or selectors.
- If the pod is scheduled but stuck creating containers, check volume mounts and image pulls on the node.";

const POD_EVICTED: &str = "Rules for POD_EVICTED:
- The kubelet evicted the pod under node pressure; name the resource from the eviction message.
- Pods without requests are evicted first; recommend setting requests close to real usage.
- Evicted pods are not cleaned up automatically; mention removing them once the cause is fixed.";

const POD_FAILED: &str = "Rules for POD_FAILED:
- The pod reached a terminal Failed phase; use container exit codes and the pod message.
- Check whether restartPolicy Never or OnFailure is intended for this workload.";

const DEPLOYMENT_UNAVAILABLE: &str = "Rules for DEPLOYMENT_UNAVAILABLE:
- The deployment serves no traffic. Find why its pods are not ready: list them and describe one.
- Check whether a recent rollout introduced the failure and whether rolling back restores service.";

const PROGRESS_DEADLINE: &str = "Rules for DEPLOYMENT_PROGRESS_DEADLINE:
- The new ReplicaSet did not become ready within progressDeadlineSeconds.
- Inspect the newest ReplicaSet's pods for the underlying failure; the deadline itself is a symptom.
- Recommend kubectl rollout undo only when the previous revision was healthy.";

const REPLICA_MISMATCH: &str = "Rules for REPLICA_MISMATCH:
- Some replicas are not ready. Determine whether they are pending, crashing or failing readiness.
- Check PodDisruptionBudgets and HorizontalPodAutoscaler bounds that might hold the count down.";

const REPLICA_FAILURE: &str = "Rules for REPLICA_FAILURE:
- The controller could not create pods; the condition message names the cause (quota, admission webhook, security policy).
- Fix the blocking policy or quota, not the ReplicaSet.";

const STATEFULSET_NOT_READY: &str = "Rules for STATEFULSET_NOT_READY:
- StatefulSets start pods in order; the first non-ready ordinal blocks the rest.
- Check that ordinal's PersistentVolumeClaim binding and its readiness probe.
- Changes belong in the StatefulSet spec, including volumeClaimTemplates, never in standalone claims.";

const DAEMONSET_NOT_SCHEDULED: &str = "Rules for DAEMONSET_NOT_SCHEDULED:
- Compare desired, current and ready counts; name which nodes lack a daemon pod.
- Check node taints versus the DaemonSet tolerations and any nodeSelector on the template.";

const NODE_NOT_READY: &str = "Rules for NODE_NOT_READY:
- Check the kubelet and container runtime on the node first (systemctl status kubelet, journalctl -u kubelet).
- Distinguish network partition (NodeStatusUnknown) from kubelet failure (KubeletNotReady).
- Say whether workloads on the node should be drained while it is investigated.";

const NODE_PRESSURE: &str = "Rules for node pressure conditions:
- Name the exhausted resource and the eviction threshold that tripped.
- Identify the largest consumers on the node before suggesting cleanup.
- For disk pressure, check image garbage collection and container log rotation.";

const NODE_NETWORK: &str = "Rules for NODE_NETWORK_UNAVAILABLE:
- The CNI plugin has not configured the node's network; check the CNI daemon pods on that node.
- Check routes and node IP allocation for the pod CIDR.";

const NODE_UNSCHEDULABLE: &str = "Rules for NODE_UNSCHEDULABLE:
- The node was cordoned. Say whether this looks like an unfinished drain or maintenance.
- Recommend kubectl uncordon only after the reason for cordoning is resolved.";

const JOB_FAILED: &str = "Rules for Job failures:
- Use the failed pod's exit code and logs; the Job condition only reports that retries ran out.
- Distinguish a deterministic bug (same failure every attempt) from a transient dependency failure.
- For DeadlineExceeded, compare activeDeadlineSeconds with the real runtime.";

const CRONJOB_LAST_RUN_FAILED: &str = "Rules for CRONJOB_LAST_RUN_FAILED:
- Find the Job created for the last schedule and diagnose it like a failed Job.
- Check concurrencyPolicy and startingDeadlineSeconds for missed schedules.";

const CRONJOB_SUSPENDED: &str = "Rules for CRONJOB_SUSPENDED:
- The CronJob is suspended on purpose or left suspended after maintenance; say which the evidence suggests.
- Resuming runs missed schedules only within startingDeadlineSeconds.";

const UNKNOWN: &str = "Rules for unrecognized states:
- The detector could not classify this state. Reason from the raw description and events.
- Offer the two most likely explanations and the command that tells them apart.";

/// Rule block for the fault's kind. Pending pods branch on issue category and owner.
#[must_use]
pub fn rule_block(record: &FaultRecord) -> &'static str {
    match record.kind {
        FaultKind::OomKilled => OOM_KILLED,
        FaultKind::CrashLoopBackOff => CRASH_LOOP,
        FaultKind::ImagePullBackOff | FaultKind::ErrImagePull => IMAGE_PULL,
        FaultKind::InvalidImageName => INVALID_IMAGE_NAME,
        FaultKind::CreateContainerConfigError => CREATE_CONTAINER_CONFIG,
        FaultKind::CreateContainerError => CREATE_CONTAINER,
        FaultKind::ContainerError => CONTAINER_ERROR,
        FaultKind::NetworkError => NETWORK_ERROR,
        FaultKind::LivenessProbeFailed => LIVENESS_PROBE,
        FaultKind::ReadinessProbeFailed => READINESS_PROBE,
        FaultKind::HighRestartCount => HIGH_RESTARTS,
        FaultKind::PodPending => pending_block(record),
        FaultKind::PodEvicted => POD_EVICTED,
        FaultKind::PodFailed => POD_FAILED,
        FaultKind::DeploymentUnavailable => DEPLOYMENT_UNAVAILABLE,
        FaultKind::DeploymentProgressDeadline => PROGRESS_DEADLINE,
        FaultKind::ReplicaMismatch => REPLICA_MISMATCH,
        FaultKind::ReplicaFailure => REPLICA_FAILURE,
        FaultKind::StatefulSetNotReady => STATEFULSET_NOT_READY,
        FaultKind::DaemonSetNotScheduled => DAEMONSET_NOT_SCHEDULED,
        FaultKind::NodeNotReady => NODE_NOT_READY,
        FaultKind::NodeMemoryPressure | FaultKind::NodeDiskPressure | FaultKind::NodePidPressure => {
            NODE_PRESSURE
        }
        FaultKind::NodeNetworkUnavailable => NODE_NETWORK,
        FaultKind::NodeUnschedulable => NODE_UNSCHEDULABLE,
        FaultKind::JobFailed
        | FaultKind::JobBackoffLimitExceeded
        | FaultKind::JobDeadlineExceeded => JOB_FAILED,
        FaultKind::CronJobLastRunFailed => CRONJOB_LAST_RUN_FAILED,
        FaultKind::CronJobSuspended => CRONJOB_SUSPENDED,
        FaultKind::Unknown => UNKNOWN,
    }
}

fn pending_block(record: &FaultRecord) -> &'static str {
    match (issue_category(record).as_str(), record.owner_kind()) {
        ("PVC", "StatefulSet") => PENDING_PVC_STATEFULSET,
        ("PVC", _) => PENDING_PVC,
        ("CPU" | "MEMORY" | "RESOURCE", _) => PENDING_RESOURCES,
        ("TAINT", _) => PENDING_TAINT,
        ("NODE", _) => PENDING_NODE,
        _ => PENDING_GENERIC,
    }
}
