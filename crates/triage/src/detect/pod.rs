//! Pod and container fault detection.

use k8s_openapi::api::core::v1::{
    Container, ContainerStateTerminated, ContainerStatus, Pod, PodCondition, PodSpec,
};
use std::slice;

use super::{
    format_selector, missing_status, object_name, with_owner, with_resources, RESTART_THRESHOLD,
};
use crate::fault::{ContextKey, FaultRecord, ResourceKind};
use crate::taxonomy::FaultKind;

/// Substrings in termination or waiting messages that indicate network failure.
const NETWORK_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "no such host",
    "dial tcp",
    "i/o timeout",
    "network is unreachable",
    "no route to host",
    "temporary failure in name resolution",
];

/// Exit codes the kubelet produces when it kills a container (SIGKILL, SIGTERM).
const KILLED_EXIT_CODES: &[i32] = &[137, 143];

pub(super) fn detect(pod: &Pod) -> Vec<FaultRecord> {
    let Some(status) = pod.status.as_ref() else {
        return vec![missing_status(ResourceKind::Pod, &pod.metadata)];
    };

    let ctx = PodCtx::new(pod);
    let phase = status.phase.as_deref().unwrap_or_default();

    match phase {
        "Failed" if status.reason.as_deref() == Some("Evicted") => {
            let message = status.message.clone().unwrap_or_default();
            vec![ctx
                .record(
                    FaultKind::PodEvicted,
                    format!("Pod {} was evicted", ctx.name),
                )
                .with_description(join_lines(&[FaultKind::PodEvicted.description(), &message]))
                .with_symptom(message)]
        }
        "Failed" => {
            let faults = container_faults(&ctx);
            if faults.is_empty() {
                let message = status.message.clone().unwrap_or_default();
                vec![ctx
                    .record(
                        FaultKind::PodFailed,
                        format!("Pod {} failed", ctx.name),
                    )
                    .with_description(join_lines(&[FaultKind::PodFailed.description(), &message]))
                    .with_symptom(message)]
            } else {
                faults
            }
        }
        "Pending" => {
            if let Some(condition) = unschedulable(status.conditions.as_deref()) {
                return vec![pending_unschedulable(&ctx, condition)];
            }
            let faults = container_faults(&ctx);
            if faults.is_empty() {
                vec![pending_not_started(&ctx)]
            } else {
                faults
            }
        }
        "Running" | "Succeeded" => container_faults(&ctx),
        other => {
            let phase = if other.is_empty() { "no phase" } else { other };
            vec![ctx
                .record(
                    FaultKind::Unknown,
                    format!("Pod {} is in state {phase}", ctx.name),
                )
                .with_description(join_lines(&[
                    FaultKind::Unknown.description(),
                    status.message.as_deref().unwrap_or_default(),
                ]))]
        }
    }
}

/// Pod-level facts shared by every record the pod produces.
struct PodCtx<'a> {
    pod: &'a Pod,
    name: String,
    phase: Option<&'a str>,
}

impl<'a> PodCtx<'a> {
    fn new(pod: &'a Pod) -> Self {
        Self {
            pod,
            name: object_name(&pod.metadata),
            phase: pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        }
    }

    fn spec(&self) -> Option<&'a PodSpec> {
        self.pod.spec.as_ref()
    }

    fn record(&self, kind: FaultKind, summary: String) -> FaultRecord {
        let status = self.pod.status.as_ref();
        let spec = self.spec();

        let record = FaultRecord::new(
            kind,
            ResourceKind::Pod,
            self.pod.metadata.namespace.clone(),
            self.name.clone(),
            summary,
        )
        .with_optional_context(ContextKey::PodPhase, self.phase)
        .with_optional_context(ContextKey::PodReason, status.and_then(|s| s.reason.clone()))
        .with_optional_context(ContextKey::NodeName, spec.and_then(|s| s.node_name.clone()))
        .with_optional_context(ContextKey::PvcNames, spec.and_then(pvc_names))
        .with_optional_context(
            ContextKey::NodeSelector,
            spec.and_then(|s| s.node_selector.as_ref())
                .and_then(format_selector),
        );

        with_owner(record, &self.pod.metadata, &ResourceKind::Pod)
    }

    fn container_spec(&self, name: &str) -> Option<&'a Container> {
        let spec = self.spec()?;
        spec.containers
            .iter()
            .chain(spec.init_containers.iter().flatten())
            .find(|c| c.name == name)
    }
}

fn pvc_names(spec: &PodSpec) -> Option<String> {
    let names: Vec<&str> = spec
        .volumes
        .iter()
        .flatten()
        .filter_map(|v| v.persistent_volume_claim.as_ref())
        .map(|pvc| pvc.claim_name.as_str())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn unschedulable(conditions: Option<&[PodCondition]>) -> Option<&PodCondition> {
    conditions?
        .iter()
        .find(|c| c.type_ == "PodScheduled" && c.status == "False")
}

fn pending_unschedulable(ctx: &PodCtx<'_>, condition: &PodCondition) -> FaultRecord {
    let message = condition.message.clone().unwrap_or_default();
    let reason = condition.reason.clone().unwrap_or_else(|| "Unschedulable".to_string());

    let record = ctx
        .record(
            FaultKind::PodPending,
            format!("Pod {} cannot be scheduled: {reason}", ctx.name),
        )
        .with_description(join_lines(&[FaultKind::PodPending.description(), &message]))
        .with_symptom(message.clone())
        .with_context(ContextKey::ConditionType, condition.type_.clone())
        .with_context(ContextKey::ConditionReason, reason)
        .with_context(ContextKey::ConditionMessage, message);

    match ctx.spec() {
        Some(spec) => with_resources(record, &spec.containers),
        None => record,
    }
}

fn pending_not_started(ctx: &PodCtx<'_>) -> FaultRecord {
    let status = ctx.pod.status.as_ref();
    let waiting: Vec<String> = status
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|cs| {
            let waiting = cs.state.as_ref()?.waiting.as_ref()?;
            let reason = waiting.reason.as_deref().unwrap_or("Waiting");
            Some(match waiting.message.as_deref() {
                Some(message) => format!("{}: {reason} ({message})", cs.name),
                None => format!("{}: {reason}", cs.name),
            })
        })
        .collect();

    let mut record = ctx
        .record(
            FaultKind::PodPending,
            format!("Pod {} is stuck in Pending", ctx.name),
        )
        .with_description(join_lines(&[
            FaultKind::PodPending.description(),
            status.and_then(|s| s.message.as_deref()).unwrap_or_default(),
        ]));
    for line in waiting {
        record = record.with_symptom(line);
    }

    match ctx.spec() {
        Some(spec) => with_resources(record, &spec.containers),
        None => record,
    }
}

fn container_faults(ctx: &PodCtx<'_>) -> Vec<FaultRecord> {
    let Some(status) = ctx.pod.status.as_ref() else {
        return Vec::new();
    };

    status
        .init_container_statuses
        .iter()
        .flatten()
        .chain(status.container_statuses.iter().flatten())
        .filter_map(|cs| classify_container(ctx, cs))
        .collect()
}

/// Pick the single most specific fault for one container, if any.
fn classify_container(ctx: &PodCtx<'_>, cs: &ContainerStatus) -> Option<FaultRecord> {
    let state = cs.state.as_ref();
    let waiting = state.and_then(|s| s.waiting.as_ref());
    let terminated = state.and_then(|s| s.terminated.as_ref());
    let running = state.and_then(|s| s.running.as_ref());
    let last_terminated = cs.last_state.as_ref().and_then(|s| s.terminated.as_ref());
    let waiting_reason = waiting.and_then(|w| w.reason.as_deref());
    let container = ctx.container_spec(&cs.name);

    let oom = [terminated, last_terminated]
        .into_iter()
        .flatten()
        .find(|t| t.reason.as_deref() == Some("OOMKilled"));

    if let Some(termination) = oom {
        let mut record = container_record(
            ctx,
            cs,
            FaultKind::OomKilled,
            format!("Container {} was OOMKilled", cs.name),
            Some(termination),
        );
        if waiting_reason == Some("CrashLoopBackOff") {
            record = record.with_symptom("CrashLoopBackOff");
        }
        return Some(record);
    }

    if let Some(reason) = waiting_reason {
        let kind = match reason {
            "ContainerCreating" | "PodInitializing" => return None,
            "CrashLoopBackOff" => {
                if let Some(refined) = refine_crash(cs, container, last_terminated) {
                    return Some(
                        container_record(
                            ctx,
                            cs,
                            refined,
                            crash_summary(refined, &cs.name),
                            last_terminated,
                        )
                        .with_symptom("CrashLoopBackOff"),
                    );
                }
                FaultKind::CrashLoopBackOff
            }
            "ImagePullBackOff" => FaultKind::ImagePullBackOff,
            "ErrImagePull" => FaultKind::ErrImagePull,
            "InvalidImageName" => FaultKind::InvalidImageName,
            "CreateContainerConfigError" => FaultKind::CreateContainerConfigError,
            "CreateContainerError" => FaultKind::CreateContainerError,
            _ => FaultKind::Unknown,
        };
        let summary = match kind {
            FaultKind::CrashLoopBackOff => format!("Container {} is in CrashLoopBackOff", cs.name),
            FaultKind::Unknown => format!("Container {} is waiting: {reason}", cs.name),
            _ => format!("Container {} cannot start: {reason}", cs.name),
        };
        return Some(container_record(ctx, cs, kind, summary, last_terminated));
    }

    if let Some(termination) = terminated.filter(|t| t.exit_code != 0) {
        let kind = if termination
            .message
            .as_deref()
            .is_some_and(mentions_network_failure)
        {
            FaultKind::NetworkError
        } else {
            FaultKind::ContainerError
        };
        let summary = format!(
            "Container {} exited with code {}",
            cs.name, termination.exit_code
        );
        return Some(container_record(ctx, cs, kind, summary, Some(termination)));
    }

    if running.is_some() {
        if killed_by_liveness(cs, container, last_terminated) {
            return Some(container_record(
                ctx,
                cs,
                FaultKind::LivenessProbeFailed,
                crash_summary(FaultKind::LivenessProbeFailed, &cs.name),
                last_terminated,
            ));
        }
        let has_readiness = container.is_some_and(|c| c.readiness_probe.is_some());
        if !cs.ready && has_readiness && cs.started == Some(true) {
            return Some(container_record(
                ctx,
                cs,
                FaultKind::ReadinessProbeFailed,
                format!("Container {} is running but not ready", cs.name),
                last_terminated,
            ));
        }
        if cs.restart_count > RESTART_THRESHOLD {
            return Some(container_record(
                ctx,
                cs,
                FaultKind::HighRestartCount,
                format!(
                    "Container {} has restarted {} times",
                    cs.name, cs.restart_count
                ),
                last_terminated,
            ));
        }
    }

    None
}

/// A crash loop with a more specific cause in its last termination.
fn refine_crash(
    cs: &ContainerStatus,
    container: Option<&Container>,
    last: Option<&ContainerStateTerminated>,
) -> Option<FaultKind> {
    let last = last?;
    if last.message.as_deref().is_some_and(mentions_network_failure) {
        return Some(FaultKind::NetworkError);
    }
    if killed_by_liveness(cs, container, Some(last)) {
        return Some(FaultKind::LivenessProbeFailed);
    }
    None
}

fn crash_summary(kind: FaultKind, container: &str) -> String {
    match kind {
        FaultKind::NetworkError => format!("Container {container} is failing on network errors"),
        FaultKind::LivenessProbeFailed => {
            format!("Container {container} is being restarted by its liveness probe")
        }
        _ => format!("Container {container} is crashing"),
    }
}

/// Liveness-probe kills show up as a SIGKILL/SIGTERM exit on a container that
/// has a liveness probe, or as an explicit mention in the termination message.
fn killed_by_liveness(
    cs: &ContainerStatus,
    container: Option<&Container>,
    last: Option<&ContainerStateTerminated>,
) -> bool {
    let Some(last) = last else {
        return false;
    };
    if last
        .message
        .as_deref()
        .is_some_and(|m| m.to_lowercase().contains("liveness probe"))
    {
        return true;
    }
    let has_liveness = container.is_some_and(|c| c.liveness_probe.is_some());
    has_liveness
        && cs.restart_count > 0
        && KILLED_EXIT_CODES.contains(&last.exit_code)
        && last.reason.as_deref() != Some("OOMKilled")
}

fn mentions_network_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_MARKERS.iter().any(|m| lower.contains(m))
}

fn container_record(
    ctx: &PodCtx<'_>,
    cs: &ContainerStatus,
    kind: FaultKind,
    summary: String,
    termination: Option<&ContainerStateTerminated>,
) -> FaultRecord {
    let waiting = cs.state.as_ref().and_then(|s| s.waiting.as_ref());
    let termination_message = termination.and_then(|t| t.message.clone());
    let waiting_message = waiting.and_then(|w| w.message.clone());

    let description = join_lines(&[
        kind.description(),
        waiting_message.as_deref().unwrap_or_default(),
        termination_message.as_deref().unwrap_or_default(),
    ]);

    let mut record = ctx
        .record(kind, summary)
        .with_description(description)
        .with_context(ContextKey::ContainerName, cs.name.clone())
        .with_context(ContextKey::Image, cs.image.clone())
        .with_context(ContextKey::RestartCount, cs.restart_count.to_string())
        .with_optional_context(ContextKey::ExitCode, termination.map(|t| t.exit_code.to_string()))
        .with_optional_context(
            ContextKey::TerminationReason,
            termination.and_then(|t| t.reason.clone()),
        )
        .with_optional_context(ContextKey::TerminationMessage, termination_message)
        .with_optional_context(
            ContextKey::WaitingReason,
            waiting.and_then(|w| w.reason.clone()),
        )
        .with_optional_context(ContextKey::WaitingMessage, waiting_message.clone());

    if let Some(message) = waiting_message {
        record = record.with_symptom(message);
    }
    if cs.restart_count > 0 {
        record = record.with_symptom(format!("Restarted {} times", cs.restart_count));
    }

    match ctx.container_spec(&cs.name) {
        Some(container) => with_resources(record, slice::from_ref(container)),
        None => record,
    }
}

fn join_lines(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Severity;
    use serde_json::{json, Value};

    fn pod(spec: Value, status: Value) -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "api-7d9f8c6d5-abc12",
                "namespace": "shop",
                "labels": {"pod-template-hash": "7d9f8c6d5"},
                "ownerReferences": [{
                    "apiVersion": "apps/v1",
                    "kind": "ReplicaSet",
                    "name": "api-7d9f8c6d5",
                    "uid": "rs-1",
                    "controller": true
                }]
            },
            "spec": spec,
            "status": status
        }))
        .unwrap()
    }

    fn api_spec() -> Value {
        json!({
            "nodeName": "worker-1",
            "containers": [{
                "name": "api",
                "image": "shop/api:1.4.2",
                "resources": {
                    "requests": {"cpu": "250m", "memory": "256Mi"},
                    "limits": {"memory": "512Mi"}
                }
            }]
        })
    }

    #[test]
    fn test_oom_in_crash_loop_yields_single_oom_record() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api",
                    "image": "shop/api:1.4.2",
                    "imageID": "",
                    "ready": false,
                    "restartCount": 8,
                    "state": {"waiting": {"reason": "CrashLoopBackOff", "message": "back-off 5m0s restarting failed container"}},
                    "lastState": {"terminated": {"exitCode": 137, "reason": "OOMKilled"}}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        let fault = &faults[0];
        assert_eq!(fault.kind, FaultKind::OomKilled);
        assert_eq!(fault.severity, Severity::Critical);
        assert!(fault.symptoms.iter().any(|s| s == "CrashLoopBackOff"));
        assert_eq!(fault.context.get(ContextKey::ExitCode), Some("137"));
        assert_eq!(fault.context.get(ContextKey::MemoryLimit), Some("512Mi"));
        assert_eq!(fault.context.get(ContextKey::OwnerKind), Some("Deployment"));
        assert_eq!(fault.context.get(ContextKey::OwnerName), Some("api"));
        assert_eq!(fault.context.get(ContextKey::RestartCount), Some("8"));
    }

    #[test]
    fn test_plain_crash_loop() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "restartCount": 3,
                    "state": {"waiting": {"reason": "CrashLoopBackOff"}},
                    "lastState": {"terminated": {"exitCode": 1, "reason": "Error"}}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::CrashLoopBackOff);
    }

    #[test]
    fn test_crash_loop_with_network_message_is_network_error() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "restartCount": 4,
                    "state": {"waiting": {"reason": "CrashLoopBackOff"}},
                    "lastState": {"terminated": {
                        "exitCode": 1,
                        "reason": "Error",
                        "message": "dial tcp 10.0.0.12:5432: connect: connection refused"
                    }}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults[0].kind, FaultKind::NetworkError);
        assert!(faults[0].symptoms.iter().any(|s| s == "CrashLoopBackOff"));
    }

    #[test]
    fn test_image_pull_backoff() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Pending",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:9.9.9", "imageID": "",
                    "ready": false, "restartCount": 0,
                    "state": {"waiting": {"reason": "ImagePullBackOff", "message": "Back-off pulling image"}}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::ImagePullBackOff);
        assert_eq!(faults[0].context.get(ContextKey::Image), Some("shop/api:9.9.9"));
    }

    #[test]
    fn test_unschedulable_pending_pod() {
        let pod = pod(
            json!({
                "containers": [{"name": "api", "image": "shop/api:1.4.2"}],
                "volumes": [{"name": "data", "persistentVolumeClaim": {"claimName": "data-api"}}]
            }),
            json!({
                "phase": "Pending",
                "conditions": [{
                    "type": "PodScheduled",
                    "status": "False",
                    "reason": "Unschedulable",
                    "message": "0/3 nodes are available: 3 pod has unbound immediate PersistentVolumeClaims."
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::PodPending);
        assert!(faults[0].description.contains("PersistentVolumeClaims"));
        assert_eq!(faults[0].context.get(ContextKey::PvcNames), Some("data-api"));
        assert_eq!(
            faults[0].context.get(ContextKey::ConditionReason),
            Some("Unschedulable")
        );
    }

    #[test]
    fn test_container_creating_is_pending() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Pending",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "restartCount": 0,
                    "state": {"waiting": {"reason": "ContainerCreating"}}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::PodPending);
        assert!(faults[0].symptoms[0].contains("ContainerCreating"));
    }

    #[test]
    fn test_evicted_and_failed_pods() {
        let evicted = pod(
            api_spec(),
            json!({"phase": "Failed", "reason": "Evicted", "message": "The node was low on resource: memory."}),
        );
        let faults = detect(&evicted);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::PodEvicted);

        let failed = pod(api_spec(), json!({"phase": "Failed"}));
        assert_eq!(detect(&failed)[0].kind, FaultKind::PodFailed);
    }

    #[test]
    fn test_non_zero_exit_is_container_error() {
        let pod = pod(
            api_spec(),
            json!({
                "phase": "Failed",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "restartCount": 0,
                    "state": {"terminated": {"exitCode": 2, "reason": "Error", "message": "panic: config missing"}}
                }]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::ContainerError);
        assert_eq!(faults[0].context.get(ContextKey::ExitCode), Some("2"));
    }

    #[test]
    fn test_probe_failures() {
        let spec = json!({
            "containers": [{
                "name": "api",
                "image": "shop/api:1.4.2",
                "livenessProbe": {"httpGet": {"path": "/healthz", "port": 8080}},
                "readinessProbe": {"httpGet": {"path": "/ready", "port": 8080}}
            }]
        });

        let liveness = pod(
            spec.clone(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": true, "started": true, "restartCount": 2,
                    "state": {"running": {}},
                    "lastState": {"terminated": {"exitCode": 137, "reason": "Error"}}
                }]
            }),
        );
        assert_eq!(detect(&liveness)[0].kind, FaultKind::LivenessProbeFailed);

        let readiness = pod(
            spec,
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "started": true, "restartCount": 0,
                    "state": {"running": {}}
                }]
            }),
        );
        assert_eq!(detect(&readiness)[0].kind, FaultKind::ReadinessProbeFailed);
    }

    #[test]
    fn test_high_restart_count_and_healthy_pod() {
        let restarts = pod(
            api_spec(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": true, "restartCount": 12,
                    "state": {"running": {}},
                    "lastState": {"terminated": {"exitCode": 1, "reason": "Error"}}
                }]
            }),
        );
        assert_eq!(detect(&restarts)[0].kind, FaultKind::HighRestartCount);

        let healthy = pod(
            api_spec(),
            json!({
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": true, "restartCount": 0,
                    "state": {"running": {}}
                }]
            }),
        );
        assert!(detect(&healthy).is_empty());
    }

    #[test]
    fn test_one_record_per_failing_container() {
        let pod = pod(
            json!({"containers": [
                {"name": "api", "image": "shop/api:1.4.2"},
                {"name": "sidecar", "image": "envoy:1.30"}
            ]}),
            json!({
                "phase": "Running",
                "containerStatuses": [
                    {"name": "api", "image": "shop/api:1.4.2", "imageID": "", "ready": false, "restartCount": 1,
                     "state": {"waiting": {"reason": "CreateContainerConfigError", "message": "secret \"db\" not found"}}},
                    {"name": "sidecar", "image": "envoy:1.30", "imageID": "", "ready": false, "restartCount": 0,
                     "state": {"waiting": {"reason": "SomethingNew"}}}
                ]
            }),
        );

        let faults = detect(&pod);
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].kind, FaultKind::CreateContainerConfigError);
        assert_eq!(faults[1].kind, FaultKind::Unknown);
    }

    #[test]
    fn test_unknown_phase_and_missing_status() {
        let unknown = pod(api_spec(), json!({"phase": "Unknown"}));
        assert_eq!(detect(&unknown)[0].kind, FaultKind::Unknown);

        let mut bare = pod(api_spec(), json!({}));
        bare.status = None;
        let faults = detect(&bare);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::Unknown);
    }
}
