//! Log and event collaborators.
//!
//! The pipeline asks a [`ContextSource`] for recent logs and events of the
//! resource being diagnosed. Fetch errors are never fatal; callers log them
//! and continue with empty context.

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::correlate::ResourceKey;
use crate::prompt::EventRecord;

/// Directory name used for cluster-scoped resources
pub const CLUSTER_SCOPE_DIR: &str = "_cluster";

/// Supplies logs and events for a resource.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Last `tail_lines` log lines, newest last. Empty when none exist.
    async fn fetch_logs(&self, key: &ResourceKey, tail_lines: u32) -> Result<String>;

    /// Recent events for the resource.
    async fn fetch_events(&self, key: &ResourceKey) -> Result<Vec<EventRecord>>;
}

/// Source with no logs and no events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

#[async_trait]
impl ContextSource for NoContext {
    async fn fetch_logs(&self, _key: &ResourceKey, _tail_lines: u32) -> Result<String> {
        Ok(String::new())
    }

    async fn fetch_events(&self, _key: &ResourceKey) -> Result<Vec<EventRecord>> {
        Ok(Vec::new())
    }
}

/// Reads captured context from disk.
///
/// Layout: `<root>/<namespace>/<Kind>/<name>.log` and
/// `<root>/<namespace>/<Kind>/<name>.events.json`, with [`CLUSTER_SCOPE_DIR`]
/// standing in for the namespace of cluster-scoped resources. Missing files
/// mean no context.
#[derive(Debug, Clone)]
pub struct DirectoryContextSource {
    root: PathBuf,
}

impl DirectoryContextSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ResourceKey, suffix: &str) -> PathBuf {
        self.root
            .join(key.namespace.as_deref().unwrap_or(CLUSTER_SCOPE_DIR))
            .join(key.resource_kind.as_str())
            .join(format!("{}{suffix}", key.resource_name))
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No captured context");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

#[async_trait]
impl ContextSource for DirectoryContextSource {
    async fn fetch_logs(&self, key: &ResourceKey, tail_lines: u32) -> Result<String> {
        let Some(content) = read_optional(&self.path_for(key, ".log")).await? else {
            return Ok(String::new());
        };

        let lines: Vec<&str> = content.lines().collect();
        let skip = lines.len().saturating_sub(tail_lines as usize);
        Ok(lines[skip..].join("\n"))
    }

    async fn fetch_events(&self, key: &ResourceKey) -> Result<Vec<EventRecord>> {
        let path = self.path_for(key, ".events.json");
        let Some(content) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };

        let events: Vec<Event> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse events from {}", path.display()))?;
        Ok(events.iter().map(EventRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ResourceKind;

    fn key(namespace: Option<&str>, kind: ResourceKind, name: &str) -> ResourceKey {
        ResourceKey {
            namespace: namespace.map(str::to_string),
            resource_kind: kind,
            resource_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_context_is_empty() {
        let k = key(Some("shop"), ResourceKind::Pod, "api-1");
        assert!(NoContext.fetch_logs(&k, 100).await.unwrap().is_empty());
        assert!(NoContext.fetch_events(&k).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_source_tails_logs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shop/Pod")).unwrap();
        std::fs::write(dir.path().join("shop/Pod/api-1.log"), "one\ntwo\nthree\nfour\n").unwrap();

        let source = DirectoryContextSource::new(dir.path());
        let logs = source
            .fetch_logs(&key(Some("shop"), ResourceKind::Pod, "api-1"), 2)
            .await
            .unwrap();
        assert_eq!(logs, "three\nfour");
    }

    #[tokio::test]
    async fn test_directory_source_reads_events() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CLUSTER_SCOPE_DIR).join("Node")).unwrap();
        std::fs::write(
            dir.path().join("_cluster/Node/worker-1.events.json"),
            r#"[{
                "metadata": {"name": "worker-1.17a", "namespace": "default"},
                "involvedObject": {"kind": "Node", "name": "worker-1"},
                "type": "Warning",
                "reason": "NodeNotReady",
                "message": "Node worker-1 status is now: NodeNotReady",
                "count": 4
            }]"#,
        )
        .unwrap();

        let source = DirectoryContextSource::new(dir.path());
        let events = source
            .fetch_events(&key(None, ResourceKind::Node, "worker-1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "NodeNotReady");
        assert_eq!(events[0].count, Some(4));
    }

    #[tokio::test]
    async fn test_same_name_different_kind_reads_own_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shop/Pod")).unwrap();
        std::fs::write(dir.path().join("shop/Pod/api.log"), "pod output\n").unwrap();

        let source = DirectoryContextSource::new(dir.path());
        let pod = key(Some("shop"), ResourceKind::Pod, "api");
        let deployment = key(Some("shop"), ResourceKind::Deployment, "api");
        assert_eq!(source.fetch_logs(&pod, 10).await.unwrap(), "pod output");
        assert!(source.fetch_logs(&deployment, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_files_are_empty_and_bad_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryContextSource::new(dir.path());
        let k = key(Some("shop"), ResourceKind::Pod, "ghost");
        assert!(source.fetch_logs(&k, 10).await.unwrap().is_empty());
        assert!(source.fetch_events(&k).await.unwrap().is_empty());

        std::fs::create_dir_all(dir.path().join("shop/Pod")).unwrap();
        std::fs::write(dir.path().join("shop/Pod/ghost.events.json"), "{not json").unwrap();
        assert!(source.fetch_events(&k).await.is_err());
    }
}
