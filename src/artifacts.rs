//! File-backed artifact store.
//!
//! The output directory holds:
//! - `call_<correlation id>.json`: one immutable record per processed call
//! - `cumulative_tree.json`: the latest merged tree (usable as a seed)
//! - `summary.json`: written once when exploration terminates

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{ArtifactError, SeedError};
use crate::explorer::summary::ExplorationSummary;
use crate::tree::DecisionTree;

/// Well-known file names in the output directory.
pub mod paths {
    pub const CUMULATIVE_TREE: &str = "cumulative_tree.json";
    pub const SUMMARY: &str = "summary.json";
}

/// Durable record of one completed call. Never rewritten once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallArtifact {
    pub correlation_id: String,
    pub call_id: String,
    pub recording_reference: String,
    pub transcript: String,
    /// Tree fragment extracted from this call alone.
    pub fragment: DecisionTree,
    pub recorded_at: DateTime<Utc>,
}

pub struct ArtifactStore {
    base_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn ensure_dirs(&self) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn artifact_path(&self, correlation_id: &str) -> PathBuf {
        self.base_path.join(format!("call_{correlation_id}.json"))
    }

    /// Store a call artifact. Fails if one already exists for the correlation id.
    pub async fn write_artifact(&self, artifact: &CallArtifact) -> Result<PathBuf, ArtifactError> {
        self.ensure_dirs().await?;
        let path = self.artifact_path(&artifact.correlation_id);
        let json = serde_json::to_string_pretty(artifact)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ArtifactError::AlreadyExists(
                    artifact.correlation_id.clone(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        info!(path = %path.display(), "Call artifact saved");
        Ok(path)
    }

    pub async fn read_artifact(&self, correlation_id: &str) -> Result<CallArtifact, ArtifactError> {
        let raw = fs::read_to_string(self.artifact_path(correlation_id)).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overwrite the cumulative tree snapshot.
    pub async fn save_cumulative_tree(&self, tree: &DecisionTree) -> Result<PathBuf, ArtifactError> {
        self.ensure_dirs().await?;
        let path = self.base_path.join(paths::CUMULATIVE_TREE);
        fs::write(&path, tree.to_pretty_json()).await?;
        Ok(path)
    }

    pub async fn write_summary(&self, summary: &ExplorationSummary) -> Result<PathBuf, ArtifactError> {
        self.ensure_dirs().await?;
        let path = self.base_path.join(paths::SUMMARY);
        fs::write(&path, serde_json::to_string_pretty(summary)?).await?;
        Ok(path)
    }
}

/// Load a previously persisted cumulative tree. Any failure is fatal to startup.
pub async fn load_seed(path: &Path) -> Result<DecisionTree, SeedError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    DecisionTree::parse(&raw).map_err(|e| SeedError::Unparsable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(correlation_id: &str) -> CallArtifact {
        CallArtifact {
            correlation_id: correlation_id.to_string(),
            call_id: "ext-1".to_string(),
            recording_reference: "https://media.test?id=ext-1".to_string(),
            transcript: "Agent: Hello".to_string(),
            fragment: DecisionTree::parse(r#"{"Greeting": "Unknown"}"#).unwrap(),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn artifact_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));

        let stored = artifact("corr-1");
        let path = store.write_artifact(&stored).await.unwrap();
        assert!(path.ends_with("call_corr-1.json"));

        let loaded = store.read_artifact("corr-1").await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn artifact_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());

        store.write_artifact(&artifact("corr-2")).await.unwrap();
        let mut second = artifact("corr-2");
        second.transcript = "different".to_string();

        let err = store.write_artifact(&second).await.unwrap_err();
        assert!(matches!(err, ArtifactError::AlreadyExists(id) if id == "corr-2"));
        assert_eq!(
            store.read_artifact("corr-2").await.unwrap().transcript,
            "Agent: Hello"
        );
    }

    #[tokio::test]
    async fn cumulative_snapshot_is_a_valid_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let tree = DecisionTree::parse(r#"{"Q": {"Yes": "Unknown", "No": "Done"}}"#).unwrap();

        let path = store.save_cumulative_tree(&tree).await.unwrap();
        assert_eq!(load_seed(&path).await.unwrap(), tree);
    }

    #[tokio::test]
    async fn unparsable_seed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "not a tree").unwrap();

        let err = load_seed(&path).await.unwrap_err();
        assert!(matches!(err, SeedError::Unparsable { .. }));
    }

    #[tokio::test]
    async fn missing_seed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_seed(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, SeedError::Unreadable { .. }));
    }
}
