//! Asset Store Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    assets::AssetStore,
    error::{BridgeError, Result},
    playback::AudioSource,
};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Serves assets from a directory on disk.
///
/// Asset paths are relative, `/`-separated identifiers such as
/// `lessons/unit1.mp3`. Paths that would escape the root are rejected.
#[derive(Debug, Clone)]
pub struct TokioAssetStore {
    root: PathBuf,
}

impl TokioAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, asset_path: &str) -> Result<PathBuf> {
        let relative = Path::new(asset_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if asset_path.is_empty() || escapes {
            return Err(BridgeError::AssetNotFound(format!(
                "invalid asset path: {:?}",
                asset_path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStore for TokioAssetStore {
    async fn open(&self, asset_path: &str) -> Result<AudioSource> {
        let path = self.resolve(asset_path)?;
        let metadata = fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BridgeError::AssetNotFound(asset_path.to_string()),
            _ => BridgeError::Io(e),
        })?;

        if !metadata.is_file() {
            return Err(BridgeError::AssetNotFound(asset_path.to_string()));
        }

        debug!(path = ?path, size = metadata.len(), "Resolved asset");
        Ok(AudioSource::file(path, metadata.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store_with(files: &[(&str, &[u8])]) -> (TempDir, TokioAssetStore) {
        let dir = TempDir::new().unwrap();
        for (name, data) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await.unwrap();
            }
            fs::write(&path, data).await.unwrap();
        }
        let store = TokioAssetStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_nested_asset() {
        let (dir, store) = store_with(&[("lessons/unit1.mp3", b"ID3fake")]).await;

        let source = store.open("lessons/unit1.mp3").await.unwrap();
        match source {
            AudioSource::AssetFile {
                path,
                offset,
                length,
            } => {
                assert_eq!(path, dir.path().join("lessons/unit1.mp3"));
                assert_eq!(offset, 0);
                assert_eq!(length, 7);
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_asset() {
        let (_dir, store) = store_with(&[]).await;
        let err = store.open("lessons/unit9.mp3").await.unwrap_err();
        assert!(matches!(err, BridgeError::AssetNotFound(_)));
        assert!(!store.exists("lessons/unit9.mp3").await);
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let (_dir, store) = store_with(&[("a.mp3", b"x")]).await;
        for path in ["", "../a.mp3", "lessons/../../a.mp3", "/etc/passwd"] {
            assert!(
                matches!(store.open(path).await, Err(BridgeError::AssetNotFound(_))),
                "{:?} should be rejected",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_directory_is_not_an_asset() {
        let (_dir, store) = store_with(&[("lessons/unit1.mp3", b"x")]).await;
        assert!(store.open("lessons").await.is_err());
    }
}
