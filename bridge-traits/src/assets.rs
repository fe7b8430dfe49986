//! Asset Storage Abstraction
//!
//! Audio assets are referenced by an opaque path (for example
//! `lessons/unit1.mp3`) that only the host knows how to resolve: an APK asset
//! bundle on Android, the app bundle on iOS, a directory on desktop.

use crate::error::Result;
use crate::playback::AudioSource;

/// Resolves asset paths into playable sources.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::assets::AssetStore;
///
/// async fn size_of(store: &dyn AssetStore) -> u64 {
///     store.open("lessons/unit1.mp3").await.map(|s| s.len()).unwrap_or(0)
/// }
/// ```
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Locate an asset and describe where its bytes live.
    ///
    /// Returns [`BridgeError::AssetNotFound`](crate::BridgeError::AssetNotFound)
    /// when nothing matches `asset_path`.
    async fn open(&self, asset_path: &str) -> Result<AudioSource>;

    /// Cheap existence check. The default implementation opens the asset.
    async fn exists(&self, asset_path: &str) -> bool {
        self.open(asset_path).await.is_ok()
    }
}
