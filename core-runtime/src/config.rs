//! # Core Configuration Module
//!
//! Provides configuration management for the native audio core.
//!
//! ## Overview
//!
//! The configuration system uses a builder to construct a [`CoreConfig`]
//! holding every host capability the playback controller drives, plus the
//! tunable [`PlaybackSettings`]. Missing capabilities are reported at build
//! time with actionable messages instead of surfacing later as silent
//! playback failures.
//!
//! ## Required Dependencies
//!
//! - `AudioEngine` - Decode/render engine (desktop default with `rodio-output`)
//! - `AssetStore` - Asset resolution (desktop default: assets directory)
//! - `ScriptHost` - Delivery into the web view (desktop default: console)
//!
//! ## Optional Dependencies
//!
//! - `AudioFocusAuthority` - When absent, focus is treated as always granted
//! - `Clock` - Defaults to the system clock
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .audio_engine(Arc::new(MyEngine))
//!     .asset_store(Arc::new(MyAssets))
//!     .script_host(Arc::new(MyWebView))
//!     .focus_authority(Arc::new(MyAudioManager))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Without desktop shims there is no default engine.
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing audio engine");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AssetStore, AudioEngine, AudioFocusAuthority, Clock, ScriptHost, SystemClock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default name of the global function invoked when playback completes.
pub const DEFAULT_COMPLETION_CALLBACK: &str = "onNativeAudioComplete";

/// Default name of the global function invoked for surfaced errors.
pub const DEFAULT_ERROR_CALLBACK: &str = "onNativeAudioError";

/// Tunable playback behaviour.
///
/// Deserializable so hosts can ship it alongside their other settings; every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Global function on `window` called with no arguments when a session
    /// completes naturally.
    pub completion_callback: String,
    /// Global function on `window` called with an error code. Only used when
    /// `surface_errors` is enabled.
    pub error_callback: String,
    /// Hold a partial wake lock while audio plays.
    pub keep_awake: bool,
    /// Report absorbed errors to the web view as well as to the log.
    pub surface_errors: bool,
    /// Per-subscriber buffer of the controller's event bus.
    pub event_buffer_size: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            completion_callback: DEFAULT_COMPLETION_CALLBACK.to_string(),
            error_callback: DEFAULT_ERROR_CALLBACK.to_string(),
            keep_awake: true,
            surface_errors: false,
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl PlaybackSettings {
    /// Parse settings from a JSON document, filling in defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid playback settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("completion_callback", &self.completion_callback),
            ("error_callback", &self.error_callback),
        ] {
            if !is_script_identifier(name) {
                return Err(Error::Config(format!(
                    "{} must be a JavaScript identifier, got {:?}",
                    field, name
                )));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config("event_buffer_size must be > 0".to_string()));
        }

        Ok(())
    }
}

/// Callback names are spliced into scripts, so only plain identifiers pass.
fn is_script_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Core configuration for the native audio core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    pub audio_engine: Arc<dyn AudioEngine>,
    pub asset_store: Arc<dyn AssetStore>,
    pub script_host: Arc<dyn ScriptHost>,
    /// Platform focus authority; `None` means focus is always granted.
    pub focus_authority: Option<Arc<dyn AudioFocusAuthority>>,
    pub clock: Arc<dyn Clock>,
    /// Root directory used by the desktop asset store, when one was requested.
    pub assets_dir: Option<PathBuf>,
    pub playback: PlaybackSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("audio_engine", &self.audio_engine.name())
            .field("asset_store", &"AssetStore { ... }")
            .field("script_host", &"ScriptHost { ... }")
            .field(
                "focus_authority",
                &self
                    .focus_authority
                    .as_ref()
                    .map(|_| "AudioFocusAuthority { ... }"),
            )
            .field("assets_dir", &self.assets_dir)
            .field("playback", &self.playback)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder();
    /// ```
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;

        if let Some(dir) = &self.assets_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("assets_dir cannot be empty".to_string()));
            }
        }

        Ok(())
    }

    /// Whether the host supplied a focus authority.
    pub fn has_focus_authority(&self) -> bool {
        self.focus_authority.is_some()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    audio_engine: Option<Arc<dyn AudioEngine>>,
    asset_store: Option<Arc<dyn AssetStore>>,
    script_host: Option<Arc<dyn ScriptHost>>,
    focus_authority: Option<Arc<dyn AudioFocusAuthority>>,
    clock: Option<Arc<dyn Clock>>,
    assets_dir: Option<PathBuf>,
    playback: Option<PlaybackSettings>,
}

impl CoreConfigBuilder {
    /// Sets the audio engine (required unless a desktop default is compiled in).
    pub fn audio_engine(mut self, engine: Arc<dyn AudioEngine>) -> Self {
        self.audio_engine = Some(engine);
        self
    }

    /// Sets the asset store (required unless `desktop-shims` is enabled and
    /// an assets directory is given).
    pub fn asset_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.asset_store = Some(store);
        self
    }

    /// Sets the script host the completion event is delivered to.
    pub fn script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.script_host = Some(host);
        self
    }

    /// Sets the platform focus authority (optional).
    pub fn focus_authority(mut self, authority: Arc<dyn AudioFocusAuthority>) -> Self {
        self.focus_authority = Some(authority);
        self
    }

    /// Sets the clock used for session timestamps (optional).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Directory the desktop asset store resolves asset paths against.
    pub fn assets_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    /// Replaces the playback settings.
    pub fn playback_settings(mut self, settings: PlaybackSettings) -> Self {
        self.playback = Some(settings);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge has no
    ///   implementation and no platform default applies
    /// - [`Error::Config`] when settings fail validation
    pub fn build(self) -> Result<CoreConfig> {
        let audio_engine = match self.audio_engine {
            Some(engine) => engine,
            None => provide_default_audio_engine()?,
        };

        let asset_store = match self.asset_store {
            Some(store) => store,
            None => provide_default_asset_store(self.assets_dir.as_deref())?,
        };

        let script_host = match self.script_host {
            Some(host) => host,
            None => provide_default_script_host()?,
        };

        let config = CoreConfig {
            audio_engine,
            asset_store,
            script_host,
            focus_authority: self.focus_authority,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            assets_dir: self.assets_dir,
            playback: self.playback.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(feature = "rodio-output")]
fn provide_default_audio_engine() -> Result<Arc<dyn AudioEngine>> {
    Ok(Arc::new(bridge_desktop::RodioAudioEngine::new()))
}

#[cfg(not(feature = "rodio-output"))]
fn provide_default_audio_engine() -> Result<Arc<dyn AudioEngine>> {
    Err(Error::CapabilityMissing {
        capability: "AudioEngine".to_string(),
        message: "No audio engine provided. Desktop: enable the `rodio-output` feature. \
                  Mobile: inject the platform media player adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_asset_store(assets_dir: Option<&Path>) -> Result<Arc<dyn AssetStore>> {
    let dir = assets_dir.ok_or_else(|| Error::CapabilityMissing {
        capability: "AssetStore".to_string(),
        message: "No asset store provided. Use .assets_dir() to serve assets from disk \
                  or inject a platform asset store."
            .to_string(),
    })?;
    Ok(Arc::new(bridge_desktop::TokioAssetStore::new(dir)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_asset_store(_assets_dir: Option<&Path>) -> Result<Arc<dyn AssetStore>> {
    Err(Error::CapabilityMissing {
        capability: "AssetStore".to_string(),
        message: "No asset store provided. Desktop: enable `desktop-shims` and set \
                  .assets_dir(). Mobile: inject the packaged-asset adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_script_host() -> Result<Arc<dyn ScriptHost>> {
    Ok(Arc::new(bridge_desktop::ConsoleScriptHost::default()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_script_host() -> Result<Arc<dyn ScriptHost>> {
    Err(Error::CapabilityMissing {
        capability: "ScriptHost".to_string(),
        message: "No script host provided. Inject the web view adapter that evaluates \
                  scripts on the UI thread."
            .to_string(),
    })
}
