//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (audio engine, asset
//! store, script host, focus authority) into the playback core and exposes
//! the operations a scripted front-end may call. Desktop builds typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`);
//! mobile hosts inject their platform adapters through
//! [`CoreConfig`](core_runtime::config::CoreConfig).

pub mod error;

pub use error::{CoreError, Result};

pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

use core_playback::{AudioPlaybackController, ControllerSnapshot};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct NativeAudioService {
    controller: AudioPlaybackController,
}

impl NativeAudioService {
    /// Build the playback controller from `config`.
    ///
    /// Must be called within a tokio runtime.
    pub fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current().map_err(|e| {
            CoreError::InitializationFailed(format!("no tokio runtime: {}", e))
        })?;

        let controller = AudioPlaybackController::new(&config)?;
        info!(
            engine = config.audio_engine.name(),
            focus_authority = config.has_focus_authority(),
            "Native audio service started"
        );
        Ok(Self { controller })
    }

    /// Bootstrap with the desktop shims: assets served from `assets_dir`,
    /// focus arbitrated within this process and scripts logged to the
    /// console. Needs the `rodio-output` feature for an audio engine.
    ///
    /// ```no_run
    /// # async fn example() -> core_service::Result<()> {
    /// let service = core_service::NativeAudioService::bootstrap_desktop("./assets")?;
    /// service.script_bridge().handle_message(r#"{"method":"play","args":{"assetPath":"lessons/unit1.mp3"}}"#);
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "desktop-shims")]
    pub fn bootstrap_desktop(assets_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let config = CoreConfig::builder()
            .assets_dir(assets_dir)
            .focus_authority(std::sync::Arc::new(
                bridge_desktop::ProcessFocusAuthority::new(),
            ))
            .build()?;
        Self::bootstrap(config)
    }

    pub fn controller(&self) -> &AudioPlaybackController {
        &self.controller
    }

    /// The operations a scripted front-end may call.
    pub fn script_bridge(&self) -> ScriptBridge {
        ScriptBridge {
            controller: self.controller.clone(),
        }
    }

    pub fn events(&self) -> &EventBus {
        self.controller.events()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.controller.snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.controller.is_ready()
    }

    /// Tear down playback. Called by the host shell when its view goes away.
    pub fn release(&self) {
        info!("Releasing native audio service");
        self.controller.release();
    }
}

/// A call from script, e.g. `{"method":"play","args":{"assetPath":"a.mp3"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum BridgeCall {
    IsReady,
    Play {
        #[serde(rename = "assetPath")]
        asset_path: String,
    },
    Pause,
    Resume,
    Stop,
}

/// Script-facing surface of the service.
///
/// Every call except `isReady` is fire-and-forget. `release` is deliberately
/// absent: only the host shell may tear the controller down.
#[derive(Clone)]
pub struct ScriptBridge {
    controller: AudioPlaybackController,
}

impl ScriptBridge {
    /// Handle a raw message. Malformed messages are logged and ignored.
    /// Returns a JSON reply for calls that produce one.
    pub fn handle_message(&self, message: &str) -> Option<String> {
        match self.try_handle_message(message) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Ignoring script message");
                None
            }
        }
    }

    pub fn try_handle_message(&self, message: &str) -> Result<Option<String>> {
        let call: BridgeCall = serde_json::from_str(message)
            .map_err(|e| CoreError::InvalidMessage(e.to_string()))?;
        Ok(self.dispatch(call))
    }

    pub fn dispatch(&self, call: BridgeCall) -> Option<String> {
        debug!(?call, "Script call");
        match call {
            BridgeCall::IsReady => {
                Some(serde_json::json!({ "ready": self.controller.is_ready() }).to_string())
            }
            BridgeCall::Play { asset_path } => {
                self.controller.play(asset_path);
                None
            }
            BridgeCall::Pause => {
                self.controller.pause();
                None
            }
            BridgeCall::Resume => {
                self.controller.resume();
                None
            }
            BridgeCall::Stop => {
                self.controller.stop();
                None
            }
        }
    }
}
