//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate lets the playback core run outside a mobile host:
//! - `AssetStore` serving a directory with `tokio::fs`
//! - `AudioFocusAuthority` arbitrating between controllers of one process
//! - `ScriptHost` that logs scripts instead of running them
//! - `AudioEngine` rendering through `rodio` (feature-gated)
//!
//! ## Feature Flags
//!
//! - `rodio-output`: Enable audio output through the default device
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ConsoleScriptHost, ProcessFocusAuthority, TokioAssetStore};
//!
//! let assets = TokioAssetStore::new("./assets");
//! let focus = ProcessFocusAuthority::new();
//! let script = ConsoleScriptHost::default();
//! ```

mod assets;
mod focus;
mod script;

#[cfg(feature = "rodio-output")]
mod engine;

pub use assets::TokioAssetStore;
pub use focus::ProcessFocusAuthority;
pub use script::ConsoleScriptHost;

#[cfg(feature = "rodio-output")]
pub use engine::RodioAudioEngine;
