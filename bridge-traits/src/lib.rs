//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the native audio core and the host
//! shell that embeds it. Each trait is a capability the core needs but that
//! every platform provides differently.
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioEngine`](playback::AudioEngine) / [`MediaPlayer`](playback::MediaPlayer) - Decode and render one asset at a time
//! - [`AudioFocusAuthority`](focus::AudioFocusAuthority) - System-wide playback priority
//!
//! ### Host Integration
//! - [`AssetStore`](assets::AssetStore) - Resolve asset paths to playable sources
//! - [`ScriptHost`](script::ScriptHost) - Deliver events into the web view
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Android  | Host app (JNI)      | 📋 Planned |
//! | iOS      | Host app            | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform failures onto the closest variant; the playback core
//! decides how each one is reported.
//!
//! ## Thread Safety
//!
//! Shared capabilities require `Send + Sync`. [`MediaPlayer`](playback::MediaPlayer)
//! only requires `Send`: it is owned by exactly one session at a time.

pub mod assets;
pub mod error;
pub mod focus;
pub mod playback;
pub mod script;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use assets::AssetStore;
pub use focus::{
    AudioFocusAuthority, FocusChange, FocusChangeCallback, FocusGain, FocusRequest,
    FocusRequestId, FocusRequestResult,
};
pub use playback::{
    AudioAttributes, AudioContentType, AudioEngine, AudioSource, AudioUsage, MediaPlayer,
    PlayerListener,
};
pub use script::ScriptHost;
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
