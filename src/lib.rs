//! Workspace entry crate.
//!
//! Host applications can depend on `native-audio-workspace` and enable the
//! documented features instead of wiring each workspace crate individually.
//!
//! - `desktop-shims` (default): desktop asset store, focus and script host
//! - `rodio-output`: audio output through the default device

#[cfg(any(feature = "desktop-shims", feature = "rodio-output"))]
pub use core_service::*;
