//! # Playback Control Module
//!
//! Single-player audio playback for hosts that embed a web view.
//!
//! ## Overview
//!
//! This crate handles:
//! - Starting, pausing, resuming and stopping one audio asset at a time
//! - Audio focus arbitration with the platform
//! - Completion notification into the web view, once per play cycle
//! - Absorbing every failure behind a configurable [`ErrorPolicy`]
//!
//! ## Components
//!
//! - [`AudioPlaybackController`] - The public handle and its state machine
//! - [`PlaybackEngineAdapter`] - Owns the one live engine session
//! - [`AudioFocusArbiter`] - Requests and abandons focus, maps losses to pause
//! - [`CompletionNotifier`] - Runs the completion script in the web view

pub mod controller;
pub mod engine;
pub mod error;
pub mod focus;
pub mod notifier;
pub mod policy;
pub mod session;
pub mod state;

pub use controller::AudioPlaybackController;
pub use engine::{EngineOpener, EngineOptions, EngineSession, PlaybackEngineAdapter};
pub use error::{PlaybackError, Result};
pub use focus::{AudioFocusArbiter, FocusGrant, FocusSignal};
pub use notifier::CompletionNotifier;
pub use policy::{policy_for, ErrorDisposition, ErrorPolicy, LogAndContinue, SurfaceToScript};
pub use session::{PlaybackSession, SessionId};
pub use state::{ControllerSnapshot, ControllerState};
