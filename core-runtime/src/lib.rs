//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the native audio core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the playback core depends on. It
//! establishes the logging conventions, the capability wiring, and the event
//! broadcasting used throughout the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
