//! Script Host Abstraction
//!
//! The caller of the playback core is a scripted front-end running inside a
//! web view. The host delivers script snippets into that environment on its
//! own UI loop; the core never waits for them to run.

use crate::error::Result;

/// Fire-and-forget entry point into the caller's scripting environment.
pub trait ScriptHost: Send + Sync {
    /// Whether the environment can currently accept scripts (page loaded,
    /// view attached). Delivery while not ready is dropped by the caller.
    fn is_ready(&self) -> bool {
        true
    }

    /// Queue `script` for evaluation. Must not block and must not wait for
    /// the result.
    fn evaluate(&self, script: &str) -> Result<()>;
}
