//! Console script host for running the core without a web view.

use bridge_traits::{error::Result, script::ScriptHost};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Logs every script it is asked to evaluate.
#[derive(Debug)]
pub struct ConsoleScriptHost {
    ready: AtomicBool,
}

impl ConsoleScriptHost {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl Default for ConsoleScriptHost {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ScriptHost for ConsoleScriptHost {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn evaluate(&self, script: &str) -> Result<()> {
        info!(script, "Evaluating script");
        Ok(())
    }
}
