//! Error classification.
//!
//! Every failure the controller absorbs is logged. The policy decides whether
//! it is additionally reported to the web view through the error callback.

use core_runtime::config::PlaybackSettings;
use std::sync::Arc;

use crate::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Log only.
    Absorb,
    /// Log and invoke the script error callback.
    Surface,
}

pub trait ErrorPolicy: Send + Sync {
    fn classify(&self, error: &PlaybackError) -> ErrorDisposition;
}

/// Log every failure and keep going. The caller never hears about errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndContinue;

impl ErrorPolicy for LogAndContinue {
    fn classify(&self, _error: &PlaybackError) -> ErrorDisposition {
        ErrorDisposition::Absorb
    }
}

/// Surface failures of a play cycle to the web view.
///
/// `ControllerReleased` stays absorbed: after release the web view may be
/// gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceToScript;

impl ErrorPolicy for SurfaceToScript {
    fn classify(&self, error: &PlaybackError) -> ErrorDisposition {
        match error {
            PlaybackError::SourceUnavailable { .. } | PlaybackError::EngineError { .. } => {
                ErrorDisposition::Surface
            }
            PlaybackError::ControllerReleased | PlaybackError::Internal(_) => {
                ErrorDisposition::Absorb
            }
        }
    }
}

/// Policy selected by `surface_errors`.
pub fn policy_for(settings: &PlaybackSettings) -> Arc<dyn ErrorPolicy> {
    if settings.surface_errors {
        Arc::new(SurfaceToScript)
    } else {
        Arc::new(LogAndContinue)
    }
}
