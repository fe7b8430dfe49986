//! # Playback Error Types
//!
//! Failures the controller can encounter. None of them cross the public
//! surface uncaught: each one passes through an
//! [`ErrorPolicy`](crate::policy::ErrorPolicy) that decides whether it is only
//! logged or also surfaced to the web view.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Engine `what` code for failures without a more specific classification.
pub const ENGINE_ERROR_UNKNOWN: i32 = 1;

/// Engine `extra` code for I/O failures while reading a source.
pub const ENGINE_ERROR_IO: i32 = -1004;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The asset path could not be resolved or opened.
    #[error("Audio source unavailable: {asset}: {reason}")]
    SourceUnavailable { asset: String, reason: String },

    /// The engine failed to configure, decode or render a session.
    #[error("Engine error (what={what}, extra={extra}): {detail}")]
    EngineError {
        what: i32,
        extra: i32,
        detail: String,
    },

    /// An operation was requested after `release`.
    #[error("Controller has been released")]
    ControllerReleased,

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    pub fn source_unavailable(asset: impl Into<String>, reason: impl ToString) -> Self {
        PlaybackError::SourceUnavailable {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }

    /// Error reported asynchronously by a running engine session.
    pub fn engine(what: i32, extra: i32) -> Self {
        PlaybackError::EngineError {
            what,
            extra,
            detail: "reported by engine".to_string(),
        }
    }

    /// Map a bridge failure raised while configuring or starting a session.
    pub fn from_engine_failure(error: BridgeError) -> Self {
        let (what, extra) = match &error {
            BridgeError::Engine { what, extra } => (*what, *extra),
            BridgeError::Io(_) => (ENGINE_ERROR_UNKNOWN, ENGINE_ERROR_IO),
            _ => (ENGINE_ERROR_UNKNOWN, 0),
        };
        PlaybackError::EngineError {
            what,
            extra,
            detail: error.to_string(),
        }
    }

    /// Stable machine-readable code, passed to the script error callback.
    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::SourceUnavailable { .. } => "source_unavailable",
            PlaybackError::EngineError { .. } => "engine_error",
            PlaybackError::ControllerReleased => "controller_released",
            PlaybackError::Internal(_) => "internal",
        }
    }

    /// Returns `true` if re-issuing `play` may succeed.
    ///
    /// A missing asset stays missing and a released controller stays
    /// released; engine failures are often transient (device contention,
    /// interrupted output).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlaybackError::EngineError { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_keeps_code_pair() {
        let error = PlaybackError::from_engine_failure(BridgeError::Engine {
            what: 100,
            extra: -38,
        });
        match error {
            PlaybackError::EngineError { what, extra, .. } => {
                assert_eq!(what, 100);
                assert_eq!(extra, -38);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_io_failure_maps_to_io_extra() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let error = PlaybackError::from_engine_failure(BridgeError::Io(io));
        assert!(matches!(
            error,
            PlaybackError::EngineError {
                what: ENGINE_ERROR_UNKNOWN,
                extra: ENGINE_ERROR_IO,
                ..
            }
        ));
        assert!(error.to_string().contains("truncated"));
    }

    #[test]
    fn test_codes_and_recoverability() {
        let missing = PlaybackError::source_unavailable("unit1.mp3", "not found");
        assert_eq!(missing.code(), "source_unavailable");
        assert!(!missing.is_recoverable());

        assert_eq!(PlaybackError::engine(1, 0).code(), "engine_error");
        assert!(PlaybackError::engine(1, 0).is_recoverable());

        assert_eq!(
            PlaybackError::ControllerReleased.code(),
            "controller_released"
        );
        assert!(!PlaybackError::ControllerReleased.is_recoverable());
    }
}
