//! Playback engine bridge traits and supporting audio types.
//!
//! These abstractions let the core playback controller drive a host's native
//! decode/render engine (Android `MediaPlayer`, AVFoundation, a desktop output
//! stream) without knowing which one it is. The engine is modelled as a
//! factory of single-use players: every `play` request gets a fresh
//! [`MediaPlayer`], which is released once the session ends or is superseded.
//!
//! ## Threading
//!
//! [`MediaPlayer::prepare`] may block while the decoder parses stream headers.
//! Callers must not invoke it from a UI or event-loop thread; the controller
//! runs it on a blocking worker. Every other method is expected to return
//! promptly.

use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// What the audio is used for, as declared to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioUsage {
    Media,
    Game,
    Notification,
    Alarm,
    VoiceCommunication,
    Unknown,
}

/// What kind of content the stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioContentType {
    Speech,
    Music,
    Movie,
    Sonification,
    Unknown,
}

/// Audio attributes attached to both focus requests and players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub usage: AudioUsage,
    pub content_type: AudioContentType,
}

impl AudioAttributes {
    pub fn new(usage: AudioUsage, content_type: AudioContentType) -> Self {
        Self {
            usage,
            content_type,
        }
    }

    /// Spoken media content (lessons, narration).
    pub fn media_speech() -> Self {
        Self::new(AudioUsage::Media, AudioContentType::Speech)
    }
}

impl Default for AudioAttributes {
    fn default() -> Self {
        Self::media_speech()
    }
}

/// Encoded audio handed to a player.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// A region of a file on disk. Packaged assets are often stored inside a
    /// larger container, so the playable bytes start at `offset` and span
    /// `length` bytes.
    AssetFile {
        path: PathBuf,
        offset: u64,
        length: u64,
    },
    /// Encoded audio already held in memory.
    MemoryBuffer { data: Bytes },
}

impl AudioSource {
    /// A whole file, starting at byte zero.
    pub fn file(path: impl Into<PathBuf>, length: u64) -> Self {
        AudioSource::AssetFile {
            path: path.into(),
            offset: 0,
            length,
        }
    }

    /// Number of encoded bytes the source covers.
    pub fn len(&self) -> u64 {
        match self {
            AudioSource::AssetFile { length, .. } => *length,
            AudioSource::MemoryBuffer { data } => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives asynchronous notifications from a [`MediaPlayer`].
///
/// Callbacks may arrive on any thread. Implementations must not block.
pub trait PlayerListener: Send + Sync {
    /// Playback reached the natural end of the stream.
    fn on_completion(&self);

    /// The engine hit a terminal decode or output fault. `what` and `extra`
    /// are engine-specific diagnostic codes.
    fn on_error(&self, what: i32, extra: i32);
}

/// One decoding session inside the host's audio engine.
///
/// The expected call order is `set_*` → `prepare` → `start`, followed by any
/// mix of `pause`/`start`/`stop`, and finally `release`. Calling anything
/// after `release` is an error.
pub trait MediaPlayer: Send {
    /// Declare the attributes used for routing and focus.
    fn set_audio_attributes(&mut self, attributes: AudioAttributes) -> Result<()>;

    /// Hold a partial wake lock while audio is playing.
    fn set_keep_awake(&mut self, keep_awake: bool) -> Result<()>;

    /// Attach the encoded source. Fails when the source cannot be opened.
    fn set_data_source(&mut self, source: AudioSource) -> Result<()>;

    /// Register the listener that receives completion and error callbacks.
    fn set_listener(&mut self, listener: Arc<dyn PlayerListener>);

    /// Parse headers and get the decoder ready. May block.
    fn prepare(&mut self) -> Result<()>;

    /// Start or resume audio output.
    fn start(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn is_playing(&self) -> bool;

    /// Free every native resource held by this player. Idempotent.
    fn release(&mut self);
}

/// Factory for [`MediaPlayer`] instances.
pub trait AudioEngine: Send + Sync {
    /// Allocate a new, unconfigured player.
    fn create_player(&self) -> Result<Box<dyn MediaPlayer>>;

    /// Short engine name used in logs.
    fn name(&self) -> &str {
        "audio-engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attributes_are_media_speech() {
        let attrs = AudioAttributes::default();
        assert_eq!(attrs.usage, AudioUsage::Media);
        assert_eq!(attrs.content_type, AudioContentType::Speech);
    }

    #[test]
    fn source_length() {
        let file = AudioSource::file("/tmp/a.mp3", 1024);
        assert_eq!(file.len(), 1024);
        assert!(!file.is_empty());

        let memory = AudioSource::MemoryBuffer { data: Bytes::new() };
        assert!(memory.is_empty());
    }
}
