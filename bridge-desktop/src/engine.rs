//! Audio Engine Implementation using rodio
//!
//! rodio's `OutputStream` is not `Send`, so every player owns a dedicated
//! thread that opens the output device, decodes the source and services
//! transport commands. Natural completion is detected by polling the sink.

use bridge_traits::{
    error::{BridgeError, Result},
    playback::{AudioAttributes, AudioEngine, AudioSource, MediaPlayer, PlayerListener},
};
use bytes::Bytes;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

const ERROR_UNKNOWN: i32 = 1;
const ERROR_UNSUPPORTED: i32 = -1010;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Engine that renders through the default output device.
#[derive(Debug, Clone, Default)]
pub struct RodioAudioEngine;

impl RodioAudioEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AudioEngine for RodioAudioEngine {
    fn create_player(&self) -> Result<Box<dyn MediaPlayer>> {
        Ok(Box::new(RodioPlayer::default()))
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

enum WorkerCommand {
    Start,
    Pause,
    Stop,
    Shutdown,
}

struct Worker {
    commands: Sender<WorkerCommand>,
    thread: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RodioPlayer {
    source: Option<AudioSource>,
    listener: Option<Arc<dyn PlayerListener>>,
    worker: Option<Worker>,
    playing: Arc<AtomicBool>,
    released: bool,
}

impl RodioPlayer {
    fn send(&self, command: WorkerCommand) -> Result<()> {
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| BridgeError::OperationFailed("player not prepared".to_string()))?;
        worker
            .commands
            .send(command)
            .map_err(|_| BridgeError::OperationFailed("output thread stopped".to_string()))
    }
}

impl MediaPlayer for RodioPlayer {
    fn set_audio_attributes(&mut self, attributes: AudioAttributes) -> Result<()> {
        // Desktop output has no routing by usage.
        debug!(?attributes, "Ignoring audio attributes");
        Ok(())
    }

    fn set_keep_awake(&mut self, _keep_awake: bool) -> Result<()> {
        Ok(())
    }

    fn set_data_source(&mut self, source: AudioSource) -> Result<()> {
        if self.worker.is_some() {
            return Err(BridgeError::OperationFailed(
                "data source already prepared".to_string(),
            ));
        }
        self.source = Some(source);
        Ok(())
    }

    fn set_listener(&mut self, listener: Arc<dyn PlayerListener>) {
        self.listener = Some(listener);
    }

    fn prepare(&mut self) -> Result<()> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| BridgeError::OperationFailed("no data source".to_string()))?;
        let data = read_source(source)?;

        let (commands, command_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel();
        let playing = Arc::clone(&self.playing);
        let listener = self.listener.clone();

        let thread = std::thread::Builder::new()
            .name("rodio-output".to_string())
            .spawn(move || run_output(data, command_rx, init_tx, playing, listener))
            .map_err(BridgeError::Io)?;

        let ready = init_rx
            .recv()
            .map_err(|_| BridgeError::OperationFailed("output thread exited".to_string()));
        let worker = Worker {
            commands,
            thread: Some(thread),
        };
        match ready.and_then(|r| r) {
            Ok(()) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                shutdown(worker);
                Err(e)
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        self.send(WorkerCommand::Start)?;
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.send(WorkerCommand::Pause)
    }

    fn stop(&mut self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.send(WorkerCommand::Stop)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.playing.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            shutdown(worker);
        }
        self.listener = None;
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        self.release();
    }
}

fn shutdown(mut worker: Worker) {
    let _ = worker.commands.send(WorkerCommand::Shutdown);
    if let Some(thread) = worker.thread.take() {
        if thread.join().is_err() {
            warn!("Output thread panicked");
        }
    }
}

/// Load the bytes a source refers to.
fn read_source(source: &AudioSource) -> Result<Bytes> {
    match source {
        AudioSource::AssetFile {
            path,
            offset,
            length,
        } => {
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(*offset))?;
            let mut data = Vec::with_capacity(*length as usize);
            file.take(*length).read_to_end(&mut data)?;
            if (data.len() as u64) < *length {
                return Err(BridgeError::Engine {
                    what: ERROR_UNKNOWN,
                    extra: -1004,
                });
            }
            Ok(Bytes::from(data))
        }
        AudioSource::MemoryBuffer { data } => Ok(data.clone()),
    }
}

fn run_output(
    data: Bytes,
    commands: Receiver<WorkerCommand>,
    init: Sender<Result<()>>,
    playing: Arc<AtomicBool>,
    listener: Option<Arc<dyn PlayerListener>>,
) {
    // `_stream` must outlive `sink`.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            let _ = init.send(Err(BridgeError::NotAvailable(format!(
                "audio output: {}",
                e
            ))));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = init.send(Err(BridgeError::NotAvailable(format!("audio sink: {}", e))));
            return;
        }
    };
    let decoder = match Decoder::new(Cursor::new(data)) {
        Ok(decoder) => decoder,
        Err(e) => {
            debug!(error = %e, "Unsupported audio data");
            let _ = init.send(Err(BridgeError::Engine {
                what: ERROR_UNKNOWN,
                extra: ERROR_UNSUPPORTED,
            }));
            return;
        }
    };
    sink.pause();
    sink.append(decoder);
    let _ = init.send(Ok(()));

    let mut stopped = false;
    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(WorkerCommand::Start) if stopped => {
                debug!("Start after stop ignored");
                playing.store(false, Ordering::SeqCst);
            }
            Ok(WorkerCommand::Start) => sink.play(),
            Ok(WorkerCommand::Pause) => sink.pause(),
            Ok(WorkerCommand::Stop) => {
                sink.stop();
                stopped = true;
            }
            Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if !stopped && playing.load(Ordering::SeqCst) && sink.empty() {
            playing.store(false, Ordering::SeqCst);
            stopped = true;
            if let Some(listener) = &listener {
                listener.on_completion();
            }
        }
    }
    sink.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_source_honours_offset_and_length() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"headerPAYLOADtrailer").unwrap();

        let source = AudioSource::AssetFile {
            path: file.path().to_path_buf(),
            offset: 6,
            length: 7,
        };
        assert_eq!(read_source(&source).unwrap(), Bytes::from_static(b"PAYLOAD"));
    }

    #[test]
    fn test_read_source_detects_truncation() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"short").unwrap();

        let source = AudioSource::file(file.path(), 64);
        assert!(matches!(
            read_source(&source),
            Err(BridgeError::Engine { extra: -1004, .. })
        ));
    }

    #[test]
    fn test_prepare_requires_source() {
        let mut player = RodioPlayer::default();
        assert!(player.prepare().is_err());
        assert!(player.start().is_err());
        assert!(!player.is_playing());
        player.release();
    }
}
