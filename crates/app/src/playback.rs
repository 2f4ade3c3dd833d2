//! rodio-backed playback for the terminal front end.

use std::{
    io::Cursor,
    sync::{mpsc, Arc},
    thread,
};

use rodio::{buffer::SamplesBuffer, Decoder, OutputStream, OutputStreamHandle, Source};
use trivia_quiz_core::{
    AudioBackend, ContextState, PlaybackContext, Result, SoundBuffer, TriviaError,
};

/// Opens the default output device on first use.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioBackend;

impl AudioBackend for RodioBackend {
    type Context = RodioContext;

    fn create_context(&self) -> Result<RodioContext> {
        RodioContext::open()
    }
}

/// Output stream kept alive on a dedicated thread; `OutputStream` itself
/// cannot leave the thread that created it.
pub struct RodioContext {
    handle: OutputStreamHandle,
    _shutdown: mpsc::Sender<()>,
}

impl RodioContext {
    fn open() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if ready_tx.send(Ok(handle)).is_ok() {
                        // Blocks until the context is dropped.
                        let _ = shutdown_rx.recv();
                    }
                    drop(stream);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                }
            })?;

        let handle = ready_rx
            .recv()
            .map_err(|_| TriviaError::msg("audio output thread exited early"))?
            .map_err(|err| TriviaError::msg(format!("no audio output device: {err}")))?;

        Ok(Self {
            handle,
            _shutdown: shutdown_tx,
        })
    }
}

impl PlaybackContext for RodioContext {
    fn state(&self) -> ContextState {
        ContextState::Running
    }

    fn resume(&self) -> Result<()> {
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<SoundBuffer> {
        let decoder = Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|err| TriviaError::msg(format!("unable to decode audio data: {err}")))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();

        if channels == 0 || samples.is_empty() {
            return Err(TriviaError::msg("decoded audio contains no samples"));
        }

        Ok(SoundBuffer {
            channels,
            sample_rate,
            samples,
        })
    }

    fn play(&self, buffer: Arc<SoundBuffer>) -> Result<()> {
        let source =
            SamplesBuffer::new(buffer.channels, buffer.sample_rate, buffer.samples.clone());
        self.handle
            .play_raw(source)
            .map_err(|err| TriviaError::msg(format!("playback failed: {err}")))
    }
}
