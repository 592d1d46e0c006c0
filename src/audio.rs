use std::{collections::HashMap, io::Cursor, sync::Arc};

use log::{debug, warn};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output: {0}")]
    Device(String),
    #[error("couldn't decode sound: {0}")]
    Decode(String),
    #[error("sound {0} isn't loaded")]
    UnknownHandle(u64),
}

/// The sound device as the alarm sees it.
///
/// `stop` and `dispose` can't fail so teardown never has to deal with errors.
pub trait AudioOutput {
    type Handle;

    /// # Errors
    /// if the bytes can't be decoded or there is no device
    fn load(&mut self, bytes: Vec<u8>) -> Result<Self::Handle, PlaybackError>;

    /// Starts `handle` from the beginning, repeating until stopped.
    ///
    /// # Errors
    /// if the handle is unknown or playback can't start
    fn play_looping(&mut self, handle: &Self::Handle) -> Result<(), PlaybackError>;

    fn stop(&mut self, handle: &Self::Handle);

    fn dispose(&mut self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(u64);

/// [`AudioOutput`] on the default rodio output stream.
pub struct RodioOutput {
    stream: Option<OutputStream>,
    sounds: HashMap<u64, Arc<[u8]>>,
    sinks: HashMap<u64, Sink>,
    next_id: u64,
}

impl RodioOutput {
    /// # Errors
    /// if the default output device can't be opened
    pub fn open_default() -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;
        stream.log_on_drop(false);
        Ok(Self {
            stream: Some(stream),
            ..Self::disconnected()
        })
    }

    /// An output without a device: every load fails, so the clock keeps
    /// working silently.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            stream: None,
            sounds: HashMap::new(),
            sinks: HashMap::new(),
            next_id: 0,
        }
    }

    fn decoder(bytes: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, PlaybackError> {
        Decoder::new(Cursor::new(Arc::clone(bytes))).map_err(|e| PlaybackError::Decode(e.to_string()))
    }
}

impl AudioOutput for RodioOutput {
    type Handle = SoundHandle;

    fn load(&mut self, bytes: Vec<u8>) -> Result<SoundHandle, PlaybackError> {
        if self.stream.is_none() {
            return Err(PlaybackError::Device("no output device is open".to_string()));
        }
        let bytes: Arc<[u8]> = bytes.into();
        // decode once up front so a bad file fails here and not when the alarm goes off
        Self::decoder(&bytes)?;
        self.next_id += 1;
        self.sounds.insert(self.next_id, bytes);
        debug!("loaded sound {}", self.next_id);
        Ok(SoundHandle(self.next_id))
    }

    fn play_looping(&mut self, handle: &SoundHandle) -> Result<(), PlaybackError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| PlaybackError::Device("no output device is open".to_string()))?;
        let bytes = self
            .sounds
            .get(&handle.0)
            .ok_or(PlaybackError::UnknownHandle(handle.0))?;
        let input = Self::decoder(bytes)?.repeat_infinite();
        let sink = Sink::connect_new(stream.mixer());
        sink.append(input);
        sink.play();
        if let Some(previous) = self.sinks.insert(handle.0, sink) {
            previous.stop();
        }
        Ok(())
    }

    fn stop(&mut self, handle: &SoundHandle) {
        if let Some(sink) = self.sinks.remove(&handle.0) {
            sink.stop();
        }
    }

    fn dispose(&mut self, handle: SoundHandle) {
        self.stop(&handle);
        if self.sounds.remove(&handle.0).is_none() {
            warn!("disposing sound {} twice", handle.0);
        }
    }
}
