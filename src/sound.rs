use log::warn;

pub trait Sound: Send + Sync {
    fn on_eat(&self);
    fn on_game_over(&self);
}

pub struct Muted;

impl Sound for Muted {
    fn on_eat(&self) {}
    fn on_game_over(&self) {}
}

/// Picks the audio backend. A speaker that fails to open falls back to
/// silence instead of aborting the game.
pub fn open(silent: bool) -> Box<dyn Sound> {
    if silent {
        return Box::new(Muted);
    }

    match Speaker::new() {
        Ok(speaker) => Box::new(speaker),
        Err(err) => {
            warn!("{}, continuing without sound", err);
            Box::new(Muted)
        }
    }
}

#[cfg(feature = "audio")]
pub use speaker::Speaker;

#[cfg(feature = "audio")]
mod speaker {
    use std::sync::mpsc::{self, Sender};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use log::{debug, warn};
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sound;
    use crate::error::{Error, Result};

    #[derive(Copy, Clone, Debug)]
    enum Cue {
        Eat,
        GameOver,
    }

    /// Plays synthesized cues on the default output device. `OutputStream`
    /// is not `Send`, so it lives on its own thread and cues are posted to it.
    pub struct Speaker {
        cues: Option<Sender<Cue>>,
        worker: Option<JoinHandle<()>>,
    }

    impl Speaker {
        pub fn new() -> Result<Self> {
            let (cues, inbox) = mpsc::channel::<Cue>();
            let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

            let worker = thread::Builder::new()
                .name("audio".into())
                .spawn(move || {
                    let (_stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => pair,
                        Err(err) => {
                            let _ = ready_tx.send(Err(Error::Audio(err.to_string())));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));

                    for cue in inbox {
                        debug!("playing {:?}", cue);
                        play(&handle, cue);
                    }
                })
                .map_err(|source| Error::Thread { name: "audio", source })?;

            match ready_rx.recv() {
                Ok(Ok(())) => Ok(Speaker { cues: Some(cues), worker: Some(worker) }),
                Ok(Err(err)) => {
                    let _ = worker.join();
                    Err(err)
                }
                Err(_) => Err(Error::Audio("audio thread exited during setup".into())),
            }
        }

        fn post(&self, cue: Cue) {
            if let Some(cues) = &self.cues {
                if cues.send(cue).is_err() {
                    warn!("audio thread is gone, dropping {:?}", cue);
                }
            }
        }
    }

    fn play(handle: &OutputStreamHandle, cue: Cue) {
        let sink = match Sink::try_new(handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!("could not open audio sink: {}", err);
                return;
            }
        };

        match cue {
            Cue::Eat => sink.append(tone(880.0, 70)),
            Cue::GameOver => {
                for (freq, ms) in [(440.0, 180), (330.0, 180), (220.0, 450)] {
                    sink.append(tone(freq, ms));
                }
            }
        }

        // The sink keeps playing after being detached; nobody waits for it.
        sink.detach();
    }

    fn tone(freq: f32, ms: u64) -> impl Source<Item = f32> + Send {
        SineWave::new(freq).take_duration(Duration::from_millis(ms)).amplify(0.20)
    }

    impl Sound for Speaker {
        fn on_eat(&self) {
            self.post(Cue::Eat);
        }

        fn on_game_over(&self) {
            self.post(Cue::GameOver);
        }
    }

    impl Drop for Speaker {
        fn drop(&mut self) {
            // Closing the channel ends the worker loop and releases the device.
            self.cues.take();
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
        }
    }
}

/// Stand-in when the crate is built without `audio`; it can never be opened.
#[cfg(not(feature = "audio"))]
pub enum Speaker {}

#[cfg(not(feature = "audio"))]
impl Speaker {
    pub fn new() -> crate::error::Result<Self> {
        Err(crate::error::Error::Audio("built without the `audio` feature".into()))
    }
}

#[cfg(not(feature = "audio"))]
impl Sound for Speaker {
    fn on_eat(&self) {
        match *self {}
    }

    fn on_game_over(&self) {
        match *self {}
    }
}

#[cfg(test)]
pub use recorder::Recorder;
