//! The sequential audio queue.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::audio::{AudioBackend, AudioError, CalloutEvent, QueueItem, SoundAsset, SpeechSettings};
use crate::geo::{DistanceUnits, Offset, Position};
use crate::location::SharedLocation;

/// Speech rate never drops below this.
const MIN_SPEECH_RATE: f32 = 1.0;

struct QueueState<B: AudioBackend> {
    items: VecDeque<QueueItem>,
    playing: bool,
    /// Bumped by every flush; a drain task from an older epoch stands
    /// down the next time it looks at the queue.
    epoch: u64,
    settings: SpeechSettings,
    sounds: HashMap<SoundAsset, Arc<B::Buffer>>,
}

/// Plays queued sounds and speech one at a time, spatialized against
/// the listener's position at the moment each item renders.
///
/// Enqueueing is synchronous and non-blocking: the first item queued
/// while idle spawns a drain task on the current tokio runtime, so the
/// queue must be used from within one. Items render in arrival order
/// and never overlap.
pub struct AudioQueue<B: AudioBackend> {
    backend: Arc<B>,
    location: SharedLocation,
    state: Arc<Mutex<QueueState<B>>>,
    callouts: broadcast::Sender<CalloutEvent>,
}

impl<B: AudioBackend> Clone for AudioQueue<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            location: self.location.clone(),
            state: Arc::clone(&self.state),
            callouts: self.callouts.clone(),
        }
    }
}

impl<B: AudioBackend> AudioQueue<B> {
    pub fn new(backend: B, location: SharedLocation) -> Self {
        let (callouts, _) = broadcast::channel(32);
        Self {
            backend: Arc::new(backend),
            location,
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::new(),
                playing: false,
                epoch: 0,
                settings: SpeechSettings::default(),
                sounds: HashMap::new(),
            })),
            callouts,
        }
    }

    /// Appends an item to the queue, starting playback if idle.
    pub fn enqueue(&self, item: QueueItem) {
        let start = {
            let mut state = self.state.lock().unwrap();
            state.items.push_back(item);
            if state.playing {
                false
            } else {
                state.playing = true;
                true
            }
        };
        if start {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }
    }

    /// Queues the usual callout pair: a marker sound, then speech.
    pub fn play_sound_and_speech(
        &self,
        asset: SoundAsset,
        text: impl Into<String>,
        location: Option<Position>,
        include_distance: bool,
    ) {
        self.enqueue(QueueItem::Sound { asset, location });
        self.enqueue(QueueItem::Speech {
            text: text.into(),
            location,
            include_distance,
        });
    }

    /// Whether the queue is currently draining.
    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    /// Drops every pending item and cuts off the current one.
    pub fn flush_and_stop(&self) {
        {
            let mut state = self.state.lock().unwrap();
            let dropped = state.items.len();
            state.items.clear();
            state.playing = false;
            state.epoch += 1;
            debug!(dropped, "audio queue flushed");
        }
        self.backend.stop_all();
    }

    /// Subscribes to place-anchored callouts as they are spoken.
    pub fn subscribe_callouts(&self) -> broadcast::Receiver<CalloutEvent> {
        self.callouts.subscribe()
    }

    /// Sets the synthesizer voice. `None` returns to the platform
    /// default.
    pub fn set_voice(&self, voice: Option<String>) {
        self.state.lock().unwrap().settings.voice = voice;
    }

    pub fn speech_rate(&self) -> f32 {
        self.state.lock().unwrap().settings.rate
    }

    /// Raises the speech rate by one step and returns the new rate.
    pub fn increase_speech_rate(&self) -> f32 {
        let mut state = self.state.lock().unwrap();
        state.settings.rate += 1.0;
        state.settings.rate
    }

    /// Lowers the speech rate by one step, stopping at the minimum, and
    /// returns the new rate.
    pub fn decrease_speech_rate(&self) -> f32 {
        let mut state = self.state.lock().unwrap();
        state.settings.rate = (state.settings.rate - 1.0).max(MIN_SPEECH_RATE);
        state.settings.rate
    }

    async fn drain(&self) {
        let epoch = self.state.lock().unwrap().epoch;
        loop {
            let item = {
                let mut state = self.state.lock().unwrap();
                if state.epoch != epoch {
                    // Flushed; whoever bumped the epoch owns the queue.
                    return;
                }
                match state.items.pop_front() {
                    Some(item) => item,
                    None => {
                        state.playing = false;
                        return;
                    }
                }
            };
            if let Err(error) = self.render(item).await {
                warn!(%error, "skipping failed audio item");
            }
        }
    }

    async fn render(&self, item: QueueItem) -> Result<(), AudioError> {
        match item {
            QueueItem::Sound { asset, location } => {
                let offset = self.offset_for(location.as_ref());
                let buffer = self.sound_buffer(asset).await?;
                self.backend.play_sound(&buffer, offset).await
            }
            QueueItem::Speech {
                text,
                location,
                include_distance,
            } => {
                let offset = self.offset_for(location.as_ref());

                let mut spoken = text;
                if include_distance {
                    if let Some(target) = location.as_ref() {
                        if let Some(feet) = self.location.distance_to(target, DistanceUnits::Feet)
                        {
                            spoken = format!("{}, {:.0} feet", spoken, feet);
                        }
                    }
                }

                if let Some(target) = location {
                    let _ = self.callouts.send(CalloutEvent {
                        text: spoken.clone(),
                        location: target,
                    });
                }

                let settings = self.state.lock().unwrap().settings.clone();
                self.backend.speak(&spoken, &settings, offset).await
            }
        }
    }

    /// Where an item sounds from, as of right now. Unanchored items and
    /// items rendered before the first fix play centered.
    fn offset_for(&self, location: Option<&Position>) -> Offset {
        location
            .and_then(|target| self.location.normalized_offset_to(target))
            .unwrap_or_default()
    }

    async fn sound_buffer(&self, asset: SoundAsset) -> Result<Arc<B::Buffer>, AudioError> {
        if let Some(buffer) = self.state.lock().unwrap().sounds.get(&asset) {
            return Ok(Arc::clone(buffer));
        }
        let loaded = Arc::new(self.backend.load_sound(asset).await?);
        let mut state = self.state.lock().unwrap();
        Ok(Arc::clone(state.sounds.entry(asset).or_insert(loaded)))
    }
}
