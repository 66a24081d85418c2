//! Sequential spatial audio.
//!
//! # Architecture
//!
//! Everything the engine says goes through one [`AudioQueue`]. Items
//! are rendered strictly one at a time, in arrival order, so callouts
//! never talk over each other. Spatialization happens at render time:
//! an item anchored to a place sounds from wherever that place is
//! relative to the listener *when its turn comes*, not when it was
//! queued.
//!
//! The [`AudioBackend`] trait is the seam to the host platform's actual
//! output device and speech synthesizer.
//!
//! # Usage
//!
//! ```ignore
//! let queue = AudioQueue::new(backend, location.clone());
//! queue.play_sound_and_speech(
//!     SoundAsset::SensePoi,
//!     "Blue Bottle Coffee",
//!     Some(cafe_position),
//!     true,
//! );
//! ```

mod backend;
mod queue;
mod types;

pub use backend::AudioBackend;
pub use queue::AudioQueue;
pub use types::{AudioError, CalloutEvent, QueueItem, SoundAsset, SpeechSettings};

#[cfg(test)]
pub use backend::tests::{RecordingBackend, Rendered};
