//! Audio beacon guidance.
//!
//! A beacon marks a single destination with a continuous tone the
//! listener can walk toward. [`BeaconGuide`] owns the state machine:
//! it follows location updates, keeps the tone positioned on the
//! listener's audio plane, crossfades between the on-course and
//! off-course loops as they turn, speaks the remaining distance at
//! intervals, and ends guidance with a chime when they arrive. The
//! tone itself renders through a host-supplied [`BeaconAudioBackend`].

mod audio;
mod guide;

pub use audio::BeaconAudioBackend;
pub use guide::{on_course, BeaconEvent, BeaconGuide, BeaconSnapshot};

#[cfg(test)]
pub use audio::tests::RecordingBeaconAudio;
