//! Output seam for the continuous beacon tone.

use std::future::Future;

use crate::audio::AudioError;
use crate::geo::Offset;

/// Renders the looping beacon tone.
///
/// A beacon plays as a pair of synchronized loops, one audible when the
/// listener faces the target and one when they do not. The backend owns
/// both loops and their crossfade; [`BeaconGuide`](super::BeaconGuide)
/// drives it with plane positions and course changes as location updates
/// arrive.
pub trait BeaconAudioBackend: Send + Sync + 'static {
    /// Starts both loops with the off-course tone audible. Resolves once
    /// the loops are running.
    fn start_loops(&self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Moves the beacon tone to `offset` on the listener's audio plane.
    fn set_position(&self, offset: Offset);

    /// Crossfades to the on-course tone when `on_course` is true, back to
    /// the off-course tone otherwise.
    fn set_on_course(&self, on_course: bool);

    /// Stops both loops.
    fn stop_loops(&self);
}

impl<T: BeaconAudioBackend> BeaconAudioBackend for std::sync::Arc<T> {
    fn start_loops(&self) -> impl Future<Output = Result<(), AudioError>> + Send {
        (**self).start_loops()
    }

    fn set_position(&self, offset: Offset) {
        (**self).set_position(offset);
    }

    fn set_on_course(&self, on_course: bool) {
        (**self).set_on_course(on_course);
    }

    fn stop_loops(&self) {
        (**self).stop_loops();
    }
}
