//! The platform audio seam.

use std::future::Future;

use crate::audio::{AudioError, SoundAsset, SpeechSettings};
use crate::geo::Offset;

/// Platform audio output: decoded sound playback and speech synthesis,
/// both positioned on the listener's horizontal plane.
///
/// The queue drives this trait strictly sequentially and expects each
/// playback future to resolve when the audio actually finishes; that is
/// what keeps queued callouts from talking over each other. Offsets are
/// unit-circle positions, `x` to the listener's right and `y` ahead.
pub trait AudioBackend: Send + Sync + 'static {
    /// Decoded audio ready for playback.
    type Buffer: Send + Sync + 'static;

    /// Loads and decodes a sound asset. Called once per asset; the
    /// queue caches buffers across plays.
    fn load_sound(
        &self,
        asset: SoundAsset,
    ) -> impl Future<Output = Result<Self::Buffer, AudioError>> + Send;

    /// Plays a decoded sound, resolving when playback finishes.
    fn play_sound(
        &self,
        buffer: &Self::Buffer,
        offset: Offset,
    ) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Speaks text, resolving when the utterance finishes.
    fn speak(
        &self,
        text: &str,
        settings: &SpeechSettings,
        offset: Offset,
    ) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Cuts off whatever is currently sounding. Pending queue items are
    /// the queue's concern, not the backend's.
    fn stop_all(&self);
}
