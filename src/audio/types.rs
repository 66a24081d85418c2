//! Types for queued audio.

use thiserror::Error;

use crate::geo::Position;

/// Built-in sound effects the engine plays around speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundAsset {
    /// Precedes a point-of-interest callout.
    SensePoi,
    /// Precedes a mobility callout: roads, beacon distances.
    SenseMobility,
    /// Played once when the listener reaches a beacon.
    BeaconFound,
}

impl SoundAsset {
    /// Canonical asset file name, for backends that ship the stock
    /// sound set.
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundAsset::SensePoi => "sense_poi.wav",
            SoundAsset::SenseMobility => "sense_mobility.wav",
            SoundAsset::BeaconFound => "beacon_found.wav",
        }
    }
}

/// One entry in the audio queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem {
    /// A one-shot sound effect, optionally anchored to a place.
    Sound {
        asset: SoundAsset,
        location: Option<Position>,
    },
    /// Synthesized speech, optionally anchored to a place. When
    /// `include_distance` is set, the live distance to the anchor is
    /// appended as the item is rendered.
    Speech {
        text: String,
        location: Option<Position>,
        include_distance: bool,
    },
}

impl QueueItem {
    pub fn sound(asset: SoundAsset) -> Self {
        QueueItem::Sound {
            asset,
            location: None,
        }
    }

    pub fn sound_at(asset: SoundAsset, location: Position) -> Self {
        QueueItem::Sound {
            asset,
            location: Some(location),
        }
    }

    pub fn speech(text: impl Into<String>) -> Self {
        QueueItem::Speech {
            text: text.into(),
            location: None,
            include_distance: false,
        }
    }

    pub fn speech_at(text: impl Into<String>, location: Position, include_distance: bool) -> Self {
        QueueItem::Speech {
            text: text.into(),
            location: Some(location),
            include_distance,
        }
    }
}

/// Speech synthesis settings, mutable at runtime through the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    /// Voice identifier understood by the host synthesizer. `None`
    /// selects the platform default.
    pub voice: Option<String>,
    /// Speaking rate multiplier.
    pub rate: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 2.0,
        }
    }
}

/// A place-anchored callout, published as it is spoken. Hosts use the
/// stream to show callout history alongside the map.
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutEvent {
    /// The full spoken text, distance suffix included.
    pub text: String,
    pub location: Position,
}

/// Errors an audio backend can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The audio output device or context is unavailable.
    #[error("audio output unavailable: {0}")]
    Output(String),

    /// A sound asset could not be loaded or decoded.
    #[error("failed to load sound asset: {0}")]
    Asset(String),

    /// Speech synthesis failed.
    #[error("speech synthesis failed: {0}")]
    Speech(String),
}
