//! Listener location state.
//!
//! # Architecture
//!
//! The host platform owns the actual positioning hardware and feeds
//! fixes in through [`SharedLocation::set_location`] and
//! [`SharedLocation::set_heading`]. Everything else in the crate
//! consumes location two ways:
//!
//! - **Pull**: [`LocationProvider::snapshot`] for the current fix, used
//!   when spatializing audio at playback time.
//! - **Push**: [`LocationBroadcaster::subscribe`] for a stream of
//!   fixes, used by the announcer's watch loop and the beacon.
//!
//! # Usage
//!
//! ```ignore
//! let location = SharedLocation::new();
//! location.set_location(38.8976, -77.006156);
//! location.set_heading(90.0);
//!
//! let mut updates = location.subscribe();
//! while let Ok(fix) = updates.recv().await {
//!     // react to movement
//! }
//! ```

mod types;

pub use types::LocationFix;

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::geo::{self, DistanceUnits, Offset, Position};

/// Pull access to the most recent location fix.
pub trait LocationProvider: Send + Sync {
    /// The current fix, or `None` before the first location arrives.
    fn snapshot(&self) -> Option<LocationFix>;

    /// Whether a location has ever been set.
    fn has_fix(&self) -> bool;
}

/// Push access to the stream of location fixes.
pub trait LocationBroadcaster: Send + Sync {
    /// Subscribes to fixes published from now on.
    fn subscribe(&self) -> broadcast::Receiver<LocationFix>;
}

#[derive(Debug, Default)]
struct LocationState {
    latitude: Option<f64>,
    longitude: Option<f64>,
    heading: f64,
}

/// Shared location state, cheap to clone and safe across tasks.
///
/// A fix is published on every location update, and on every heading
/// update once a position is known. Heading set before the first
/// position is kept but not published; there is nothing to announce
/// relative to yet.
#[derive(Debug, Clone)]
pub struct SharedLocation {
    state: Arc<RwLock<LocationState>>,
    updates: broadcast::Sender<LocationFix>,
}

impl SharedLocation {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(32);
        Self {
            state: Arc::new(RwLock::new(LocationState::default())),
            updates,
        }
    }

    /// Records a new position and publishes the resulting fix.
    pub fn set_location(&self, latitude: f64, longitude: f64) {
        let fix = match self.state.write() {
            Ok(mut state) => {
                state.latitude = Some(latitude);
                state.longitude = Some(longitude);
                LocationFix {
                    latitude,
                    longitude,
                    heading: state.heading,
                }
            }
            Err(_) => return,
        };
        let _ = self.updates.send(fix);
    }

    /// Records a new heading and publishes a fix if a position is
    /// known.
    pub fn set_heading(&self, heading: f64) {
        let fix = match self.state.write() {
            Ok(mut state) => {
                state.heading = heading;
                match (state.latitude, state.longitude) {
                    (Some(latitude), Some(longitude)) => Some(LocationFix {
                        latitude,
                        longitude,
                        heading,
                    }),
                    _ => None,
                }
            }
            Err(_) => return,
        };
        if let Some(fix) = fix {
            let _ = self.updates.send(fix);
        }
    }

    /// Distance from the listener to a target, or `None` before the
    /// first fix.
    pub fn distance_to(&self, target: &Position, units: DistanceUnits) -> Option<f64> {
        let fix = self.snapshot()?;
        Some(geo::distance_between(&fix.position(), target, units))
    }

    /// Audio-plane offset of a target relative to the listener.
    pub fn relative_offset_to(&self, target: &Position) -> Option<Offset> {
        let fix = self.snapshot()?;
        Some(geo::relative_offset(&fix.position(), fix.heading, target))
    }

    /// Unit-circle offset of a target relative to the listener.
    pub fn normalized_offset_to(&self, target: &Position) -> Option<Offset> {
        let fix = self.snapshot()?;
        Some(geo::normalized_offset(&fix.position(), fix.heading, target))
    }
}

impl Default for SharedLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for SharedLocation {
    fn snapshot(&self) -> Option<LocationFix> {
        self.state
            .read()
            .ok()
            .and_then(|state| match (state.latitude, state.longitude) {
                (Some(latitude), Some(longitude)) => Some(LocationFix {
                    latitude,
                    longitude,
                    heading: state.heading,
                }),
                _ => None,
            })
    }

    fn has_fix(&self) -> bool {
        self.snapshot().is_some()
    }
}

impl LocationBroadcaster for SharedLocation {
    fn subscribe(&self) -> broadcast::Receiver<LocationFix> {
        self.updates.subscribe()
    }
}

impl LocationProvider for Arc<SharedLocation> {
    fn snapshot(&self) -> Option<LocationFix> {
        (**self).snapshot()
    }

    fn has_fix(&self) -> bool {
        (**self).has_fix()
    }
}

impl LocationBroadcaster for Arc<SharedLocation> {
    fn subscribe(&self) -> broadcast::Receiver<LocationFix> {
        (**self).subscribe()
    }
}
