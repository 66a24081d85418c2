//! Types describing the listener's whereabouts.

use crate::geo::Position;

/// A complete location fix: where the listener is and which way they
/// face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Heading in degrees clockwise from true north.
    pub heading: f64,
}

impl LocationFix {
    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}
