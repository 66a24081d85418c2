//! Configuration for the wayfinding engine.

use std::time::Duration;

/// Default tile server features are fetched from.
pub const DEFAULT_TILE_SERVER: &str = "https://tiles.soundscape.services";

/// How long a cached tile stays fresh. (7 days)
pub const DEFAULT_TILE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Radius in meters scanned for automatic callouts.
pub const DEFAULT_CALLOUT_RADIUS_METERS: f64 = 40.0;

/// How many announced features the dedup window remembers.
pub const DEFAULT_RECENT_CALLOUT_CAP: usize = 100;

/// Tunables for tile loading and nearby callouts.
#[derive(Debug, Clone, PartialEq)]
pub struct WayfindConfig {
    /// Base URL of the feature tile server, without a trailing slash.
    pub tile_server: String,
    /// Cached tiles older than this are purged and refetched.
    pub tile_max_age: Duration,
    /// Radius in meters for automatic callouts. Explicit "what's around
    /// me" requests scan twice this.
    pub callout_radius_meters: f64,
    /// Size of the recently-announced window used to skip repeats.
    pub recent_callout_cap: usize,
}

impl Default for WayfindConfig {
    fn default() -> Self {
        Self {
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            tile_max_age: DEFAULT_TILE_MAX_AGE,
            callout_radius_meters: DEFAULT_CALLOUT_RADIUS_METERS,
            recent_callout_cap: DEFAULT_RECENT_CALLOUT_CAP,
        }
    }
}

impl WayfindConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_server(mut self, tile_server: impl Into<String>) -> Self {
        self.tile_server = tile_server.into();
        self
    }

    pub fn with_tile_max_age(mut self, max_age: Duration) -> Self {
        self.tile_max_age = max_age;
        self
    }

    pub fn with_callout_radius(mut self, meters: f64) -> Self {
        self.callout_radius_meters = meters;
        self
    }

    pub fn with_recent_callout_cap(mut self, cap: usize) -> Self {
        self.recent_callout_cap = cap;
        self
    }
}

/// Tunables for beacon guidance.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconConfig {
    /// Half-angle of the on-course cone, in degrees. Inside the cone
    /// the steady tone plays; outside, the searching tone.
    pub on_course_angle: f64,
    /// Arriving within this many meters of the beacon ends guidance.
    pub found_proximity_meters: f64,
    /// Spoken distance updates wait for at least this much change in
    /// meters.
    pub announce_every_meters: f64,
    /// How often the on/off-course tone mix is re-evaluated.
    pub crossfade_interval: Duration,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            on_course_angle: 30.0,
            found_proximity_meters: 10.0,
            announce_every_meters: 50.0,
            crossfade_interval: Duration::from_secs(1),
        }
    }
}

impl BeaconConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_course_angle(mut self, degrees: f64) -> Self {
        self.on_course_angle = degrees;
        self
    }

    pub fn with_found_proximity(mut self, meters: f64) -> Self {
        self.found_proximity_meters = meters;
        self
    }

    pub fn with_announce_every(mut self, meters: f64) -> Self {
        self.announce_every_meters = meters;
        self
    }

    pub fn with_crossfade_interval(mut self, interval: Duration) -> Self {
        self.crossfade_interval = interval;
        self
    }
}
