//! Turns nearby features into queued audio.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace, warn};

use crate::announce::RecentCallouts;
use crate::audio::{AudioBackend, AudioQueue, QueueItem, SoundAsset};
use crate::config::WayfindConfig;
use crate::geo::GeoError;
use crate::loader::TileClient;
use crate::location::{LocationBroadcaster, SharedLocation};
use crate::resolver::{NearbyFeature, NearbyResolver};

/// Spoken when an explicit callout request finds nothing.
pub const NONE_FOUND_MESSAGE: &str = "Nothing to call out right now";

/// Announces nearby features, on demand and while the listener moves.
///
/// Three explicit request shapes plus one ambient mode:
///
/// - [`callout_all_features`](Self::callout_all_features): everything
///   announceable around a position, distances included.
/// - [`callout_nearest_road`](Self::callout_nearest_road): the closest
///   callout-worthy road.
/// - [`callout_new_features`](Self::callout_new_features): features not
///   announced recently, used by the ambient watch.
/// - [`start_watching`](Self::start_watching): runs the new-feature
///   callout on every location update until stopped.
pub struct Announcer<C: TileClient, B: AudioBackend> {
    resolver: Arc<NearbyResolver<C>>,
    queue: AudioQueue<B>,
    location: SharedLocation,
    recent: Arc<Mutex<RecentCallouts>>,
    callout_radius: f64,
    /// Bumped by every start and stop; the watch task stands down when
    /// the epoch moves past the one it was started with.
    watch_epoch: Arc<AtomicU64>,
}

impl<C: TileClient, B: AudioBackend> Clone for Announcer<C, B> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            queue: self.queue.clone(),
            location: self.location.clone(),
            recent: Arc::clone(&self.recent),
            callout_radius: self.callout_radius,
            watch_epoch: Arc::clone(&self.watch_epoch),
        }
    }
}

impl<C: TileClient, B: AudioBackend> Announcer<C, B> {
    pub fn new(
        resolver: Arc<NearbyResolver<C>>,
        queue: AudioQueue<B>,
        location: SharedLocation,
        config: &WayfindConfig,
    ) -> Self {
        Self {
            resolver,
            queue,
            location,
            recent: Arc::new(Mutex::new(RecentCallouts::new(config.recent_callout_cap))),
            callout_radius: config.callout_radius_meters,
            watch_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Announces everything announceable around a position, closest
    /// first and with distances, scanning twice the automatic radius.
    /// Returns whether anything was queued.
    pub async fn callout_all_features(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<bool, GeoError> {
        let nearby = self
            .resolver
            .nearby_features(latitude, longitude, self.callout_radius * 2.0)
            .await?;

        let mut queued = false;
        for feature in &nearby {
            if self.announce(feature, true) {
                queued = true;
            }
        }
        debug!(candidates = nearby.len(), queued, "callout scan complete");
        Ok(queued)
    }

    /// Like [`callout_all_features`](Self::callout_all_features), but
    /// speaks a fallback line when there is nothing to announce.
    pub async fn callout_all_features_or_none_found(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), GeoError> {
        if !self.callout_all_features(latitude, longitude).await? {
            self.queue.enqueue(QueueItem::speech(NONE_FOUND_MESSAGE));
        }
        Ok(())
    }

    /// Announces features within the automatic radius that have not
    /// been announced recently. No distance suffix; these fire while
    /// the listener is moving.
    pub async fn callout_new_features(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), GeoError> {
        let nearby = self
            .resolver
            .nearby_features(latitude, longitude, self.callout_radius)
            .await?;

        for feature in &nearby {
            if self.recent.lock().unwrap().contains(&feature.feature.osm_ids) {
                continue;
            }
            self.announce(feature, false);
        }
        Ok(())
    }

    /// Announces the closest callout-worthy road, with distance.
    pub async fn callout_nearest_road(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), GeoError> {
        let roads = self
            .resolver
            .nearby_roads(latitude, longitude, self.callout_radius)
            .await?;

        if let Some(road) = roads.first() {
            if let Some(name) = road.feature.name() {
                self.queue.play_sound_and_speech(
                    SoundAsset::SenseMobility,
                    format!("Nearest road: {}", name),
                    Some(road.reference),
                    true,
                );
            }
        }
        Ok(())
    }

    /// Starts the ambient watch: every location update triggers a
    /// new-feature callout. Starting again replaces the running watch.
    pub fn start_watching(&self) {
        let epoch = self.watch_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let announcer = self.clone();
        let mut updates = self.location.subscribe();

        tokio::spawn(async move {
            debug!("callout watch started");
            loop {
                if announcer.watch_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                match updates.recv().await {
                    Ok(fix) => {
                        if announcer.watch_epoch.load(Ordering::SeqCst) != epoch {
                            break;
                        }
                        if let Err(error) = announcer
                            .callout_new_features(fix.latitude, fix.longitude)
                            .await
                        {
                            warn!(%error, "watched callout failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "callout watch missed location updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("callout watch stopped");
        });
    }

    /// Stops the ambient watch. Queued audio is unaffected.
    pub fn stop_watching(&self) {
        self.watch_epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Queues one feature's marker sound and label. Returns false for
    /// features with nothing to say.
    fn announce(&self, nearby: &NearbyFeature, include_distance: bool) -> bool {
        let Some(label) = self.resolver.audio_label(&nearby.feature) else {
            return false;
        };
        self.recent.lock().unwrap().add(&nearby.feature.osm_ids);
        self.queue
            .play_sound_and_speech(nearby.sound, label, Some(nearby.reference), include_distance);
        true
    }
}
