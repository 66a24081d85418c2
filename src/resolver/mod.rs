//! Nearby feature queries.
//!
//! The resolver answers "what is around this position" from whatever
//! the store holds right now, while kicking off background loads for
//! every tile the query touches. Answers are immediate and grow more
//! complete as loads land; callers re-query as the listener moves, so
//! coverage catches up on its own.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::SoundAsset;
use crate::config::WayfindConfig;
use crate::feature::{Feature, Geometry};
use crate::geo::{self, GeoError, Position};
use crate::loader::{TileClient, TileLoader};
use crate::store::FeatureStore;
use crate::tile;

/// Road classes eligible for nearest-road callouts.
const CALLOUT_ROAD_VALUES: [&str; 3] = ["primary", "residential", "tertiary"];

/// A cached feature plus the geometry derived to announce it.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyFeature {
    pub feature: Feature,
    /// The point distance and direction are measured against: the
    /// nearest point for roads, the centroid for everything else.
    pub reference: Position,
    /// Distance from the query origin, in meters.
    pub distance: f64,
    /// Marker sound an announcement of this feature leads with.
    pub sound: SoundAsset,
}

/// Answers nearby-feature queries against the tile cache.
pub struct NearbyResolver<C: TileClient> {
    loader: Arc<TileLoader<C>>,
    store: Arc<dyn FeatureStore>,
    tile_server: String,
}

impl<C: TileClient> NearbyResolver<C> {
    pub fn new(
        loader: Arc<TileLoader<C>>,
        store: Arc<dyn FeatureStore>,
        config: &WayfindConfig,
    ) -> Self {
        Self {
            loader,
            store,
            tile_server: config.tile_server.clone(),
        }
    }

    /// Returns cached features within `radius_meters` of a position,
    /// closest first.
    ///
    /// Every tile under the radius is scheduled for a background load;
    /// the reply itself never waits on the network. Tiles whose store
    /// read fails contribute nothing to this pass.
    pub async fn nearby_features(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<NearbyFeature>, GeoError> {
        let tiles = tile::tiles_around(latitude, longitude, radius_meters, &self.tile_server)?;
        let origin = Position::new(latitude, longitude);

        let mut candidates = Vec::new();
        for tile in tiles {
            let loader = Arc::clone(&self.loader);
            let pending = tile.clone();
            tokio::spawn(async move {
                // The loader logs its own failures.
                let _ = loader.load(&pending).await;
            });

            match self.store.features(tile.key()) {
                Ok(features) => candidates.extend(features),
                Err(error) => {
                    warn!(tile = %tile.key(), %error, "feature store read failed");
                }
            }
        }

        let mut nearby: Vec<NearbyFeature> = candidates
            .into_iter()
            .filter_map(|feature| {
                let reference = feature.reference_point(&origin)?;
                let distance = geo::haversine_distance(&origin, &reference);
                Some(NearbyFeature {
                    feature,
                    reference,
                    distance,
                    sound: SoundAsset::SensePoi,
                })
            })
            .filter(|nearby| nearby.distance < radius_meters)
            .collect();

        nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(nearby)
    }

    /// Returns named, callout-worthy roads within the radius, closest
    /// first.
    pub async fn nearby_roads(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<NearbyFeature>, GeoError> {
        let mut features = self
            .nearby_features(latitude, longitude, radius_meters)
            .await?;
        features.retain(|nearby| is_callout_road(&nearby.feature));
        Ok(features)
    }

    /// What to speak for a feature, or `None` for features that stay
    /// silent: unnamed points, bus stops, and individual road segments.
    pub fn audio_label(&self, feature: &Feature) -> Option<String> {
        match feature.feature_type.as_str() {
            "highway" => match feature.feature_value.as_str() {
                "gd_intersection" => self.intersection_label(feature),
                _ => None,
            },
            _ => feature.name().map(str::to_string),
        }
    }

    /// Builds "Intersection: A, B" from the roads a merged intersection
    /// references. Name order follows the id order on the record.
    fn intersection_label(&self, intersection: &Feature) -> Option<String> {
        let mut names: Vec<String> = Vec::new();
        for osm_id in &intersection.osm_ids {
            match self.store.feature_by_osm_id(*osm_id) {
                Ok(Some(road)) => {
                    if let Some(name) = road.name() {
                        if !names.iter().any(|known| known == name) {
                            names.push(name.to_string());
                        }
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(osm_id, %error, "road name lookup failed");
                }
            }
        }

        // A crossing is only worth speaking when two differently named
        // roads actually meet there.
        if names.len() > 1 {
            Some(format!("Intersection: {}", names.join(", ")))
        } else {
            None
        }
    }
}

fn is_callout_road(feature: &Feature) -> bool {
    feature.feature_type == "highway"
        && matches!(feature.geometry, Geometry::LineString(_))
        && CALLOUT_ROAD_VALUES.contains(&feature.feature_value.as_str())
        && feature.name().is_some()
}
