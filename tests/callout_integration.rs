//! Integration tests for nearby callouts.
//!
//! These tests drive the full path a callout takes: tile payloads
//! fetched over a mock transport, parsed and cached by the loader,
//! ranked by the resolver, and rendered through the audio queue. They
//! verify:
//! - Queries answer from cache and grow more complete as loads land
//! - Spoken labels, ordering, and render-time distance suffixes
//! - The ambient watch and its recently-announced dedup window
//! - Nearest-road requests and the callout event stream
//!
//! Run with: `cargo test --test callout_integration`

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use earshot::announce::{Announcer, NONE_FOUND_MESSAGE};
use earshot::audio::{AudioBackend, AudioError, AudioQueue, SoundAsset, SpeechSettings};
use earshot::config::WayfindConfig;
use earshot::geo::{Offset, Position};
use earshot::loader::{LoadError, TileClient, TileLoader};
use earshot::location::SharedLocation;
use earshot::resolver::NearbyResolver;
use earshot::store::{FeatureStore, MemoryFeatureStore};
use earshot::tile::Tile;

// ============================================================================
// Mock Implementations
// ============================================================================

/// Tile client serving canned bodies keyed by URL.
#[derive(Clone, Default)]
struct MapTileClient {
    responses: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MapTileClient {
    fn new() -> Self {
        Self::default()
    }

    fn serve(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TileClient for MapTileClient {
    fn fetch_tile(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send {
        self.requests.lock().unwrap().push(url.to_string());
        let response = self.responses.lock().unwrap().get(url).cloned();
        async move {
            match response {
                Some(body) => Ok(body.into_bytes()),
                None => Err(LoadError::Http(format!("HTTP 404 Not Found: {url}"))),
            }
        }
    }
}

/// Audio backend that records renders instead of making noise.
#[derive(Clone, Default)]
struct CapturingAudio {
    sounds: Arc<Mutex<Vec<SoundAsset>>>,
    speeches: Arc<Mutex<Vec<String>>>,
}

impl CapturingAudio {
    fn new() -> Self {
        Self::default()
    }

    fn sounds(&self) -> Vec<SoundAsset> {
        self.sounds.lock().unwrap().clone()
    }

    fn speeches(&self) -> Vec<String> {
        self.speeches.lock().unwrap().clone()
    }
}

impl AudioBackend for CapturingAudio {
    type Buffer = SoundAsset;

    fn load_sound(
        &self,
        asset: SoundAsset,
    ) -> impl Future<Output = Result<Self::Buffer, AudioError>> + Send {
        async move { Ok(asset) }
    }

    fn play_sound(
        &self,
        buffer: &Self::Buffer,
        _offset: Offset,
    ) -> impl Future<Output = Result<(), AudioError>> + Send {
        self.sounds.lock().unwrap().push(*buffer);
        async { Ok(()) }
    }

    fn speak(
        &self,
        text: &str,
        _settings: &SpeechSettings,
        _offset: Offset,
    ) -> impl Future<Output = Result<(), AudioError>> + Send {
        self.speeches.lock().unwrap().push(text.to_string());
        async { Ok(()) }
    }

    fn stop_all(&self) {}
}

// ============================================================================
// Test Fixtures
// ============================================================================

const BASE_URL: &str = "https://tiles.example.test";

/// Outside Union Station; the neighborhood every test walks.
const UNION_STATION: (f64, f64) = (38.8976, -77.006156);

/// The feature tile around Union Station: two cafes, two named roads,
/// the crossing where they meet, and a bus stop that stays silent.
fn union_station_payload() -> &'static str {
    r#"{"features": [
        {
            "osm_ids": [9561113666],
            "feature_type": "amenity",
            "feature_value": "cafe",
            "geometry": {"type": "Point", "coordinates": [-77.006156, 38.8977508]},
            "properties": {"name": "Blue Bottle Coffee"}
        },
        {
            "osm_ids": [11096431638],
            "feature_type": "amenity",
            "feature_value": "cafe",
            "geometry": {"type": "Point", "coordinates": [-77.0066, 38.8974]},
            "properties": {"name": "The Bingsu"}
        },
        {
            "osm_ids": [101],
            "feature_type": "highway",
            "feature_value": "residential",
            "geometry": {"type": "LineString", "coordinates": [[-77.00629, 38.8969], [-77.00629, 38.8984]]},
            "properties": {"name": "First Street Northeast"}
        },
        {
            "osm_ids": [102],
            "feature_type": "highway",
            "feature_value": "primary",
            "geometry": {"type": "LineString", "coordinates": [[-77.008, 38.8970], [-77.004, 38.8970]]},
            "properties": {"name": "Massachusetts Avenue Northeast"}
        },
        {
            "osm_ids": [101, 102],
            "feature_type": "highway",
            "feature_value": "gd_intersection",
            "geometry": {"type": "Point", "coordinates": [-77.00629, 38.8970]},
            "properties": {}
        },
        {
            "osm_ids": [106],
            "feature_type": "highway",
            "feature_value": "bus_stop",
            "geometry": {"type": "Point", "coordinates": [-77.00617, 38.89765]},
            "properties": {"name": "Union Station Stop"}
        }
    ]}"#
}

struct CalloutStack {
    announcer: Announcer<MapTileClient, CapturingAudio>,
    queue: AudioQueue<CapturingAudio>,
    audio: CapturingAudio,
    location: SharedLocation,
    store: Arc<MemoryFeatureStore>,
    client: MapTileClient,
}

fn create_stack() -> CalloutStack {
    let client = MapTileClient::new();
    let store = Arc::new(MemoryFeatureStore::new());
    let config = WayfindConfig::default().with_tile_server(BASE_URL);
    let loader = Arc::new(TileLoader::new(
        client.clone(),
        store.clone() as Arc<dyn FeatureStore>,
        config.tile_max_age,
    ));
    let resolver = Arc::new(NearbyResolver::new(
        loader,
        store.clone() as Arc<dyn FeatureStore>,
        &config,
    ));
    let audio = CapturingAudio::new();
    let location = SharedLocation::new();
    let queue = AudioQueue::new(audio.clone(), location.clone());
    let announcer = Announcer::new(resolver, queue.clone(), location.clone(), &config);
    CalloutStack {
        announcer,
        queue,
        audio,
        location,
        store,
        client,
    }
}

fn serve_union_station(stack: &CalloutStack) {
    let tile = Tile::containing(UNION_STATION.0, UNION_STATION.1, BASE_URL).unwrap();
    stack.client.serve(tile.url(), union_station_payload());
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

async fn wait_until_idle(queue: &AudioQueue<CapturingAudio>) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while queue.is_playing() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("queue did not go idle in time");
}

/// Runs a throwaway query so the tile loads land, then waits for them.
async fn warm_cache(stack: &CalloutStack) {
    let queued = stack
        .announcer
        .callout_all_features(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    assert!(!queued, "the cache should start empty");
    let store = Arc::clone(&stack.store);
    wait_for(move || store.feature_count().unwrap() == 6).await;
}

// ============================================================================
// Callout Flow Tests
// ============================================================================

/// Test that queries answer immediately and grow complete as loads
/// land, and that the tile is fetched only once across queries.
#[tokio::test]
async fn test_callouts_complete_once_tiles_land() {
    let stack = create_stack();
    serve_union_station(&stack);
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);

    warm_cache(&stack).await;

    let queued = stack
        .announcer
        .callout_all_features(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    assert!(queued);
    wait_until_idle(&stack.queue).await;

    // Closest first: the cafes, then the crossing. Road segments and
    // the bus stop stay silent.
    assert_eq!(
        stack.audio.speeches(),
        vec![
            "Blue Bottle Coffee, 55 feet",
            "The Bingsu, 146 feet",
            "Intersection: First Street Northeast, Massachusetts Avenue Northeast, 222 feet",
        ]
    );
    assert_eq!(
        stack.audio.sounds(),
        vec![
            SoundAsset::SensePoi,
            SoundAsset::SensePoi,
            SoundAsset::SensePoi
        ]
    );
    assert_eq!(stack.client.request_count(), 1);
}

/// Test that an explicit callout in an uncharted area says so.
#[tokio::test]
async fn test_none_found_fallback() {
    let stack = create_stack();
    let tile = Tile::containing(UNION_STATION.0, UNION_STATION.1, BASE_URL).unwrap();
    stack.client.serve(tile.url(), r#"{"features": []}"#);
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);

    stack
        .announcer
        .callout_all_features_or_none_found(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    wait_until_idle(&stack.queue).await;

    assert_eq!(stack.audio.speeches(), vec![NONE_FOUND_MESSAGE]);
    assert!(stack.audio.sounds().is_empty());
}

/// Test that the ambient watch announces a feature once as the
/// listener walks past it, without a distance suffix.
#[tokio::test]
async fn test_watch_announces_new_features_once() {
    let stack = create_stack();
    serve_union_station(&stack);

    stack.announcer.start_watching();
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);
    let store = Arc::clone(&stack.store);
    wait_for(move || store.feature_count().unwrap() == 6).await;

    // A step toward the cafe brings it inside the ambient radius.
    stack.location.set_location(38.89761, -77.006156);
    let audio = stack.audio.clone();
    wait_for(move || audio.speeches() == vec!["Blue Bottle Coffee"]).await;

    // Lingering there does not repeat the announcement.
    stack.location.set_location(38.89761, -77.006156);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stack.audio.speeches(), vec!["Blue Bottle Coffee"]);
}

/// Test that stopping the watch halts ambient callouts while leaving
/// explicit requests working.
#[tokio::test]
async fn test_stop_watching_halts_ambient_callouts() {
    let stack = create_stack();
    serve_union_station(&stack);

    stack.announcer.start_watching();
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);
    let store = Arc::clone(&stack.store);
    wait_for(move || store.feature_count().unwrap() == 6).await;

    stack.location.set_location(38.89761, -77.006156);
    let audio = stack.audio.clone();
    wait_for(move || audio.speeches() == vec!["Blue Bottle Coffee"]).await;

    stack.announcer.stop_watching();

    // Walking up to the other cafe now stays silent.
    stack.location.set_location(38.8974, -77.0064);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stack.audio.speeches(), vec!["Blue Bottle Coffee"]);

    // The cafe was eligible; an explicit request still speaks it.
    stack
        .announcer
        .callout_new_features(38.8974, -77.0064)
        .await
        .unwrap();
    wait_until_idle(&stack.queue).await;
    assert_eq!(
        stack.audio.speeches(),
        vec!["Blue Bottle Coffee", "The Bingsu"]
    );
}

/// Test the nearest-road request end to end.
#[tokio::test]
async fn test_nearest_road_request() {
    let stack = create_stack();
    serve_union_station(&stack);
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);

    // First request finds an empty cache and schedules the loads.
    stack
        .announcer
        .callout_nearest_road(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    let store = Arc::clone(&stack.store);
    wait_for(move || store.feature_count().unwrap() == 6).await;
    assert!(stack.audio.speeches().is_empty());

    stack
        .announcer
        .callout_nearest_road(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    wait_until_idle(&stack.queue).await;

    assert_eq!(stack.audio.sounds(), vec![SoundAsset::SenseMobility]);
    assert_eq!(
        stack.audio.speeches(),
        vec!["Nearest road: First Street Northeast, 38 feet"]
    );
}

/// Test that anchored callouts are published on the event stream with
/// their final spoken text.
#[tokio::test]
async fn test_callout_event_stream() {
    let stack = create_stack();
    serve_union_station(&stack);
    stack.location.set_location(UNION_STATION.0, UNION_STATION.1);
    let mut callouts = stack.queue.subscribe_callouts();

    warm_cache(&stack).await;
    stack
        .announcer
        .callout_all_features(UNION_STATION.0, UNION_STATION.1)
        .await
        .unwrap();
    wait_until_idle(&stack.queue).await;

    let first = callouts.try_recv().unwrap();
    assert_eq!(first.text, "Blue Bottle Coffee, 55 feet");
    assert_eq!(first.location, Position::new(38.8977508, -77.006156));

    let second = callouts.try_recv().unwrap();
    assert_eq!(second.text, "The Bingsu, 146 feet");

    let third = callouts.try_recv().unwrap();
    assert!(third.text.starts_with("Intersection:"));
    assert!(callouts.try_recv().is_err());
}
