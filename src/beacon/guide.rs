//! Beacon guidance state machine.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace};

use crate::audio::{AudioBackend, AudioError, AudioQueue, QueueItem, SoundAsset};
use crate::config::BeaconConfig;
use crate::geo::{self, Position};
use crate::location::{LocationBroadcaster, LocationFix, LocationProvider, SharedLocation};

use super::audio::BeaconAudioBackend;

/// Guidance transitions, published to subscribers as they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconEvent {
    /// The beacon tone started.
    Enabled,
    /// The beacon tone stopped.
    Disabled,
    /// The listener turned onto or off the course cone.
    CourseChanged(bool),
    /// The listener reached the target.
    Arrived,
}

/// Point-in-time view of the beacon for UI surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconSnapshot {
    pub name: Option<String>,
    pub target: Option<Position>,
    pub enabled: bool,
    /// Distance spoken by the most recent announcement, in meters.
    pub last_announced_meters: Option<f64>,
}

#[derive(Debug, Default)]
struct BeaconState {
    name: Option<String>,
    target: Option<Position>,
    enabled: bool,
    /// True while the guidance task is alive, enabled or not.
    loop_running: bool,
    last_announced: Option<f64>,
    was_nearby: bool,
    on_course: Option<bool>,
}

enum FixAction {
    None,
    Arrived,
    Announce(f64),
}

/// Steers the listener toward a single target with a continuous tone.
///
/// The guide consumes location updates, keeps the tone positioned on the
/// listener's audio plane, crossfades between on-course and off-course
/// loops, announces the remaining distance at intervals, and shuts the
/// beacon down with an arrival chime once the listener gets close enough.
///
/// One guidance task runs per guide while enabled. Disabling stops the
/// tone synchronously; the task winds down on its own and a later enable
/// reuses it if it has not exited yet.
pub struct BeaconGuide<A: BeaconAudioBackend, B: AudioBackend> {
    audio: Arc<A>,
    queue: AudioQueue<B>,
    location: SharedLocation,
    config: BeaconConfig,
    state: Arc<Mutex<BeaconState>>,
    events: broadcast::Sender<BeaconEvent>,
}

impl<A: BeaconAudioBackend, B: AudioBackend> Clone for BeaconGuide<A, B> {
    fn clone(&self) -> Self {
        Self {
            audio: Arc::clone(&self.audio),
            queue: self.queue.clone(),
            location: self.location.clone(),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        }
    }
}

impl<A: BeaconAudioBackend, B: AudioBackend> BeaconGuide<A, B> {
    pub fn new(
        audio: A,
        queue: AudioQueue<B>,
        location: SharedLocation,
        config: BeaconConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            audio: Arc::new(audio),
            queue,
            location,
            config,
            state: Arc::new(Mutex::new(BeaconState::default())),
            events,
        }
    }

    /// Aims the beacon at a new target.
    ///
    /// Resets the announcement and arrival tracking so the next location
    /// update treats the target as fresh. A live beacon re-aims without
    /// restarting the tone.
    pub fn set(&self, name: impl Into<String>, latitude: f64, longitude: f64) {
        let enabled = {
            let mut state = self.state.lock().unwrap();
            state.name = Some(name.into());
            state.target = Some(Position::new(latitude, longitude));
            state.last_announced = None;
            state.was_nearby = false;
            state.enabled
        };
        if enabled {
            self.align_to_snapshot();
        }
    }

    /// Drops the target, stopping the tone first if it is playing.
    pub fn clear(&self) {
        self.disable();
        let mut state = self.state.lock().unwrap();
        state.name = None;
        state.target = None;
        state.last_announced = None;
        state.was_nearby = false;
        state.on_course = None;
    }

    /// Starts the beacon tone and the guidance task.
    ///
    /// No-op when already enabled. Fails without changing state if the
    /// audio backend cannot start its loops.
    pub async fn enable(&self) -> Result<(), AudioError> {
        let spawn = {
            let mut state = self.state.lock().unwrap();
            if state.enabled {
                return Ok(());
            }
            state.enabled = true;
            state.was_nearby = false;
            state.on_course = None;
            let spawn = !state.loop_running;
            if spawn {
                state.loop_running = true;
            }
            spawn
        };

        if let Err(error) = self.audio.start_loops().await {
            let mut state = self.state.lock().unwrap();
            state.enabled = false;
            if spawn {
                state.loop_running = false;
            }
            return Err(error);
        }

        if spawn {
            // Subscribe before spawning so fixes published from here on
            // reach the task even if it has not been polled yet.
            let updates = self.location.subscribe();
            let guide = self.clone();
            tokio::spawn(async move { guide.run(updates).await });
        }
        let _ = self.events.send(BeaconEvent::Enabled);
        self.align_to_snapshot();
        Ok(())
    }

    /// Stops the beacon tone. The target stays set for a later enable.
    pub fn disable(&self) {
        let was_enabled = {
            let mut state = self.state.lock().unwrap();
            let was_enabled = state.enabled;
            state.enabled = false;
            was_enabled
        };
        if was_enabled {
            self.audio.stop_loops();
            let _ = self.events.send(BeaconEvent::Disabled);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    pub fn snapshot(&self) -> BeaconSnapshot {
        let state = self.state.lock().unwrap();
        BeaconSnapshot {
            name: state.name.clone(),
            target: state.target,
            enabled: state.enabled,
            last_announced_meters: state.last_announced,
        }
    }

    /// Subscribes to guidance transitions.
    pub fn subscribe_events(&self) -> broadcast::Receiver<BeaconEvent> {
        self.events.subscribe()
    }

    async fn run(&self, mut updates: broadcast::Receiver<LocationFix>) {
        debug!("beacon guidance started");
        let mut crossfade = tokio::time::interval(self.config.crossfade_interval);

        loop {
            if !self.is_enabled() {
                // Enable flips both flags under this lock, so a re-enable
                // between the check above and here keeps the task alive.
                let mut state = self.state.lock().unwrap();
                if state.enabled {
                    continue;
                }
                state.loop_running = false;
                break;
            }
            tokio::select! {
                update = updates.recv() => match update {
                    Ok(fix) => self.handle_fix(&fix),
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "beacon guidance missed location updates");
                    }
                    Err(RecvError::Closed) => {
                        self.state.lock().unwrap().loop_running = false;
                        break;
                    }
                },
                _ = crossfade.tick() => self.refresh_course(),
            }
        }
        debug!("beacon guidance stopped");
    }

    /// Repositions the tone and applies arrival and announcement rules for
    /// one location update.
    fn handle_fix(&self, fix: &LocationFix) {
        let (offset, action) = {
            let mut state = self.state.lock().unwrap();
            if !state.enabled {
                return;
            }
            let Some(target) = state.target else {
                return;
            };
            let origin = fix.position();
            let distance = geo::haversine_distance(&origin, &target);
            let offset = geo::normalized_offset(&origin, fix.heading, &target);

            let nearby = distance < self.config.found_proximity_meters;
            let arrived = nearby && !state.was_nearby;
            state.was_nearby = nearby;

            if arrived {
                state.enabled = false;
                (offset, FixAction::Arrived)
            } else {
                let due = match state.last_announced {
                    None => true,
                    Some(last) => (last - distance).abs() > self.config.announce_every_meters,
                };
                if due && !self.queue.is_playing() {
                    state.last_announced = Some(distance);
                    (offset, FixAction::Announce(distance))
                } else {
                    (offset, FixAction::None)
                }
            }
        };

        self.audio.set_position(offset);
        match action {
            FixAction::None => {}
            FixAction::Arrived => {
                debug!("beacon target reached");
                self.audio.stop_loops();
                self.queue.enqueue(QueueItem::sound(SoundAsset::BeaconFound));
                let _ = self.events.send(BeaconEvent::Arrived);
                let _ = self.events.send(BeaconEvent::Disabled);
            }
            FixAction::Announce(distance) => {
                self.queue.play_sound_and_speech(
                    SoundAsset::SenseMobility,
                    format!("Beacon: {distance:.0} meters"),
                    None,
                    false,
                );
            }
        }
    }

    /// Re-evaluates the course cone and crossfades the tone on a change.
    fn refresh_course(&self) {
        let Some(fix) = self.location.snapshot() else {
            return;
        };
        let change = {
            let mut state = self.state.lock().unwrap();
            if !state.enabled {
                return;
            }
            let Some(target) = state.target else {
                return;
            };
            let now_on_course = on_course(
                &fix.position(),
                fix.heading,
                &target,
                self.config.on_course_angle,
            );
            if state.on_course == Some(now_on_course) {
                None
            } else {
                state.on_course = Some(now_on_course);
                Some(now_on_course)
            }
        };
        if let Some(on_course) = change {
            trace!(on_course, "beacon course changed");
            self.audio.set_on_course(on_course);
            let _ = self.events.send(BeaconEvent::CourseChanged(on_course));
        }
    }

    /// Catches the audio up with wherever the listener already is.
    fn align_to_snapshot(&self) {
        if let Some(fix) = self.location.snapshot() {
            self.handle_fix(&fix);
            self.refresh_course();
        }
    }
}

/// Whether `target` sits inside the on-course cone for a listener at
/// `origin` facing `heading_degrees`. The cone spans `cone_half_angle`
/// degrees to either side of straight ahead.
pub fn on_course(
    origin: &Position,
    heading_degrees: f64,
    target: &Position,
    cone_half_angle: f64,
) -> bool {
    let offset = geo::normalized_offset(origin, heading_degrees, target);
    cone_half_angle > offset.x.atan2(offset.y).to_degrees().abs()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::audio::tests::RecordingBeaconAudio;
    use super::*;
    use crate::audio::RecordingBackend;

    const MONUMENT: Position = Position {
        latitude: 38.889444,
        longitude: -77.035278,
    };
    const CAPITOL: Position = Position {
        latitude: 38.889861,
        longitude: -77.009342,
    };

    fn create_guide() -> (
        BeaconGuide<RecordingBeaconAudio, RecordingBackend>,
        RecordingBeaconAudio,
        RecordingBackend,
        SharedLocation,
    ) {
        let location = SharedLocation::new();
        let queue_backend = RecordingBackend::new();
        let queue = AudioQueue::new(queue_backend.clone(), location.clone());
        let beacon_audio = RecordingBeaconAudio::new();
        let config = BeaconConfig::default().with_crossfade_interval(Duration::from_millis(10));
        let guide = BeaconGuide::new(beacon_audio.clone(), queue, location.clone(), config);
        (guide, beacon_audio, queue_backend, location)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !condition() {
            if tokio::time::Instant::now() > deadline {
                panic!("condition not reached within two seconds");
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn drain_events(receiver: &mut broadcast::Receiver<BeaconEvent>) -> Vec<BeaconEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_on_course_tracks_heading_cone() {
        // The Capitol sits 89.1 degrees clockwise of north from the
        // Monument, so a 30 degree cone admits headings near due east.
        let cases = [
            (0.0, false),
            (60.0, true),
            (85.0, true),
            (90.0, true),
            (115.0, true),
            (120.0, false),
            (125.0, false),
            (180.0, false),
            (270.0, false),
        ];
        for (heading, expected) in cases {
            assert_eq!(
                on_course(&MONUMENT, heading, &CAPITOL, 30.0),
                expected,
                "heading {heading}"
            );
        }
    }

    #[test]
    fn test_set_and_snapshot() {
        let (guide, _, _, _) = create_guide();
        assert_eq!(guide.snapshot().target, None);

        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        let snapshot = guide.snapshot();
        assert_eq!(snapshot.name.as_deref(), Some("US Capitol"));
        assert_eq!(snapshot.target, Some(CAPITOL));
        assert!(!snapshot.enabled);
        assert_eq!(snapshot.last_announced_meters, None);
    }

    #[test]
    fn test_clear_resets_target() {
        let (guide, _, _, _) = create_guide();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        guide.clear();
        let snapshot = guide.snapshot();
        assert_eq!(snapshot.name, None);
        assert_eq!(snapshot.target, None);
    }

    #[tokio::test]
    async fn test_enable_and_disable_drive_the_loops() {
        let (guide, beacon_audio, _, _) = create_guide();
        let mut events = guide.subscribe_events();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);

        guide.enable().await.unwrap();
        assert!(guide.is_enabled());
        assert!(beacon_audio.is_running());

        guide.disable();
        assert!(!guide.is_enabled());
        assert!(!beacon_audio.is_running());

        let events = drain_events(&mut events);
        assert_eq!(events, vec![BeaconEvent::Enabled, BeaconEvent::Disabled]);
    }

    #[tokio::test]
    async fn test_enable_twice_is_a_noop() {
        let (guide, beacon_audio, _, _) = create_guide();
        let mut events = guide.subscribe_events();
        guide.enable().await.unwrap();
        guide.enable().await.unwrap();

        assert!(beacon_audio.is_running());
        assert_eq!(drain_events(&mut events), vec![BeaconEvent::Enabled]);
    }

    #[tokio::test]
    async fn test_location_updates_position_the_tone() {
        let (guide, beacon_audio, _, location) = create_guide();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        guide.enable().await.unwrap();

        // Facing east from the Monument the Capitol is dead ahead.
        location.set_heading(90.0);
        location.set_location(MONUMENT.latitude, MONUMENT.longitude);
        wait_for(|| !beacon_audio.positions().is_empty()).await;

        let position = *beacon_audio.positions().last().unwrap();
        assert!(position.x.abs() < 0.05, "x was {}", position.x);
        assert!(position.y > 0.99, "y was {}", position.y);
    }

    #[tokio::test]
    async fn test_course_crossfades_as_the_listener_turns() {
        let (guide, beacon_audio, _, location) = create_guide();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        location.set_heading(90.0);
        location.set_location(MONUMENT.latitude, MONUMENT.longitude);
        guide.enable().await.unwrap();
        wait_for(|| beacon_audio.last_course() == Some(true)).await;

        location.set_heading(180.0);
        wait_for(|| beacon_audio.last_course() == Some(false)).await;

        location.set_heading(85.0);
        wait_for(|| beacon_audio.last_course() == Some(true)).await;

        assert_eq!(beacon_audio.course_changes(), vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_distance_announcements_every_fifty_meters() {
        let (guide, _, queue_backend, location) = create_guide();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        guide.enable().await.unwrap();

        // 2244.7 m out: the first update always announces.
        location.set_location(38.889861, -77.035278);
        wait_for(|| queue_backend.speeches() == vec!["Beacon: 2245 meters"]).await;
        wait_for(|| !guide.queue.is_playing()).await;

        // 30 m closer: inside the announcement interval, stays quiet.
        location.set_location(38.889861, -77.0349313757241);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue_backend.speeches(), vec!["Beacon: 2245 meters"]);

        // 90 m from the first announcement: speaks again.
        location.set_location(38.889861, -77.03423812717229);
        wait_for(|| queue_backend.speeches().len() == 2).await;
        assert_eq!(
            queue_backend.speeches(),
            vec!["Beacon: 2245 meters", "Beacon: 2155 meters"]
        );
    }

    #[tokio::test]
    async fn test_announcements_wait_for_an_idle_queue() {
        let location = SharedLocation::new();
        let queue_backend = RecordingBackend::with_latency(Duration::from_millis(100));
        let queue = AudioQueue::new(queue_backend.clone(), location.clone());
        let beacon_audio = RecordingBeaconAudio::new();
        let config = BeaconConfig::default().with_crossfade_interval(Duration::from_millis(10));
        let guide = BeaconGuide::new(beacon_audio, queue, location.clone(), config);

        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        guide.enable().await.unwrap();

        guide.queue.enqueue(QueueItem::speech("Crossing ahead"));
        assert!(guide.queue.is_playing());
        location.set_location(38.889861, -77.035278);
        wait_for(|| !guide.queue.is_playing()).await;

        // The fix landed while the callout was rendering, so the beacon
        // held its tongue.
        assert_eq!(queue_backend.speeches(), vec!["Crossing ahead"]);

        // The next fix finds the queue idle and speaks.
        location.set_location(38.889861, -77.0349313757241);
        wait_for(|| queue_backend.speeches().len() == 2).await;
        assert_eq!(
            queue_backend.speeches().last().map(String::as_str),
            Some("Beacon: 2215 meters")
        );
    }

    #[tokio::test]
    async fn test_arrival_stops_the_beacon_and_chimes() {
        let (guide, beacon_audio, queue_backend, location) = create_guide();
        let mut events = guide.subscribe_events();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        // 100 m north of the Capitol.
        location.set_location(38.890760321605924, -77.009342);
        guide.enable().await.unwrap();

        // 5 m north: inside the found radius.
        location.set_location(38.8899059660803, -77.009342);
        wait_for(|| !guide.is_enabled()).await;

        assert!(!beacon_audio.is_running());
        wait_for(|| queue_backend.sounds().contains(&SoundAsset::BeaconFound)).await;
        wait_for(|| {
            drain_events(&mut events)
                .iter()
                .any(|event| *event == BeaconEvent::Arrived)
        })
        .await;
    }

    #[tokio::test]
    async fn test_retarget_resets_announcements() {
        let (guide, _, queue_backend, location) = create_guide();
        guide.set("US Capitol", CAPITOL.latitude, CAPITOL.longitude);
        location.set_location(38.889861, -77.035278);
        guide.enable().await.unwrap();
        wait_for(|| queue_backend.speeches() == vec!["Beacon: 2245 meters"]).await;
        wait_for(|| !guide.queue.is_playing()).await;

        // A new target announces immediately even though the listener has
        // not moved. The Monument is 46 m south of this spot.
        guide.set("Washington Monument", MONUMENT.latitude, MONUMENT.longitude);
        wait_for(|| queue_backend.speeches().len() == 2).await;
        assert_eq!(
            queue_backend.speeches().last().map(String::as_str),
            Some("Beacon: 46 meters")
        );
    }
}
