//! # Route Player
//!
//! Wires the pieces into a playback session:
//!
//! ```text
//! PhaseController ──event──▶ SampledPath ─▶ CameraModel ─▶ MapRenderer
//!                                 │
//!                                 └─▶ GeofenceEngine ─▶ PopupLayer ─▶ PopupRenderer
//!                                 └─▶ ProgressThrottle ─▶ PlaybackStore
//! ```
//!
//! All expensive work (geometry, sampling, classification, projection, clustering)
//! happens once in [`RoutePlayer::setup`]. Per-frame work is O(1) apart from the
//! geofence cursor, which only moves forward.

use log::{debug, info, warn};

use crate::camera::{CameraModel, CameraPose};
use crate::cluster::{cluster_marks, project_marks};
use crate::config::PlaybackConfig;
use crate::controller::{ControllerEvent, ControllerState, PhaseController};
use crate::error::{PlaybackError, Result};
use crate::geofence::GeofenceEngine;
use crate::marks::{classify_marks, MarkFeature};
use crate::popup::{PopupLayer, PopupRenderer};
use crate::route::RouteGeometry;
use crate::sampler::SampledPath;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::store::{PlaybackState, PlaybackStore, ProgressThrottle};
use crate::{Bounds, GpsPoint};

/// Progress differences below this are not treated as an external scrub.
const PROGRESS_EPSILON: f64 = 1e-9;

/// Host capability that draws the map.
pub trait MapRenderer {
    fn set_head_position(&mut self, position: GpsPoint);

    fn set_camera(&mut self, pose: &CameraPose);

    /// Frame the whole route; called once during setup.
    fn fit_bounds(&mut self, bounds: &Bounds);
}

/// Course data for one session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteInput {
    pub points: Vec<GpsPoint>,
    /// Playback duration at 1x, in milliseconds
    pub duration_ms: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub marks: Vec<MarkFeature>,
}

impl RouteInput {
    pub fn new(points: Vec<GpsPoint>, duration_ms: f64) -> Self {
        Self { points, duration_ms, marks: Vec::new() }
    }

    pub fn with_marks(mut self, marks: Vec<MarkFeature>) -> Self {
        self.marks = marks;
        self
    }
}

/// A playback session over one route.
pub struct RoutePlayer<S, M, P, T>
where
    S: Scheduler,
    M: MapRenderer,
    P: PopupRenderer,
    T: PlaybackStore,
{
    config: PlaybackConfig,
    route: RouteGeometry,
    path: SampledPath,
    controller: PhaseController<S>,
    camera: CameraModel,
    geofence: GeofenceEngine,
    popup: PopupLayer<P>,
    map: M,
    store: T,
    throttle: ProgressThrottle,
    last_bearing: f64,
    observed: PlaybackState,
}

impl<S, M, P, T> RoutePlayer<S, M, P, T>
where
    S: Scheduler,
    M: MapRenderer,
    P: PopupRenderer,
    T: PlaybackStore,
{
    /// Build a session and frame the route on the map.
    ///
    /// A route with zero total length loads but never animates.
    pub fn setup(
        input: RouteInput,
        config: PlaybackConfig,
        scheduler: S,
        mut map: M,
        popup: P,
        store: T,
    ) -> Result<Self> {
        config.validate()?;
        if !input.duration_ms.is_finite() || input.duration_ms < 0.0 {
            return Err(PlaybackError::InvalidDuration(input.duration_ms));
        }

        let route = RouteGeometry::new(input.points)?
            .with_projection_tuning(config.projection_tie_tolerance, config.projection_pass_span);
        let path = SampledPath::new(&route, config.sample_count)?;

        let marks = classify_marks(&input.marks);
        let mark_count = marks.len();
        let placed = project_marks(marks, &route);
        let clusters = cluster_marks(placed, &route, &config);
        let cluster_count = clusters.len();

        let duration_ms = if route.is_degenerate() {
            warn!("[Playback] Route has zero length; animation disabled");
            0.0
        } else {
            input.duration_ms
        };

        let controller = PhaseController::new(scheduler, duration_ms, config.restart_delay_ms);
        let geofence =
            GeofenceEngine::new(clusters, route.distance_to_fraction(config.geofence_exit_buffer));
        let camera = CameraModel::new(config.camera_smoothing, config.camera_zoom);
        let last_bearing = path.bearing_at(0.0, config.bearing_lookahead).unwrap_or(0.0);

        map.fit_bounds(&route.bounds());
        map.set_head_position(path.position_at(0.0));

        info!(
            "[Playback] Route loaded: {} points, {:.0}m, {} marks in {} clusters, {:.0}ms",
            route.points().len(),
            route.total_distance(),
            mark_count,
            cluster_count,
            duration_ms
        );

        Ok(Self {
            throttle: ProgressThrottle::new(config.progress_throttle_ms),
            config,
            route,
            path,
            controller,
            camera,
            geofence,
            popup: PopupLayer::new(popup),
            map,
            store,
            last_bearing,
            observed: PlaybackState::default(),
        })
    }

    // ---- accessors ----

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn route(&self) -> &RouteGeometry {
        &self.route
    }

    pub fn path(&self) -> &SampledPath {
        &self.path
    }

    pub fn geofence(&self) -> &GeofenceEngine {
        &self.geofence
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn phase(&self, now: f64) -> f64 {
        self.controller.phase(now)
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn popup(&self) -> &PopupLayer<P> {
        &self.popup
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn scheduler(&self) -> &S {
        self.controller.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.controller.scheduler_mut()
    }

    // ---- control surface ----

    pub fn start(&mut self, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.start(now);
        self.dispatch(event, now)
    }

    pub fn pause(&mut self, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.pause(now);
        self.dispatch(event, now)
    }

    pub fn resume(&mut self, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.resume(now);
        self.dispatch(event, now)
    }

    pub fn seek(&mut self, phase: f64, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.seek(phase, now);
        self.dispatch(event, now)
    }

    pub fn set_speed(&mut self, speed: f64, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.set_speed(speed, now);
        self.dispatch(event, now)
    }

    /// Host callback for a frame requested through the scheduler.
    pub fn on_frame(&mut self, handle: TaskHandle, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.on_frame(handle, now);
        self.dispatch(event, now)
    }

    /// Host callback for a timer set through the scheduler.
    pub fn on_timeout(&mut self, handle: TaskHandle, now: f64) -> Option<ControllerEvent> {
        let event = self.controller.on_timeout(handle, now);
        self.dispatch(event, now)
    }

    /// Apply changes the host made to the shared store.
    ///
    /// Fields are compared with the last state seen here; only changed fields act.
    /// A changed `progress` is a scrub and becomes a seek.
    pub fn sync_from_store(&mut self, state: &PlaybackState, now: f64) {
        if state.speed != self.observed.speed {
            self.observed.speed = state.speed;
            self.set_speed(state.speed, now);
        }

        if (state.progress - self.observed.progress).abs() > PROGRESS_EPSILON {
            debug!("[Playback] External scrub to {:.4}", state.progress);
            self.observed.progress = state.progress;
            self.seek(state.progress, now);
        }

        if state.is_playing != self.observed.is_playing {
            self.observed.is_playing = state.is_playing;
            if state.is_playing {
                match self.controller.state() {
                    ControllerState::Idle => {
                        self.start(now);
                    }
                    ControllerState::Paused => {
                        self.resume(now);
                    }
                    ControllerState::Playing | ControllerState::Completed => {}
                }
            } else {
                self.pause(now);
            }
        }
    }

    /// Cancel pending callbacks and close the popup.
    pub fn dispose(&mut self) {
        self.controller.dispose();
        self.popup.hide();
        debug!("[Playback] Disposed");
    }

    // ---- event routing ----

    fn dispatch(&mut self, event: Option<ControllerEvent>, now: f64) -> Option<ControllerEvent> {
        let event = event?;
        match event {
            ControllerEvent::Started | ControllerEvent::SpeedChanged { .. } => {}
            ControllerEvent::Frame { phase, snap } => {
                self.render(phase, snap);
                self.geofence.update_head_position(phase, true, &mut self.popup);
                self.write_progress(phase, now, false);
            }
            ControllerEvent::Paused { phase } => {
                self.geofence.update_head_position(phase, false, &mut self.popup);
                self.write_progress(phase, now, true);
            }
            ControllerEvent::Resumed { .. } => self.camera.snap_next(),
            ControllerEvent::Seeked { phase } => {
                if self.controller.is_playing() {
                    self.geofence.recalibrate(phase, &mut self.popup);
                    self.camera.snap_next();
                }
                self.map.set_head_position(self.path.position_at(phase));
                self.write_progress(phase, now, true);
            }
            ControllerEvent::Finished => {
                self.render(1.0, false);
                self.geofence.reset_popup(&mut self.popup);
                self.write_progress(1.0, now, true);
            }
            ControllerEvent::Restarted => {
                self.geofence.reset_popup(&mut self.popup);
                self.camera.snap_next();
                self.map.set_head_position(self.path.position_at(0.0));
                self.write_progress(0.0, now, true);
            }
        }
        Some(event)
    }

    fn render(&mut self, phase: f64, snap: bool) {
        let position = self.path.position_at(phase);
        if let Some(bearing) = self.path.bearing_at(phase, self.config.bearing_lookahead) {
            self.last_bearing = bearing;
        }
        self.map.set_head_position(position);

        if snap {
            self.camera.snap_next();
        }
        let ideal = self.camera.compute_ideal_pose(
            self.config.camera_pitch,
            self.last_bearing,
            &position,
            self.config.camera_altitude,
        );
        let pose = self.camera.advance(ideal);
        self.map.set_camera(&pose);
    }

    fn write_progress(&mut self, phase: f64, now: f64, force: bool) {
        if self.throttle.should_write(phase, now, force) {
            self.store.set_progress(phase);
            self.observed.progress = phase;
        }
    }
}
