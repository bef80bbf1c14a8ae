//! # Route Playback
//!
//! Time-based playback of a recorded GPS route: a head marker travels the course,
//! a camera follows it from behind, and course markers (aid stations, kilometer
//! posts, start and finish) pop up as the head passes them.
//!
//! This library provides:
//! - A pausable, seekable, speed-adjustable phase clock with a frame loop
//! - Distance-uniform route sampling with O(1) position and bearing lookup
//! - A smoothed follow camera
//! - Route-ordered marker clustering and geofences that stay correct on loops and
//!   self-crossing courses
//!
//! Rendering, frame scheduling and UI state are host capabilities, passed in as
//! trait implementations ([`MapRenderer`], [`PopupRenderer`], [`Scheduler`],
//! [`PlaybackStore`]). Time is always an explicit `now` argument in milliseconds.
//!
//! ## Features
//!
//! - **`serde`** - Serialize/deserialize configuration, input and state types
//!
//! ## Quick Start
//!
//! ```rust
//! use route_playback::{
//!     Bounds, CameraPose, GpsPoint, ManualScheduler, MapRenderer, MarkFeature,
//!     PlaybackConfig, PlaybackStore, PopupContent, PopupRenderer, RouteInput, RoutePlayer,
//! };
//!
//! struct Map;
//! impl MapRenderer for Map {
//!     fn set_head_position(&mut self, _position: GpsPoint) {}
//!     fn set_camera(&mut self, _pose: &CameraPose) {}
//!     fn fit_bounds(&mut self, _bounds: &Bounds) {}
//! }
//!
//! struct Popup;
//! impl PopupRenderer for Popup {
//!     fn show_at(&mut self, _anchor: GpsPoint, content: &PopupContent) {
//!         println!("popup: {}", content.title);
//!     }
//!     fn hide(&mut self) {}
//! }
//!
//! struct Store;
//! impl PlaybackStore for Store {
//!     fn set_progress(&mut self, _progress: f64) {}
//! }
//!
//! let points = (0..=20).map(|i| GpsPoint::new(46.0, 7.0 + i as f64 * 0.001)).collect();
//! let input = RouteInput::new(points, 20_000.0)
//!     .with_marks(vec![MarkFeature::new(GpsPoint::new(46.0, 7.01), "Water")]);
//!
//! let mut player = RoutePlayer::setup(
//!     input,
//!     PlaybackConfig::default(),
//!     ManualScheduler::new(),
//!     Map,
//!     Popup,
//!     Store,
//! ).unwrap();
//!
//! player.start(0.0);
//! for now in (16..=10_000).step_by(16) {
//!     let now = now as f64;
//!     player.scheduler_mut().advance_to(now);
//!     for frame in player.scheduler_mut().take_frames() {
//!         player.on_frame(frame, now);
//!     }
//! }
//! assert!((player.phase(10_000.0) - 0.5).abs() < 1e-9);
//! ```

pub mod error;
pub use error::{PlaybackError, Result};

pub mod config;
pub use config::PlaybackConfig;

pub mod geo_utils;

// Route geometry and sampling
pub mod route;
pub use route::{RouteGeometry, RouteProjection};

pub mod sampler;
pub use sampler::SampledPath;

// Phase controller
pub mod clock;
pub use clock::AnimationClock;

pub mod scheduler;
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, TaskSlot};

pub mod controller;
pub use controller::{ControllerEvent, ControllerState, PhaseController};

pub mod camera;
pub use camera::{CameraModel, CameraPose};

// Markers, clustering and geofences
pub mod marks;
pub use marks::{classify_marks, Classification, Mark, MarkCategory, MarkFeature};

pub mod cluster;
pub use cluster::{cluster_marks, project_marks, Cluster, FractionWindow, PlacedMark};

pub mod geofence;
pub use geofence::{GeofenceEngine, GeofenceEvent};

pub mod popup;
pub use popup::{AnchorKey, PopupContent, PopupEntry, PopupLayer, PopupRenderer};

pub mod store;
pub use store::{PlaybackState, PlaybackStore, ProgressThrottle};

pub mod player;
pub use player::{MapRenderer, RouteInput, RoutePlayer};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_playback::GpsPoint;
/// let point = GpsPoint::new(45.9237, 6.8694); // Chamonix
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. `None` for an empty slice.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}
