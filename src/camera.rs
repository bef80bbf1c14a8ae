//! # Camera Motion Model
//!
//! Follows the head from behind and above. Each frame an ideal pose is derived from
//! the head position and route tangent, and the actual pose eases toward it:
//!
//! ```text
//! pose ← pose + α · (ideal − pose)
//! ```
//!
//! Bearing and longitude are angles, so they ease along the shortest arc. The first
//! frame after a discontinuity (start, seek, resume, restart) snaps straight to the
//! ideal pose; easing across a seek would fly the camera over the whole course.

use crate::geo_utils::{
    destination, normalize_bearing, shortest_angle_delta, wrap_longitude,
};
use crate::GpsPoint;

/// Camera placement handed to the map renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Ground position under the camera
    pub center: GpsPoint,
    /// Heading in degrees, [0, 360)
    pub bearing: f64,
    /// Degrees from straight down
    pub pitch: f64,
    pub zoom: f64,
    /// Meters above ground
    pub altitude: f64,
}

/// Smoothed follow camera.
#[derive(Debug, Clone)]
pub struct CameraModel {
    pose: Option<CameraPose>,
    smoothing: f64,
    zoom: f64,
    snap_next: bool,
}

impl CameraModel {
    /// `smoothing` is the per-frame α in (0, 1]; 1.0 tracks the ideal pose exactly.
    pub fn new(smoothing: f64, zoom: f64) -> Self {
        Self {
            pose: None,
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
            zoom,
            snap_next: true,
        }
    }

    /// Last pose produced by [`advance`](Self::advance).
    pub fn pose(&self) -> Option<&CameraPose> {
        self.pose.as_ref()
    }

    /// Make the next [`advance`](Self::advance) jump straight to its target.
    pub fn snap_next(&mut self) {
        self.snap_next = true;
    }

    /// Pose that looks at `target` along `bearing`.
    ///
    /// The camera sits `altitude` meters up, pulled back against the direction of
    /// travel by `altitude · tan(pitch)` so that its line of sight hits the target.
    pub fn compute_ideal_pose(
        &self,
        pitch: f64,
        bearing: f64,
        target: &GpsPoint,
        altitude: f64,
    ) -> CameraPose {
        let pull_back = altitude * pitch.to_radians().tan();
        let center = if pull_back > 0.0 && pull_back.is_finite() {
            destination(target, normalize_bearing(bearing + 180.0), pull_back)
        } else {
            *target
        };

        CameraPose {
            center,
            bearing: normalize_bearing(bearing),
            pitch,
            zoom: self.zoom,
            altitude,
        }
    }

    /// Ease toward `ideal` and return the new pose.
    pub fn advance(&mut self, ideal: CameraPose) -> CameraPose {
        let next = match self.pose {
            Some(current) if !self.snap_next => self.blend(&current, &ideal),
            _ => ideal,
        };
        self.snap_next = false;
        self.pose = Some(next);
        next
    }

    fn blend(&self, current: &CameraPose, ideal: &CameraPose) -> CameraPose {
        let a = self.smoothing;
        let lerp = |from: f64, to: f64| from + a * (to - from);

        let lng = current.center.longitude
            + a * shortest_angle_delta(current.center.longitude, ideal.center.longitude);

        CameraPose {
            center: GpsPoint::new(
                lerp(current.center.latitude, ideal.center.latitude),
                wrap_longitude(lng),
            ),
            bearing: normalize_bearing(
                current.bearing + a * shortest_angle_delta(current.bearing, ideal.bearing),
            ),
            pitch: lerp(current.pitch, ideal.pitch),
            zoom: lerp(current.zoom, ideal.zoom),
            altitude: lerp(current.altitude, ideal.altitude),
        }
    }
}
