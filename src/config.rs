//! Playback tunables.

use crate::error::{PlaybackError, Result};
use crate::route::{DEFAULT_PASS_SPAN_M, DEFAULT_TIE_TOLERANCE_DEG};

/// Upper bound on `sample_count`; 16 bytes per sample.
pub const MAX_SAMPLE_COUNT: u32 = 1_000_000;

/// Configuration for a playback session.
///
/// The clustering and geofence distances are empirically tuned for trail-running
/// courses with aid stations every few kilometers; other activities may want
/// different values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackConfig {
    /// Number of sampling intervals over the route (the path holds N+1 samples).
    /// Default: 1000
    pub sample_count: u32,

    /// Phase lookahead used to derive the tangent bearing.
    /// Default: 0.002 (0.2% of the route ahead of the head)
    pub bearing_lookahead: f64,

    /// Exponential smoothing factor applied to the camera every frame, in (0, 1].
    /// 1.0 disables smoothing. Default: 0.08
    pub camera_smoothing: f64,

    /// Camera pitch in degrees from straight down. Default: 60.0
    pub camera_pitch: f64,

    /// Camera altitude above the head in meters. Default: 400.0
    pub camera_altitude: f64,

    /// Map zoom level while following the head. Default: 15.5
    pub camera_zoom: f64,

    /// Maximum planar distance (degrees) between consecutive markers of one cluster.
    /// Compared squared. Default: 0.0005 (~55 meters)
    pub cluster_distance_threshold: f64,

    /// Maximum along-route distance in meters between consecutive markers of one
    /// cluster. Keeps coincident markers on different laps apart. Default: 1000.0
    pub cluster_max_route_gap: f64,

    /// Markers whose distance to two route passes differs by less than this many
    /// degrees are treated as equally close to both. Default: 1e-6 (~0.1 meters)
    pub projection_tie_tolerance: f64,

    /// Along-route extent in meters of one pass when choosing between equally close
    /// passes. Default: 100.0
    pub projection_pass_span: f64,

    /// Distance in meters before a cluster's first marker at which its popup opens.
    /// Default: 150.0
    pub geofence_lead: f64,

    /// Distance in meters after a cluster's last marker at which its popup may close.
    /// Default: 150.0
    pub geofence_trail: f64,

    /// Extra hysteresis in meters applied when testing whether the head left an open
    /// cluster's window. Default: 50.0
    pub geofence_exit_buffer: f64,

    /// Delay in milliseconds between completion and the automatic restart.
    /// Default: 3000.0
    pub restart_delay_ms: f64,

    /// Minimum interval in milliseconds between progress writes to the external store.
    /// Default: 100.0
    pub progress_throttle_ms: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            bearing_lookahead: 0.002,
            camera_smoothing: 0.08,
            camera_pitch: 60.0,
            camera_altitude: 400.0,
            camera_zoom: 15.5,
            cluster_distance_threshold: 0.0005,
            cluster_max_route_gap: 1000.0,
            projection_tie_tolerance: DEFAULT_TIE_TOLERANCE_DEG,
            projection_pass_span: DEFAULT_PASS_SPAN_M,
            geofence_lead: 150.0,
            geofence_trail: 150.0,
            geofence_exit_buffer: 50.0,
            restart_delay_ms: 3000.0,
            progress_throttle_ms: 100.0,
        }
    }
}

impl PlaybackConfig {
    /// Check every field is within its usable range.
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 || self.sample_count > MAX_SAMPLE_COUNT {
            return Err(PlaybackError::config(format!(
                "sample_count must be in 1..={}, got {}",
                MAX_SAMPLE_COUNT, self.sample_count
            )));
        }
        if !(self.projection_pass_span.is_finite() && self.projection_pass_span > 0.0) {
            return Err(PlaybackError::config(format!(
                "projection_pass_span must be positive, got {}",
                self.projection_pass_span
            )));
        }
        if !(self.bearing_lookahead > 0.0 && self.bearing_lookahead < 1.0) {
            return Err(PlaybackError::config(format!(
                "bearing_lookahead must be in (0, 1), got {}",
                self.bearing_lookahead
            )));
        }
        if !(self.camera_smoothing > 0.0 && self.camera_smoothing <= 1.0) {
            return Err(PlaybackError::config(format!(
                "camera_smoothing must be in (0, 1], got {}",
                self.camera_smoothing
            )));
        }
        if !(0.0..90.0).contains(&self.camera_pitch) {
            return Err(PlaybackError::config(format!(
                "camera_pitch must be in [0, 90), got {}",
                self.camera_pitch
            )));
        }

        let non_negative = [
            ("camera_altitude", self.camera_altitude),
            ("camera_zoom", self.camera_zoom),
            ("cluster_distance_threshold", self.cluster_distance_threshold),
            ("cluster_max_route_gap", self.cluster_max_route_gap),
            ("projection_tie_tolerance", self.projection_tie_tolerance),
            ("geofence_lead", self.geofence_lead),
            ("geofence_trail", self.geofence_trail),
            ("geofence_exit_buffer", self.geofence_exit_buffer),
            ("restart_delay_ms", self.restart_delay_ms),
            ("progress_throttle_ms", self.progress_throttle_ms),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PlaybackError::config(format!(
                    "{} must be a finite, non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
