//! # Coordinate Sampler
//!
//! A fixed-resolution lookup table over the route, built once per session.
//!
//! Samples are spaced evenly by distance rather than by vertex index: recorded GPS
//! tracks are dense on slow climbs and sparse on fast descents, and sampling by
//! index would make the head visibly change speed. After construction every
//! position and bearing query is O(1).
//!
//! ```rust
//! use route_playback::{GpsPoint, RouteGeometry, SampledPath};
//!
//! let route = RouteGeometry::new(vec![
//!     GpsPoint::new(0.0, 0.0),
//!     GpsPoint::new(0.0, 0.001), // short first segment
//!     GpsPoint::new(0.0, 0.010),
//! ]).unwrap();
//!
//! let path = SampledPath::new(&route, 10).unwrap();
//! assert_eq!(path.samples().len(), 11);
//!
//! // Halfway by distance, not halfway through the vertex list
//! let mid = path.position_at(0.5);
//! assert!((mid.longitude - 0.005).abs() < 1e-9);
//! ```

use crate::config::MAX_SAMPLE_COUNT;
use crate::error::{PlaybackError, Result};
use crate::geo_utils::{bearing, lerp_point};
use crate::route::RouteGeometry;
use crate::GpsPoint;

/// Precomputed, evenly spaced samples spanning phase 0..=1.
#[derive(Debug, Clone)]
pub struct SampledPath {
    samples: Vec<GpsPoint>,
    sample_count: usize,
}

impl SampledPath {
    /// Sample `sample_count + 1` points along the route.
    pub fn new(route: &RouteGeometry, sample_count: u32) -> Result<Self> {
        if sample_count == 0 || sample_count > MAX_SAMPLE_COUNT {
            return Err(PlaybackError::config(format!(
                "sample_count must be in 1..={}, got {}",
                MAX_SAMPLE_COUNT, sample_count
            )));
        }

        let n = sample_count as usize;
        let total = route.total_distance();
        let samples = (0..=n)
            .map(|i| route.point_at_distance(total * i as f64 / n as f64))
            .collect();

        Ok(Self { samples, sample_count: n })
    }

    /// Number of intervals (one less than the number of samples).
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn samples(&self) -> &[GpsPoint] {
        &self.samples
    }

    /// Sample at `index`, clamped to the last sample.
    pub fn sample(&self, index: usize) -> GpsPoint {
        self.samples[index.min(self.sample_count)]
    }

    /// Interpolated position at `phase`. Out-of-range phases are clamped; NaN maps to 0.
    pub fn position_at(&self, phase: f64) -> GpsPoint {
        let phase = if phase.is_nan() { 0.0 } else { phase.clamp(0.0, 1.0) };
        let x = phase * self.sample_count as f64;
        let i = x.floor() as usize;
        if i >= self.sample_count {
            return self.samples[self.sample_count];
        }
        lerp_point(&self.samples[i], &self.samples[i + 1], x - i as f64)
    }

    /// Route tangent at `phase` as a great-circle bearing in degrees, [0, 360).
    ///
    /// Looks `lookahead` ahead of the head. Near the end of the route, where the
    /// lookahead is clamped at phase 1, the final `[1 - lookahead, 1]` span is used
    /// instead. Returns `None` on a zero-length path.
    pub fn bearing_at(&self, phase: f64, lookahead: f64) -> Option<f64> {
        let phase = if phase.is_nan() { 0.0 } else { phase.clamp(0.0, 1.0) };
        let lookahead = lookahead.abs().max(f64::EPSILON);

        let (from_phase, to_phase) = if phase + lookahead > 1.0 {
            ((1.0 - lookahead).max(0.0), 1.0)
        } else {
            (phase, phase + lookahead)
        };

        let from = self.position_at(from_phase);
        let to = self.position_at(to_phase);
        if from == to {
            return None;
        }
        Some(bearing(&from, &to))
    }
}
