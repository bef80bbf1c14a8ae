//! # Geographic Utilities
//!
//! Core geographic computation utilities for route playback.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`cumulative_distances`] | Running distance along a polyline, one entry per vertex |
//! | [`bearing`] | Initial great-circle bearing from one point to another |
//! | [`destination`] | Point reached by travelling a distance on a bearing |
//! | [`lerp_point`] | Planar interpolation between two points |
//! | [`planar_distance_sq`] | Squared distance in raw degree space |
//! | [`compute_bounds`] | Bounding box of a GPS track |
//! | [`compute_center`] | Centroid of a set of points |
//! | [`shortest_angle_delta`] | Signed shortest rotation between two angles |
//!
//! ## Example
//!
//! ```rust
//! use route_playback::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(51.5074, -0.1278);
//! let b = GpsPoint::new(51.5174, -0.1278);
//!
//! // Due north
//! let brg = geo_utils::bearing(&a, &b);
//! assert!(brg < 0.5 || brg > 359.5);
//!
//! // Shortest way from 170° to -170° is +20°
//! assert!((geo_utils::shortest_angle_delta(170.0, -170.0) - 20.0).abs() < 1e-9);
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees). Planar helpers
//! treat (longitude, latitude) as a flat plane, which is adequate for the short
//! distances involved in marker clustering and segment projection.

use geo::{Bearing, Destination, Distance, Haversine, Point};
use crate::{Bounds, GpsPoint};

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two GPS points (spherical Earth, r = 6,371 km).
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Running distance along a polyline.
///
/// Returns one entry per vertex; the first is always 0.0 and the last is the total
/// length. Empty input returns an empty vector.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&points[i - 1], p);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Squared distance between two points in raw (longitude, latitude) degree space.
///
/// Cheap proximity test for points that are already known to be close.
#[inline]
pub fn planar_distance_sq(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let dlat = p1.latitude - p2.latitude;
    let dlng = p1.longitude - p2.longitude;
    dlat * dlat + dlng * dlng
}

// =============================================================================
// Bearing / Direction Functions
// =============================================================================

/// Initial great-circle bearing from `from` to `to`, in degrees within [0, 360).
///
/// North is 0°, east is 90°.
#[inline]
pub fn bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    normalize_bearing(Haversine::bearing(to_point(from), to_point(to)))
}

/// Point reached by travelling `distance_m` meters from `origin` on `bearing_deg`.
#[inline]
pub fn destination(origin: &GpsPoint, bearing_deg: f64, distance_m: f64) -> GpsPoint {
    let p = Haversine::destination(to_point(origin), bearing_deg, distance_m);
    GpsPoint::new(p.y(), p.x())
}

/// Wrap an angle into [0, 360).
#[inline]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation (degrees, within [-180, 180)) that takes `from` to `to`.
#[inline]
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap a longitude into [-180, 180).
#[inline]
pub fn wrap_longitude(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

// =============================================================================
// Interpolation
// =============================================================================

/// Linear interpolation between two points; `t` = 0 yields `a`, `t` = 1 yields `b`.
#[inline]
pub fn lerp_point(a: &GpsPoint, b: &GpsPoint, t: f64) -> GpsPoint {
    GpsPoint::new(
        a.latitude + t * (b.latitude - a.latitude),
        a.longitude + t * (b.longitude - a.longitude),
    )
}

// =============================================================================
// Bounding Box / Center Functions
// =============================================================================

/// Compute the bounding box of a GPS track.
///
/// For empty input, returns a bounds with MIN/MAX values that contains nothing.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds { min_lat, max_lat, min_lng, max_lng }
}

/// Arithmetic mean of latitudes and longitudes. Returns (0, 0) for empty input.
///
/// Suitable for small areas such as a cluster of aid-station markers; not meaningful
/// across the antimeridian.
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    GpsPoint::new(sum_lat / n, sum_lng / n)
}

#[inline]
fn to_point(p: &GpsPoint) -> Point {
    Point::new(p.longitude, p.latitude)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_cumulative_distances() {
        assert!(cumulative_distances(&[]).is_empty());

        let track = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.01),
            GpsPoint::new(0.0, 0.02),
        ];
        let cumulative = cumulative_distances(&track);
        assert_eq!(cumulative.len(), 3);
        assert_eq!(cumulative[0], 0.0);
        assert!(approx_eq(cumulative[2], 2.0 * cumulative[1], 1e-6));
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GpsPoint::new(0.0, 0.0);
        let east = bearing(&origin, &GpsPoint::new(0.0, 0.01));
        let south = bearing(&origin, &GpsPoint::new(-0.01, 0.0));
        let west = bearing(&origin, &GpsPoint::new(0.0, -0.01));
        assert!(approx_eq(east, 90.0, 0.01));
        assert!(approx_eq(south, 180.0, 0.01));
        assert!(approx_eq(west, 270.0, 0.01));
    }

    #[test]
    fn test_destination_round_trip_distance() {
        let origin = GpsPoint::new(45.0, 7.0);
        let moved = destination(&origin, 135.0, 500.0);
        assert!(approx_eq(haversine_distance(&origin, &moved), 500.0, 0.5));
        assert!(approx_eq(bearing(&origin, &moved), 135.0, 0.1));
    }

    #[test]
    fn test_shortest_angle_delta_wraps() {
        assert!(approx_eq(shortest_angle_delta(10.0, 30.0), 20.0, 1e-9));
        assert!(approx_eq(shortest_angle_delta(350.0, 10.0), 20.0, 1e-9));
        assert!(approx_eq(shortest_angle_delta(10.0, 350.0), -20.0, 1e-9));
        assert!(approx_eq(shortest_angle_delta(-170.0, 170.0), -20.0, 1e-9));
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert!(approx_eq(normalize_bearing(-90.0), 270.0, 1e-9));
        assert!(approx_eq(normalize_bearing(725.0), 5.0, 1e-9));
        assert!(normalize_bearing(-1e-20) < 360.0);
    }

    #[test]
    fn test_wrap_longitude() {
        assert!(approx_eq(wrap_longitude(190.0), -170.0, 1e-9));
        assert!(approx_eq(wrap_longitude(-190.0), 170.0, 1e-9));
        assert!(approx_eq(wrap_longitude(12.5), 12.5, 1e-9));
    }

    #[test]
    fn test_lerp_point() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(2.0, 4.0);
        let mid = lerp_point(&a, &b, 0.5);
        assert_eq!(mid, GpsPoint::new(1.0, 2.0));
        assert_eq!(lerp_point(&a, &b, 0.0), a);
        assert_eq!(lerp_point(&a, &b, 1.0), b);
    }

    #[test]
    fn test_planar_distance_sq() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(3.0, 4.0);
        assert!(approx_eq(planar_distance_sq(&a, &b), 25.0, 1e-12));
    }

    #[test]
    fn test_compute_bounds() {
        let track = vec![
            GpsPoint::new(51.50, -0.13),
            GpsPoint::new(51.51, -0.12),
            GpsPoint::new(51.505, -0.125),
        ];
        let bounds = compute_bounds(&track);
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lat, 51.51);
        assert_eq!(bounds.min_lng, -0.13);
        assert_eq!(bounds.max_lng, -0.12);
    }

    #[test]
    fn test_compute_center() {
        let track = vec![
            GpsPoint::new(51.50, -0.10),
            GpsPoint::new(51.52, -0.12),
        ];
        let center = compute_center(&track);
        assert!(approx_eq(center.latitude, 51.51, 0.001));
        assert!(approx_eq(center.longitude, -0.11, 0.001));
    }

    #[test]
    fn test_compute_center_empty() {
        let center = compute_center(&[]);
        assert_eq!(center.latitude, 0.0);
        assert_eq!(center.longitude, 0.0);
    }
}
