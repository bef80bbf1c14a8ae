//! # Route Geometry
//!
//! The immutable polyline a playback session animates along, with its cumulative
//! distances precomputed once and an R-tree of its segments for projecting markers
//! onto the route.
//!
//! ## Projection and route order
//!
//! A marker's trigger key is its distance along the route, not its raw position. The
//! nearest segment always wins. Only when several passes are equally close (a marker
//! on a crossing, or a start/finish on a loop) does [`RouteGeometry::project`] use a
//! route-order hint to pick between them.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{PlaybackError, Result};
use crate::geo_utils::{compute_bounds, cumulative_distances, lerp_point};
use crate::{Bounds, GpsPoint};

/// Segments whose distance to the query is within this many degrees of the nearest
/// segment are treated as equally close (~0.1 m).
pub const DEFAULT_TIE_TOLERANCE_DEG: f64 = 1e-6;

/// Candidates within this many meters along the route of each other belong to the
/// same pass.
pub const DEFAULT_PASS_SPAN_M: f64 = 100.0;

/// A marker position snapped onto the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteProjection {
    /// Nearest point on the polyline
    pub point: GpsPoint,
    /// Index of the segment the point lies on
    pub segment_index: usize,
    /// Distance along the route in meters
    pub distance_along: f64,
    /// `distance_along / total_distance`, 0.0 on a zero-length route
    pub fraction: f64,
}

// =============================================================================
// R-tree Indexed Segment for Spatial Queries
// =============================================================================

/// One route segment in (lng, lat) space, with its position in the polyline.
#[derive(Debug, Clone, Copy)]
struct IndexedSegment {
    idx: usize,
    start: [f64; 2],
    end: [f64; 2],
}

impl IndexedSegment {
    /// Parameter in [0, 1] of the point on the segment closest to `point`.
    fn closest_t(&self, point: &[f64; 2]) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let len_sq = dx * dx + dy * dy;
        if len_sq <= 0.0 {
            return 0.0;
        }
        (((point[0] - self.start[0]) * dx + (point[1] - self.start[1]) * dy) / len_sq)
            .clamp(0.0, 1.0)
    }
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start, self.end)
    }
}

impl PointDistance for IndexedSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let t = self.closest_t(point);
        let x = self.start[0] + t * (self.end[0] - self.start[0]);
        let y = self.start[1] + t * (self.end[1] - self.start[1]);
        let dx = point[0] - x;
        let dy = point[1] - y;
        dx * dx + dy * dy
    }
}

/// A projection together with its squared planar distance from the query.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    projection: RouteProjection,
    distance_2: f64,
}

/// Closest candidate whose distance-along satisfies `in_pass`.
fn closest_in_pass(candidates: &[Candidate], in_pass: impl Fn(f64) -> bool) -> Option<RouteProjection> {
    candidates
        .iter()
        .filter(|c| in_pass(c.projection.distance_along))
        .min_by(|a, b| a.distance_2.total_cmp(&b.distance_2))
        .map(|c| c.projection)
}

// =============================================================================
// Route Geometry
// =============================================================================

/// An ordered, validated route polyline.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    points: Vec<GpsPoint>,
    cumulative: Vec<f64>,
    total_distance: f64,
    bounds: Bounds,
    segments: RTree<IndexedSegment>,
    tie_tolerance: f64,
    pass_span: f64,
}

impl RouteGeometry {
    /// Build a route from its coordinates.
    ///
    /// Fails on empty input or on any coordinate outside WGS84 ranges. A single point
    /// (or a route whose points all coincide) is accepted and has zero length.
    pub fn new(points: Vec<GpsPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(PlaybackError::EmptyRoute);
        }
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(PlaybackError::InvalidCoordinate {
                index,
                latitude: p.latitude,
                longitude: p.longitude,
            });
        }

        let cumulative = cumulative_distances(&points);
        let total_distance = cumulative.last().copied().unwrap_or(0.0);
        let bounds = compute_bounds(&points);

        let indexed: Vec<IndexedSegment> = points
            .windows(2)
            .enumerate()
            .map(|(idx, w)| IndexedSegment {
                idx,
                start: [w[0].longitude, w[0].latitude],
                end: [w[1].longitude, w[1].latitude],
            })
            .collect();

        Ok(Self {
            points,
            cumulative,
            total_distance,
            bounds,
            segments: RTree::bulk_load(indexed),
            tie_tolerance: DEFAULT_TIE_TOLERANCE_DEG,
            pass_span: DEFAULT_PASS_SPAN_M,
        })
    }

    /// Override the projection tie tolerance (degrees) and pass span (meters).
    pub fn with_projection_tuning(mut self, tie_tolerance_deg: f64, pass_span_m: f64) -> Self {
        self.tie_tolerance = tie_tolerance_deg.max(0.0);
        self.pass_span = pass_span_m.max(0.0);
        self
    }

    /// Along-route extent of one pass, in meters.
    pub fn pass_span(&self) -> f64 {
        self.pass_span
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    /// Running distance in meters at each vertex.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total route length in meters.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// True when the route has no length to animate along.
    pub fn is_degenerate(&self) -> bool {
        self.total_distance.is_nan() || self.total_distance <= 0.0
    }

    /// Convert a distance in meters to a route fraction. Zero-length routes return 0.0.
    pub fn distance_to_fraction(&self, meters: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            meters / self.total_distance
        }
    }

    /// Point at `distance` meters along the route, clamped to the route ends.
    pub fn point_at_distance(&self, distance: f64) -> GpsPoint {
        let last = self.points.len() - 1;
        if last == 0 || distance <= 0.0 || distance.is_nan() {
            return self.points[0];
        }
        if distance >= self.total_distance {
            return self.points[last];
        }

        // First vertex strictly beyond the target; the segment ends there.
        let end = self
            .cumulative
            .partition_point(|&d| d <= distance)
            .clamp(1, last);
        let start = end - 1;

        let seg_len = self.cumulative[end] - self.cumulative[start];
        let t = if seg_len > 0.0 {
            (distance - self.cumulative[start]) / seg_len
        } else {
            0.0
        };
        lerp_point(&self.points[start], &self.points[end], t)
    }

    /// Project a point onto the nearest point of the route.
    ///
    /// `min_distance` only matters when several passes are equally close to `point`:
    /// the first of them at or after `min_distance` along the route is chosen. With
    /// no equally close pass ahead, the nearest segment wins.
    pub fn project(&self, point: &GpsPoint, min_distance: f64) -> RouteProjection {
        let candidates = self.candidates(point);
        let first_ahead = candidates
            .iter()
            .filter(|c| c.projection.distance_along >= min_distance)
            .min_by(|a, b| a.projection.distance_along.total_cmp(&b.projection.distance_along));

        let chosen = match first_ahead {
            Some(first) => {
                let pass_start = first.projection.distance_along;
                let span = self.pass_span;
                closest_in_pass(&candidates, |d| d >= pass_start && d - pass_start <= span)
            }
            None => candidates.first().map(|c| c.projection),
        };
        chosen.unwrap_or_else(|| self.start_projection())
    }

    /// Project a point onto the last of the equally close passes.
    ///
    /// Used for finish markers, which on a loop course coincide with the start.
    pub fn project_last(&self, point: &GpsPoint) -> RouteProjection {
        let candidates = self.candidates(point);
        let last = candidates
            .iter()
            .map(|c| c.projection.distance_along)
            .fold(f64::NEG_INFINITY, f64::max);

        let span = self.pass_span;
        closest_in_pass(&candidates, |d| d <= last && last - d <= span)
            .unwrap_or_else(|| self.start_projection())
    }

    /// Projections onto every segment as close as the nearest one, nearest first.
    fn candidates(&self, point: &GpsPoint) -> Vec<Candidate> {
        let query = [point.longitude, point.latitude];
        let Some(nearest) = self.segments.nearest_neighbor(&query) else {
            return Vec::new();
        };

        let nearest_d2 = nearest.distance_2(&query);
        let radius = nearest_d2.sqrt() + self.tie_tolerance;
        let mut candidates = vec![Candidate {
            projection: self.projection_on(nearest, &query),
            distance_2: nearest_d2,
        }];
        candidates.extend(
            self.segments
                .locate_within_distance(query, radius * radius)
                .filter(|seg| seg.idx != nearest.idx)
                .map(|seg| Candidate {
                    projection: self.projection_on(seg, &query),
                    distance_2: seg.distance_2(&query),
                }),
        );
        candidates
    }

    fn start_projection(&self) -> RouteProjection {
        RouteProjection {
            point: self.points[0],
            segment_index: 0,
            distance_along: 0.0,
            fraction: 0.0,
        }
    }

    fn projection_on(&self, seg: &IndexedSegment, query: &[f64; 2]) -> RouteProjection {
        let t = seg.closest_t(query);
        let start = self.cumulative[seg.idx];
        let end = self.cumulative[seg.idx + 1];
        let distance_along = start + t * (end - start);
        RouteProjection {
            point: lerp_point(&self.points[seg.idx], &self.points[seg.idx + 1], t),
            segment_index: seg.idx,
            distance_along,
            fraction: self.distance_to_fraction(distance_along),
        }
    }
}
