//! # Marker Clustering
//!
//! Groups markers that sit close together into clusters, so that a water table
//! next to a kilometer post shows as one popup instead of two flickering ones.
//!
//! ## Algorithm
//! 1. Project each marker onto the route (see [`RouteGeometry::project`]) to get
//!    its route fraction. Each marker takes its nearest pass; only markers sharing
//!    an identical coordinate are spread over the equally close passes in turn.
//! 2. Sort by route fraction.
//! 3. Walk the sorted markers. A marker joins the current cluster when it is within
//!    the planar distance threshold of the *previous* marker (chaining, not centroid
//!    distance) and no further along the route than `cluster_max_route_gap`.
//!    Otherwise it starts a new cluster.
//! 4. Each cluster's trigger window is its member fraction range, widened by the
//!    geofence lead before and trail after, clamped to [0, 1].

use std::collections::HashMap;

use log::debug;

use crate::config::PlaybackConfig;
use crate::geo_utils::{compute_center, planar_distance_sq};
use crate::marks::{Mark, MarkCategory};
use crate::popup::{AnchorKey, PopupContent, PopupEntry};
use crate::route::{RouteGeometry, RouteProjection};
use crate::GpsPoint;

/// A marker with its position along the route.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMark {
    pub mark: Mark,
    pub projection: RouteProjection,
}

impl PlacedMark {
    pub fn fraction(&self) -> f64 {
        self.projection.fraction
    }
}

/// Closed interval of route fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionWindow {
    pub start: f64,
    pub end: f64,
}

impl FractionWindow {
    pub fn contains(&self, phase: f64) -> bool {
        phase >= self.start && phase <= self.end
    }

    /// Window widened by `buffer` on both sides.
    pub fn expanded(&self, buffer: f64) -> FractionWindow {
        FractionWindow { start: self.start - buffer, end: self.end + buffer }
    }

    pub fn overlaps(&self, other: &FractionWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Route-order-consecutive markers shown as one popup.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Position in the cluster sequence
    pub id: usize,
    /// Members in route order
    pub marks: Vec<PlacedMark>,
    /// Mean of the member coordinates; the popup anchor
    pub centroid: GpsPoint,
    /// Smallest member route fraction
    pub start_fraction: f64,
    /// Largest member route fraction
    pub end_fraction: f64,
    /// Trigger window: member range widened by the geofence lead/trail
    pub window: FractionWindow,
}

impl Cluster {
    pub fn anchor(&self) -> GpsPoint {
        self.centroid
    }

    pub fn has_category(&self, category: MarkCategory) -> bool {
        self.marks.iter().any(|m| m.mark.category == category)
    }

    /// Popup body listing every member.
    pub fn popup_content(&self) -> PopupContent {
        let title = self
            .marks
            .iter()
            .map(|m| m.mark.name.as_str())
            .collect::<Vec<_>>()
            .join(" · ");
        let entries = self
            .marks
            .iter()
            .map(|m| PopupEntry { name: m.mark.name.clone(), category: m.mark.category })
            .collect();
        PopupContent { title, entries }
    }
}

/// Project classified markers onto the route, keeping input order.
///
/// Every marker snaps to its nearest point on the route, whatever order the markers
/// arrive in. Where several passes are equally close, start markers take the
/// earliest and finish markers the latest. Other markers at an identical coordinate
/// take the equally close passes one after another: the first copy the earliest
/// pass, the next copy the following pass.
pub fn project_marks(marks: Vec<Mark>, route: &RouteGeometry) -> Vec<PlacedMark> {
    let mut reached: HashMap<AnchorKey, f64> = HashMap::new();
    marks
        .into_iter()
        .map(|mark| {
            let projection = match mark.category {
                MarkCategory::Start => route.project(&mark.coordinate, 0.0),
                MarkCategory::Finish => route.project_last(&mark.coordinate),
                _ => {
                    let key = AnchorKey::of(&mark.coordinate);
                    let hint = reached
                        .get(&key)
                        .map_or(0.0, |d| d + route.pass_span().max(f64::EPSILON));
                    let projection = route.project(&mark.coordinate, hint);
                    reached.insert(key, projection.distance_along);
                    projection
                }
            };
            PlacedMark { mark, projection }
        })
        .collect()
}

/// Cluster projected markers. Output is ordered by route fraction.
pub fn cluster_marks(
    mut placed: Vec<PlacedMark>,
    route: &RouteGeometry,
    config: &PlaybackConfig,
) -> Vec<Cluster> {
    placed.sort_by(|a, b| a.fraction().total_cmp(&b.fraction()));

    let threshold_sq = config.cluster_distance_threshold * config.cluster_distance_threshold;
    let lead = route.distance_to_fraction(config.geofence_lead);
    let trail = route.distance_to_fraction(config.geofence_trail);

    let mut groups: Vec<Vec<PlacedMark>> = Vec::new();
    for mark in placed {
        let joins = groups
            .last()
            .and_then(|group| group.last())
            .map(|prev| {
                planar_distance_sq(&prev.mark.coordinate, &mark.mark.coordinate) < threshold_sq
                    && mark.projection.distance_along - prev.projection.distance_along
                        <= config.cluster_max_route_gap
            })
            .unwrap_or(false);

        match groups.last_mut() {
            Some(group) if joins => group.push(mark),
            _ => groups.push(vec![mark]),
        }
    }

    let clusters: Vec<Cluster> = groups
        .into_iter()
        .enumerate()
        .map(|(id, marks)| build_cluster(id, marks, lead, trail))
        .collect();

    debug!("[Cluster] {} clusters", clusters.len());
    clusters
}

fn build_cluster(id: usize, marks: Vec<PlacedMark>, lead: f64, trail: f64) -> Cluster {
    let coords: Vec<GpsPoint> = marks.iter().map(|m| m.mark.coordinate).collect();
    let start_fraction = marks.iter().map(PlacedMark::fraction).fold(f64::INFINITY, f64::min);
    let end_fraction = marks.iter().map(PlacedMark::fraction).fold(f64::NEG_INFINITY, f64::max);

    Cluster {
        id,
        centroid: compute_center(&coords),
        start_fraction,
        end_fraction,
        window: FractionWindow {
            start: (start_fraction - lead).max(0.0),
            end: (end_fraction + trail).min(1.0),
        },
        marks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{classify_marks, MarkFeature};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// 10 km eastward along the equator (0.09° ≈ 10 km).
    fn long_route() -> RouteGeometry {
        let points = (0..=90).map(|i| GpsPoint::new(0.0, i as f64 * 0.001)).collect();
        RouteGeometry::new(points).unwrap()
    }

    /// Out east, loop north, back west across the outbound leg at (0, 0.05).
    fn figure_eight() -> RouteGeometry {
        RouteGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.1),
            GpsPoint::new(0.05, 0.1),
            GpsPoint::new(0.05, 0.05),
            GpsPoint::new(-0.05, 0.05),
        ])
        .unwrap()
    }

    fn features(items: &[(f64, f64, &str)]) -> Vec<MarkFeature> {
        items
            .iter()
            .map(|(lat, lng, name)| MarkFeature::new(GpsPoint::new(*lat, *lng), *name))
            .collect()
    }

    fn build(route: &RouteGeometry, items: &[(f64, f64, &str)], config: &PlaybackConfig) -> Vec<Cluster> {
        let placed = project_marks(classify_marks(&features(items)), route);
        cluster_marks(placed, route, config)
    }

    #[test]
    fn test_nearby_marks_form_one_cluster() {
        let route = long_route();
        let config = PlaybackConfig::default();
        let clusters = build(
            &route,
            &[(0.0, 0.0200, "KM 2"), (0.0001, 0.0202, "Water"), (0.0, 0.0500, "Gel")],
            &config,
        );
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].marks.len(), 2);
        assert!(clusters[0].has_category(MarkCategory::Water));
        assert_eq!(clusters[1].marks[0].mark.name, "Gel");
        assert!(approx_eq(clusters[0].centroid.longitude, 0.0201, 1e-9));
    }

    #[test]
    fn test_joining_chains_on_previous_mark() {
        // Each mark is 40 m from the previous one, 120 m end to end.
        let route = long_route();
        let config = PlaybackConfig::default();
        let clusters = build(
            &route,
            &[
                (0.0, 0.0300, "Water"),
                (0.0, 0.03036, "Gel"),
                (0.0, 0.03072, "Fuel"),
                (0.0, 0.03108, "KM 3"),
            ],
            &config,
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].marks.len(), 4);
    }

    #[test]
    fn test_window_is_member_range_plus_buffers() {
        let route = long_route();
        let config = PlaybackConfig { geofence_lead: 100.0, geofence_trail: 200.0, ..Default::default() };
        let clusters = build(&route, &[(0.0, 0.045, "Water")], &config);
        let c = &clusters[0];
        let lead = 100.0 / route.total_distance();
        let trail = 200.0 / route.total_distance();
        assert!(approx_eq(c.start_fraction, 0.5, 1e-9));
        assert!(approx_eq(c.window.start, 0.5 - lead, 1e-9));
        assert!(approx_eq(c.window.end, 0.5 + trail, 1e-9));
    }

    #[test]
    fn test_windows_clamped_to_route() {
        let route = long_route();
        let config = PlaybackConfig::default();
        let clusters = build(&route, &[(0.0, 0.0, "Start"), (0.0, 0.09, "Finish")], &config);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].window.start, 0.0);
        assert_eq!(clusters[1].window.end, 1.0);
    }

    #[test]
    fn test_output_sorted_by_route_order() {
        let route = long_route();
        let config = PlaybackConfig::default();
        // Input deliberately out of order
        let clusters = build(
            &route,
            &[(0.0, 0.08, "KM 8"), (0.0, 0.01, "KM 1"), (0.0, 0.05, "KM 5")],
            &config,
        );
        let names: Vec<&str> = clusters.iter().map(|c| c.marks[0].mark.name.as_str()).collect();
        assert_eq!(names, vec!["KM 1", "KM 5", "KM 8"]);
        for (i, c) in clusters.iter().enumerate() {
            assert_eq!(c.id, i);
        }
    }

    #[test]
    fn test_clustering_is_deterministic_and_idempotent() {
        let route = long_route();
        let config = PlaybackConfig::default();
        let items = [
            (0.0, 0.010, "KM 1"),
            (0.0001, 0.0101, "Water"),
            (0.0, 0.020, "KM 2"),
            (0.0, 0.060, "Gel"),
        ];
        let placed = project_marks(classify_marks(&features(&items)), &route);

        let first = cluster_marks(placed.clone(), &route, &config);
        let second = cluster_marks(placed, &route, &config);
        assert_eq!(first, second);

        // Re-clustering already-sorted members gives the same result
        let resorted: Vec<PlacedMark> = first.iter().flat_map(|c| c.marks.clone()).collect();
        assert_eq!(cluster_marks(resorted, &route, &config), first);
    }

    #[test]
    fn test_self_intersection_yields_distinct_clusters() {
        let route = figure_eight();
        let config = PlaybackConfig::default();
        let crossing = (0.0, 0.05);
        let clusters = build(
            &route,
            &[
                (crossing.0, crossing.1, "Water"),
                (0.05, 0.075, "KM 10"),
                (crossing.0, crossing.1, "Gel"),
            ],
            &config,
        );

        assert_eq!(clusters.len(), 3);
        let water = clusters.iter().find(|c| c.has_category(MarkCategory::Water)).unwrap();
        let gel = clusters.iter().find(|c| c.has_category(MarkCategory::Gel)).unwrap();
        assert!(gel.start_fraction > water.end_fraction);
        assert!(!water.window.overlaps(&gel.window));
        assert_eq!(water.centroid, gel.centroid);
    }

    #[test]
    fn test_coincident_marks_on_different_passes_never_merge() {
        // Same as above but with nothing between them in route order
        let route = figure_eight();
        let config = PlaybackConfig::default();
        let placed = vec![
            PlacedMark {
                mark: Mark {
                    coordinate: GpsPoint::new(0.0, 0.05),
                    name: "Water".to_string(),
                    category: MarkCategory::Water,
                },
                projection: route.project(&GpsPoint::new(0.0, 0.05), 0.0),
            },
            PlacedMark {
                mark: Mark {
                    coordinate: GpsPoint::new(0.0, 0.05),
                    name: "Gel".to_string(),
                    category: MarkCategory::Gel,
                },
                projection: route.project_last(&GpsPoint::new(0.0, 0.05)),
            },
        ];
        let clusters = cluster_marks(placed, &route, &config);
        assert_eq!(clusters.len(), 2);
        assert!(!clusters[0].window.overlaps(&clusters[1].window));
    }

    #[test]
    fn test_loop_start_and_finish_separate() {
        let route = RouteGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.03),
            GpsPoint::new(0.03, 0.03),
            GpsPoint::new(0.03, 0.0),
            GpsPoint::new(0.0, 0.0),
        ])
        .unwrap();
        let config = PlaybackConfig::default();
        let clusters = build(&route, &[(0.0, 0.0, "Finish"), (0.0, 0.0, "Start")], &config);
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].has_category(MarkCategory::Start));
        assert_eq!(clusters[0].start_fraction, 0.0);
        assert!(clusters[1].has_category(MarkCategory::Finish));
        assert!(approx_eq(clusters[1].end_fraction, 1.0, 1e-9));
    }

    /// Out along the equator and back 5.5 m further north.
    fn out_and_back() -> RouteGeometry {
        RouteGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.01),
            GpsPoint::new(0.00005, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_projection_independent_of_input_order() {
        let route = out_and_back();
        let items = [(0.0, 0.008, "Water"), (0.0, 0.002, "KM 0.2"), (0.00004, 0.002, "Gel")];
        let shuffled = [items[2], items[0], items[1]];

        let fractions = |items: &[(f64, f64, &str)]| {
            let mut placed: Vec<(String, f64)> = project_marks(classify_marks(&features(items)), &route)
                .into_iter()
                .map(|p| (p.mark.name.clone(), p.fraction()))
                .collect();
            placed.sort_by(|a, b| a.0.cmp(&b.0));
            placed
        };

        let forward = fractions(&items);
        assert_eq!(forward, fractions(&shuffled));

        let km = forward.iter().find(|(n, _)| n == "KM 0.2").unwrap();
        assert!(approx_eq(km.1, 0.1, 1e-3), "KM 0.2 at {}", km.1);
        let water = forward.iter().find(|(n, _)| n == "Water").unwrap();
        assert!(approx_eq(water.1, 0.4, 1e-3));
        // Gel sits next to the return leg
        let gel = forward.iter().find(|(n, _)| n == "Gel").unwrap();
        assert!(gel.1 > 0.85, "Gel at {}", gel.1);
    }

    #[test]
    fn test_later_mark_keeps_nearest_leg() {
        let route = out_and_back();
        let config = PlaybackConfig::default();
        let clusters = build(&route, &[(0.0, 0.008, "Water"), (0.0, 0.002, "KM 0.2")], &config);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].marks[0].mark.name, "KM 0.2");
        assert!(clusters[0].start_fraction < 0.2);
        assert_eq!(clusters[1].marks[0].mark.name, "Water");
    }

    #[test]
    fn test_popup_content_lists_members() {
        let route = long_route();
        let config = PlaybackConfig::default();
        let clusters = build(&route, &[(0.0, 0.02, "KM 2"), (0.0, 0.0201, "Water")], &config);
        let content = clusters[0].popup_content();
        assert_eq!(content.title, "KM 2 · Water");
        assert_eq!(content.entries.len(), 2);
        assert_eq!(content.entries[1].category, MarkCategory::Water);
    }
}
