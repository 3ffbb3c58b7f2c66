//! # Geometry / Path Builder
//!
//! Converts an ordered point list (source endpoint, 0..=5 user control
//! points, target endpoint) into a smooth SVG path, and projects a
//! canvas click onto the nearest polyline segment so a new control point
//! can be inserted where the user actually clicked.
//!
//! Both functions are pure and deterministic: identical input yields
//! byte-identical output.

use std::fmt::Write as _;

use crate::primitives::{DEFAULT_TENSION, MAX_TENSION};
use crate::types::Point;

fn clamp_tension(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_TENSION;
    }
    value.clamp(0.0, MAX_TENSION)
}

/// Build a smooth SVG path through a sequence of points.
///
/// Uses a Catmull-Rom spline converted into cubic Bezier segments (C1
/// continuous at interior points). Segments missing a neighbor on one
/// side use a phantom endpoint duplicating the nearest real point, so
/// the curve still interpolates every input point.
///
/// Returns `""` when fewer than 2 points are given: nothing to draw.
#[must_use]
pub fn build_curve_path(points: &[Point]) -> String {
    build_curve_path_with_tension(points, DEFAULT_TENSION)
}

/// [`build_curve_path`] with an explicit tension in `[0, 2]`.
///
/// Tension 1.0 is standard Catmull-Rom; 0 degenerates towards straight
/// segments. Out-of-range values are clamped, non-finite values fall
/// back to the default.
#[must_use]
pub fn build_curve_path_with_tension(points: &[Point], tension: f64) -> String {
    if points.len() < 2 {
        return String::new();
    }

    let t = clamp_tension(tension) / 6.0;

    let start = points[0];
    let mut d = format!("M {} {}", start.x, start.y);

    for i in 0..points.len() - 1 {
        // Phantom neighbors: reuse the nearest real point at the ends.
        let p0 = if i == 0 { points[0] } else { points[i - 1] };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = *points.get(i + 2).unwrap_or(&p2);

        let cp1x = p1.x + (p2.x - p0.x) * t;
        let cp1y = p1.y + (p2.y - p0.y) * t;
        let cp2x = p2.x - (p3.x - p1.x) * t;
        let cp2y = p2.y - (p3.y - p1.y) * t;

        let _ = write!(d, " C {cp1x} {cp1y}, {cp2x} {cp2y}, {} {}", p2.x, p2.y);
    }

    d
}

/// Squared distance from `p` to the segment `[a, b]`, with the clamped
/// projection parameter `t` in `[0, 1]`. A zero-length segment reduces
/// to point distance at `t = 0`.
#[must_use]
pub fn seg_distance_sq(p: Point, a: Point, b: Point) -> (f64, f64) {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let wx = p.x - a.x;
    let wy = p.y - a.y;
    let vv = vx * vx + vy * vy;
    let t = if vv > 0.0 {
        ((wx * vx + wy * vy) / vv).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = p.x - (a.x + t * vx);
    let dy = p.y - (a.y + t * vy);
    (dx * dx + dy * dy, t)
}

/// The result of projecting a click onto a relationship polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHit {
    /// Index `i` of the closest segment `[polyline[i], polyline[i + 1]]`.
    pub segment: usize,
    /// Where a new control point should be inserted: the segment index
    /// clamped into `[0, existing control point count]`.
    pub insert_index: usize,
}

/// Find the polyline segment closest to `query` by squared
/// point-to-segment distance. Ties go to the first (lowest) index.
///
/// `polyline` is the full ordered point list: both endpoints plus the
/// existing control points between them. Returns `None` only when the
/// polyline has no segment at all.
#[must_use]
pub fn nearest_segment(polyline: &[Point], query: Point) -> Option<SegmentHit> {
    if polyline.len() < 2 {
        return None;
    }

    let control_point_count = polyline.len() - 2;
    let mut best_index = 0;
    let mut best_d2 = f64::INFINITY;

    for i in 0..polyline.len() - 1 {
        let (d2, _) = seg_distance_sq(query, polyline[i], polyline[i + 1]);
        if d2 < best_d2 {
            best_d2 = d2;
            best_index = i;
        }
    }

    Some(SegmentHit {
        segment: best_index,
        insert_index: best_index.min(control_point_count),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_points_yield_empty_path() {
        assert_eq!(build_curve_path(&[]), "");
        assert_eq!(build_curve_path(&[Point::new(0.0, 0.0)]), "");
    }

    #[test]
    fn two_point_path_is_byte_exact() {
        let path = build_curve_path(&[Point::new(0.0, 0.0), Point::new(60.0, 0.0)]);
        assert_eq!(path, "M 0 0 C 10 0, 50 0, 60 0");
    }

    #[test]
    fn multi_segment_path_passes_through_every_point() {
        let path = build_curve_path(&[
            Point::new(0.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(120.0, 60.0),
        ]);
        assert!(path.starts_with("M 0 0 C"));
        assert!(path.contains(", 60 0"));
        assert!(path.ends_with(" 120 60"));
        assert_eq!(path.matches(" C ").count(), 2);
    }

    #[test]
    fn tension_is_clamped_and_defaulted() {
        let pts = [Point::new(0.0, 0.0), Point::new(60.0, 0.0)];
        let nan = build_curve_path_with_tension(&pts, f64::NAN);
        assert_eq!(nan, build_curve_path(&pts));

        let huge = build_curve_path_with_tension(&pts, 100.0);
        let max = build_curve_path_with_tension(&pts, MAX_TENSION);
        assert_eq!(huge, max);

        // Zero tension degenerates control points onto the endpoints.
        let zero = build_curve_path_with_tension(&pts, 0.0);
        assert_eq!(zero, "M 0 0 C 0 0, 60 0, 60 0");
    }

    #[test]
    fn path_is_deterministic() {
        let pts = [
            Point::new(3.25, -1.5),
            Point::new(40.0, 17.0),
            Point::new(81.5, 3.125),
        ];
        assert_eq!(build_curve_path(&pts), build_curve_path(&pts));
    }

    #[test]
    fn seg_distance_clamps_projection_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let (d2, t) = seg_distance_sq(Point::new(-5.0, 0.0), a, b);
        assert_eq!((d2, t), (25.0, 0.0));
        let (d2, t) = seg_distance_sq(Point::new(15.0, 0.0), a, b);
        assert_eq!((d2, t), (25.0, 1.0));
        let (d2, t) = seg_distance_sq(Point::new(5.0, 3.0), a, b);
        assert_eq!((d2, t), (9.0, 0.5));
    }

    #[test]
    fn seg_distance_handles_degenerate_segment() {
        let a = Point::new(2.0, 2.0);
        let (d2, t) = seg_distance_sq(Point::new(5.0, 6.0), a, a);
        assert_eq!((d2, t), (25.0, 0.0));
    }

    #[test]
    fn two_point_polyline_always_hits_segment_zero() {
        let line = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        for query in [
            Point::new(-50.0, 80.0),
            Point::new(50.0, -3.0),
            Point::new(400.0, 400.0),
        ] {
            let hit = nearest_segment(&line, query).expect("has a segment");
            assert_eq!(hit.segment, 0);
            assert_eq!(hit.insert_index, 0);
        }
        assert_eq!(nearest_segment(&line[..1], Point::new(0.0, 0.0)), None);
        assert_eq!(nearest_segment(&[], Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn nearest_segment_picks_closest_and_breaks_ties_low() {
        // Three collinear points: two segments.
        let line = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        ];
        let near_second = nearest_segment(&line, Point::new(17.0, 2.0)).expect("hit");
        assert_eq!(near_second.segment, 1);
        // One interior control point between the endpoints.
        assert_eq!(near_second.insert_index, 1);

        // Equidistant from both segments: the shared vertex. Lowest index wins.
        let tie = nearest_segment(&line, Point::new(10.0, 5.0)).expect("hit");
        assert_eq!(tie.segment, 0);
    }

    #[test]
    fn insert_index_clamped_to_control_point_count() {
        // Endpoints plus two control points: segments 0..=2, controls 0..=2.
        let line = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        ];
        let hit = nearest_segment(&line, Point::new(29.0, 1.0)).expect("hit");
        assert_eq!(hit.segment, 2);
        assert_eq!(hit.insert_index, 2);
    }
}
