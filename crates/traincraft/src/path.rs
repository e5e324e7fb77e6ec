//! Parametric track paths.
//!
//! A [`TrackPath`] is the curve a rolling-stock unit follows over one track
//! piece. It is a plain value: behaviours build a fresh one whenever they are
//! asked, and nothing ever mutates one in place.
//!
//! All queries take a normalised parameter `t` in `[0, 1]`; values outside
//! that range are clamped rather than extrapolated.

use std::f64::consts::FRAC_PI_2;

use bevy::math::DVec3;

use crate::config::{BEZIER_LENGTH_STEPS, CLOSEST_SAMPLES_PER_BLOCK};
use crate::orientation::{Facing, Turn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackPath {
    /// Straight line, used for flat and ascending track.
    Straight { start: DVec3, end: DVec3 },
    /// Horizontal circular arc with a constant rise, i.e. a helix segment.
    /// `t` is exactly proportional to arc length.
    Arc {
        /// Centre of the circle at the start height.
        center: DVec3,
        radius: f64,
        start_angle: f64,
        /// Signed sweep in radians; positive sweeps rotate +X towards +Z.
        sweep: f64,
        rise: f64,
    },
    /// Cubic Bezier. `t` is the curve parameter, so equal steps of `t` are
    /// not equal steps of distance.
    Bezier { points: [DVec3; 4], length: f64 },
}

impl TrackPath {
    pub fn straight(start: DVec3, end: DVec3) -> Self {
        debug_assert!(start.distance(end) > 0.0, "zero-length straight path");
        TrackPath::Straight { start, end }
    }

    /// Quarter turn that starts at `start` heading `facing` and ends heading
    /// `facing.turned(turn)`, rising `rise` over its length.
    pub fn quarter_turn(start: DVec3, facing: Facing, turn: Turn, radius: f64, rise: f64) -> Self {
        let side = facing.turned(turn).vector();
        let center = start + side * radius;
        let rel = start - center;
        let start_angle = rel.z.atan2(rel.x);
        // Pick the rotation sense whose initial tangent points along `facing`.
        let forward = DVec3::new(-start_angle.sin(), 0.0, start_angle.cos());
        let sweep = if forward.dot(facing.vector()) > 0.0 {
            FRAC_PI_2
        } else {
            -FRAC_PI_2
        };
        TrackPath::Arc {
            center,
            radius,
            start_angle,
            sweep,
            rise,
        }
    }

    pub fn bezier(points: [DVec3; 4]) -> Self {
        let length = bezier_arc_length(&points);
        TrackPath::Bezier { points, length }
    }

    pub fn start(&self) -> DVec3 {
        match self {
            TrackPath::Straight { start, .. } => *start,
            TrackPath::Arc { .. } => self.interpolate(0.0),
            TrackPath::Bezier { points, .. } => points[0],
        }
    }

    pub fn end(&self) -> DVec3 {
        match self {
            TrackPath::Straight { end, .. } => *end,
            TrackPath::Arc { .. } => self.interpolate(1.0),
            TrackPath::Bezier { points, .. } => points[3],
        }
    }

    /// Position at `t`, clamped to `[0, 1]`.
    pub fn interpolate(&self, t: f64) -> DVec3 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TrackPath::Straight { start, end } => start.lerp(*end, t),
            TrackPath::Arc {
                center,
                radius,
                start_angle,
                sweep,
                rise,
            } => {
                let angle = start_angle + sweep * t;
                DVec3::new(
                    center.x + radius * angle.cos(),
                    center.y + rise * t,
                    center.z + radius * angle.sin(),
                )
            }
            TrackPath::Bezier { points, .. } => {
                let [p0, p1, p2, p3] = *points;
                let u = 1.0 - t;
                let uu = u * u;
                let tt = t * t;
                u * uu * p0 + 3.0 * uu * t * p1 + 3.0 * u * tt * p2 + t * tt * p3
            }
        }
    }

    /// Unit tangent at `t`, clamped to `[0, 1]`.
    pub fn direction(&self, t: f64) -> DVec3 {
        let t = t.clamp(0.0, 1.0);
        let raw = match self {
            TrackPath::Straight { start, end } => *end - *start,
            TrackPath::Arc {
                radius,
                start_angle,
                sweep,
                rise,
                ..
            } => {
                let angle = start_angle + sweep * t;
                DVec3::new(
                    -radius * angle.sin() * sweep,
                    *rise,
                    radius * angle.cos() * sweep,
                )
            }
            TrackPath::Bezier { points, .. } => {
                let [p0, p1, p2, p3] = *points;
                let u = 1.0 - t;
                3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
            }
        };
        let dir = raw.normalize_or_zero();
        if dir != DVec3::ZERO {
            return dir;
        }
        // Coincident control points make the derivative vanish at an end; fall
        // back to the chord so callers always get a unit vector.
        let chord = (self.end() - self.start()).normalize_or_zero();
        if chord == DVec3::ZERO {
            DVec3::X
        } else {
            chord
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            TrackPath::Straight { start, end } => start.distance(*end),
            TrackPath::Arc {
                radius,
                sweep,
                rise,
                ..
            } => (radius * sweep).hypot(*rise),
            TrackPath::Bezier { length, .. } => *length,
        }
    }

    /// The same curve traversed from end to start.
    pub fn reverse(&self) -> TrackPath {
        match *self {
            TrackPath::Straight { start, end } => TrackPath::Straight {
                start: end,
                end: start,
            },
            TrackPath::Arc {
                center,
                radius,
                start_angle,
                sweep,
                rise,
            } => TrackPath::Arc {
                center: center + DVec3::Y * rise,
                radius,
                start_angle: start_angle + sweep,
                sweep: -sweep,
                rise: -rise,
            },
            TrackPath::Bezier { points, length } => {
                let [p0, p1, p2, p3] = points;
                TrackPath::Bezier {
                    points: [p3, p2, p1, p0],
                    length,
                }
            }
        }
    }

    /// Parameter and distance of the point on this path nearest to `point`.
    pub fn closest_progress(&self, point: DVec3) -> (f64, f64) {
        let steps = (self.length().ceil() as usize * CLOSEST_SAMPLES_PER_BLOCK).max(8);
        let mut best_t = 0.0;
        let mut best_dist = f64::INFINITY;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let dist = self.interpolate(t).distance(point);
            if dist < best_dist {
                best_dist = dist;
                best_t = t;
            }
        }

        // Golden-section refinement inside the neighbouring sample intervals,
        // where the distance has a single minimum.
        let step = 1.0 / steps as f64;
        let mut lo = (best_t - step).max(0.0);
        let mut hi = (best_t + step).min(1.0);
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        for _ in 0..REFINE_ITERATIONS {
            let a = hi - (hi - lo) * ratio;
            let b = lo + (hi - lo) * ratio;
            if self.interpolate(a).distance(point) < self.interpolate(b).distance(point) {
                hi = b;
            } else {
                lo = a;
            }
        }
        let t = (lo + hi) * 0.5;
        let dist = self.interpolate(t).distance(point);
        if dist < best_dist {
            best_dist = dist;
            best_t = t;
        }
        (best_t, best_dist)
    }

    /// Whether both paths run between the same endpoints in the same order.
    pub fn same_endpoints(&self, other: &TrackPath, tolerance: f64) -> bool {
        self.start().distance(other.start()) <= tolerance
            && self.end().distance(other.end()) <= tolerance
    }
}

const REFINE_ITERATIONS: usize = 40;

fn bezier_arc_length(points: &[DVec3; 4]) -> f64 {
    let probe = TrackPath::Bezier {
        points: *points,
        length: 0.0,
    };
    let mut length = 0.0;
    let mut prev = points[0];
    for i in 1..=BEZIER_LENGTH_STEPS {
        let pt = probe.interpolate(i as f64 / BEZIER_LENGTH_STEPS as f64);
        length += pt.distance(prev);
        prev = pt;
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn sample_paths() -> Vec<TrackPath> {
        vec![
            TrackPath::straight(DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)),
            TrackPath::straight(DVec3::new(3.0, 0.125, 0.5), DVec3::new(5.0, 1.125, 0.5)),
            TrackPath::quarter_turn(
                DVec3::new(0.5, 0.125, 1.0),
                Facing::North,
                Turn::Right,
                0.5,
                0.0,
            ),
            TrackPath::quarter_turn(
                DVec3::new(10.0, 4.0, -2.0),
                Facing::West,
                Turn::Left,
                2.5,
                1.0,
            ),
            TrackPath::bezier([
                DVec3::new(0.0, 0.0, 0.5),
                DVec3::new(1.5, 0.0, 0.5),
                DVec3::new(1.5, 0.0, 1.5),
                DVec3::new(3.0, 0.0, 1.5),
            ]),
        ]
    }

    #[test]
    fn test_interpolate_hits_endpoints() {
        for path in sample_paths() {
            assert!(path.interpolate(0.0).distance(path.start()) < EPS, "{path:?}");
            assert!(path.interpolate(1.0).distance(path.end()) < EPS, "{path:?}");
        }
    }

    #[test]
    fn test_direction_is_unit_length() {
        for path in sample_paths() {
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let len = path.direction(t).length();
                assert!((len - 1.0).abs() < EPS, "t={t} len={len} {path:?}");
            }
        }
    }

    #[test]
    fn test_out_of_range_parameters_are_clamped() {
        for path in sample_paths() {
            assert_eq!(path.interpolate(-3.0), path.interpolate(0.0));
            assert_eq!(path.interpolate(7.5), path.interpolate(1.0));
            assert_eq!(path.direction(2.0), path.direction(1.0));
        }
    }

    #[test]
    fn test_straight_length_and_direction() {
        let path = TrackPath::straight(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0));
        assert!((path.length() - 5.0).abs() < EPS);
        let dir = path.direction(0.3);
        assert!((dir - DVec3::new(0.6, 0.8, 0.0)).length() < EPS);
        assert!((path.interpolate(0.5) - DVec3::new(1.5, 2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_quarter_turn_geometry() {
        let start = DVec3::new(0.5, 0.0, 1.0);
        let path = TrackPath::quarter_turn(start, Facing::North, Turn::Right, 0.5, 0.0);
        // Enters heading north, leaves heading east half a block over.
        assert!((path.end() - DVec3::new(1.0, 0.0, 0.5)).length() < EPS);
        assert!((path.direction(0.0) - Facing::North.vector()).length() < EPS);
        assert!((path.direction(1.0) - Facing::East.vector()).length() < EPS);
        assert!((path.length() - 0.5 * FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_left_turn_sweeps_the_other_way() {
        let start = DVec3::new(0.5, 0.0, 1.0);
        let path = TrackPath::quarter_turn(start, Facing::North, Turn::Left, 0.5, 0.0);
        assert!((path.end() - DVec3::new(0.0, 0.0, 0.5)).length() < EPS);
        assert!((path.direction(1.0) - Facing::West.vector()).length() < EPS);
    }

    #[test]
    fn test_arc_length_includes_rise() {
        let path = TrackPath::quarter_turn(DVec3::ZERO, Facing::East, Turn::Left, 2.0, 1.5);
        let expected = (2.0 * FRAC_PI_2).hypot(1.5);
        assert!((path.length() - expected).abs() < EPS);
        assert!((path.end().y - 1.5).abs() < EPS);
    }

    #[test]
    fn test_reverse_swaps_endpoints_and_negates_direction() {
        for path in sample_paths() {
            let rev = path.reverse();
            assert!(rev.start().distance(path.end()) < EPS, "{path:?}");
            assert!(rev.end().distance(path.start()) < EPS, "{path:?}");
            assert!((rev.length() - path.length()).abs() < EPS);
            let a = path.direction(0.25);
            let b = rev.direction(0.75);
            assert!((a + b).length() < 1e-4, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_bezier_length_close_to_chord_for_straight_controls() {
        let path = TrackPath::bezier([
            DVec3::ZERO,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
        ]);
        assert!((path.length() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_bezier_end_tangent_falls_back() {
        let path = TrackPath::bezier([
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
        ]);
        assert!((path.direction(0.0) - DVec3::X).length() < EPS);
        assert!((path.direction(1.0) - DVec3::X).length() < EPS);
    }

    #[test]
    fn test_closest_progress_on_straight() {
        let path = TrackPath::straight(DVec3::ZERO, DVec3::new(4.0, 0.0, 0.0));
        let (t, dist) = path.closest_progress(DVec3::new(1.0, 0.5, 0.0));
        assert!((t - 0.25).abs() < 1e-3, "t={t}");
        assert!((dist - 0.5).abs() < 1e-3, "dist={dist}");
    }

    #[test]
    fn test_closest_progress_clamps_beyond_end() {
        let path = TrackPath::straight(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        let (t, _) = path.closest_progress(DVec3::new(9.0, 0.0, 0.0));
        assert_eq!(t, 1.0);
    }
}
