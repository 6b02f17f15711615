//! View frustum planes and point/edge classification against them.

use glam::{DMat4, DVec3, DVec4};

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Six inward-facing planes extracted from `projection * view`.
///
/// Assumes OpenGL clip space (`-w ≤ z ≤ w`), i.e. projections built with
/// `perspective_rh_gl`.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// `(a, b, c, d)` with `(a, b, c)` the unit inward normal.
    planes: [DVec4; 6],
}

impl Frustum {
    pub fn new(view: &DMat4, projection: &DMat4) -> Self {
        Self::from_view_projection(&(*projection * *view))
    }

    pub fn from_view_projection(vp: &DMat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [DVec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[3] + rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    pub fn planes(&self) -> &[DVec4; 6] {
        &self.planes
    }

    /// Signed distance of `p` to each plane; negative means outside.
    fn distances(&self, p: DVec3) -> [f64; 6] {
        let p = p.extend(1.0);
        self.planes.map(|plane| plane.dot(p))
    }

    /// `true` if `p` is behind at least one plane.
    pub fn is_point_outside(&self, p: DVec3) -> bool {
        self.distances(p).iter().any(|&d| d < 0.0)
    }

    /// `true` if a single plane has every point of `points` behind it.
    ///
    /// Such a point set cannot reach into the frustum, however its edges
    /// cross the other planes.
    pub fn separates(&self, points: &[DVec3]) -> bool {
        !points.is_empty()
            && self
                .planes
                .iter()
                .any(|plane| points.iter().all(|p| plane.dot(p.extend(1.0)) < 0.0))
    }

    /// `true` if the segment `a → b` crosses at least one plane.
    pub fn intersects_edge(&self, a: DVec3, b: DVec3) -> bool {
        let da = self.distances(a);
        let db = self.distances(b);
        da.iter()
            .zip(db.iter())
            .any(|(&x, &y)| (x < 0.0 && y > 0.0) || (x > 0.0 && y < 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Camera at the origin looking down -Z, 90° vertical fov, square aspect.
    fn test_frustum() -> Frustum {
        let view = DMat4::look_at_rh(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y);
        let projection =
            DMat4::perspective_rh_gl(std::f64::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::new(&view, &projection)
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in test_frustum().planes() {
            assert!((plane.truncate().length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_point_in_front_is_inside() {
        let frustum = test_frustum();
        assert!(!frustum.is_point_outside(DVec3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.is_point_outside(DVec3::new(4.0, -4.0, -10.0)));
    }

    #[test]
    fn test_points_outside_each_plane() {
        let frustum = test_frustum();
        // behind the camera
        assert!(frustum.is_point_outside(DVec3::new(0.0, 0.0, 5.0)));
        // closer than the near plane
        assert!(frustum.is_point_outside(DVec3::new(0.0, 0.0, -0.05)));
        // beyond the far plane
        assert!(frustum.is_point_outside(DVec3::new(0.0, 0.0, -200.0)));
        // left, right, bottom, top of a 90° cone at depth 10
        assert!(frustum.is_point_outside(DVec3::new(-11.0, 0.0, -10.0)));
        assert!(frustum.is_point_outside(DVec3::new(11.0, 0.0, -10.0)));
        assert!(frustum.is_point_outside(DVec3::new(0.0, -11.0, -10.0)));
        assert!(frustum.is_point_outside(DVec3::new(0.0, 11.0, -10.0)));
    }

    #[test]
    fn test_edge_crossing_a_plane() {
        let frustum = test_frustum();
        // Both ends outside (left and right), the segment spans the view.
        let a = DVec3::new(-50.0, 0.0, -10.0);
        let b = DVec3::new(50.0, 0.0, -10.0);
        assert!(frustum.is_point_outside(a));
        assert!(frustum.is_point_outside(b));
        assert!(frustum.intersects_edge(a, b));
    }

    #[test]
    fn test_points_behind_one_plane_are_separated() {
        let frustum = test_frustum();
        // Behind the eye and spread across both side planes.
        let behind = [
            DVec3::new(-50.0, -50.0, 5.0),
            DVec3::new(50.0, -50.0, 5.0),
            DVec3::new(50.0, 50.0, 5.0),
            DVec3::new(-50.0, 50.0, 5.0),
        ];
        assert!(frustum.separates(&behind));
        assert!(frustum.intersects_edge(behind[0], behind[1]));

        // Left and right of the view: no single plane has all of them.
        let straddling = [DVec3::new(-50.0, 0.0, -10.0), DVec3::new(50.0, 0.0, -10.0)];
        assert!(!frustum.separates(&straddling));
        assert!(!frustum.separates(&[]));
    }

    #[test]
    fn test_edge_fully_inside_crosses_nothing() {
        let frustum = test_frustum();
        let a = DVec3::new(-1.0, 0.0, -10.0);
        let b = DVec3::new(1.0, 0.0, -10.0);
        assert!(!frustum.intersects_edge(a, b));
    }
}
