//! Perspective camera in geocentric coordinates.

use glam::{DMat4, DQuat, DVec3};
use tessera_tiling::Frustum;

/// A look-at camera with a symmetric perspective projection.
///
/// Everything is `f64`: geocentric coordinates on a WGS84 globe are in meters
/// and lose precision quickly in `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Camera at `position` looking at `target` with +Z (the polar axis) up.
    pub fn looking_at(position: DVec3, target: DVec3) -> Self {
        Self {
            position,
            target,
            up: DVec3::Z,
            fov_y: 45f64.to_radians(),
            near: 0.001,
            far: 500.0,
        }
    }

    /// Camera orbiting a globe of `radius` at `altitude` above the surface,
    /// looking at its center. Clip planes scale with the radius.
    pub fn orbiting(radius: f64, altitude: f64, fov_y: f64) -> Self {
        Self {
            position: DVec3::X * (radius + altitude),
            target: DVec3::ZERO,
            up: DVec3::Z,
            fov_y,
            near: radius * 1e-4,
            far: radius * 100.0,
        }
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    /// OpenGL-style clip space (`-w..w` depth), which is what
    /// [`Frustum`] extracts its planes from.
    pub fn projection_matrix(&self, aspect: f64) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f64) -> DMat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn frustum(&self, aspect: f64) -> Frustum {
        Frustum::new(&self.view_matrix(), &self.projection_matrix(aspect))
    }

    pub fn distance_to(&self, point: DVec3) -> f64 {
        self.position.distance(point)
    }

    /// Rotate the position around `target` about the `up` axis.
    pub fn orbit(&mut self, angle: f64) {
        let rotation = DQuat::from_axis_angle(self.up.normalize(), angle);
        self.position = self.target + rotation * (self.position - self.target);
    }
}
