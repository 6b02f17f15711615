//! Reference ellipsoid and the geodetic → geocentric conversions tiles rely on.
//!
//! Geocentric frame: origin at the ellipsoid center, z through the north pole,
//! x through (lon 0, lat 0). Angles are radians.

use glam::DVec3;

/// Pure coordinate conversions from geodetic angles to the geocentric frame.
pub trait GeodeticSurface {
    /// Geocentric point at `height` above the surface at (`longitude`, `latitude`).
    fn geodetic_to_geocentric(&self, longitude: f64, latitude: f64, height: f64) -> DVec3;

    /// Unit outward surface normal at (`longitude`, `latitude`).
    fn surface_normal(&self, longitude: f64, latitude: f64) -> DVec3;
}

/// A triaxial ellipsoid given by its radii.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
}

impl Ellipsoid {
    /// # Panics
    ///
    /// Panics if any radius is not positive.
    pub fn new(radii: DVec3) -> Self {
        assert!(
            radii.min_element() > 0.0,
            "ellipsoid radii must be positive, got {radii}"
        );
        Self {
            radii,
            radii_squared: radii * radii,
        }
    }

    /// WGS84 in meters.
    pub fn wgs84() -> Self {
        Self::new(DVec3::new(6_378_137.0, 6_378_137.0, 6_356_752.314245))
    }

    pub fn unit_sphere() -> Self {
        Self::new(DVec3::ONE)
    }

    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// `1 / radii²`, the form the vertex shader expects.
    pub fn one_over_radii_squared(&self) -> DVec3 {
        DVec3::ONE / self.radii_squared
    }

    /// Largest radius, a bound for camera placement and far planes.
    pub fn maximum_radius(&self) -> f64 {
        self.radii.max_element()
    }
}

impl GeodeticSurface for Ellipsoid {
    fn geodetic_to_geocentric(&self, longitude: f64, latitude: f64, height: f64) -> DVec3 {
        let n = self.surface_normal(longitude, latitude);
        let k = self.radii_squared * n;
        let gamma = k.dot(n).sqrt();
        k / gamma + n * height
    }

    fn surface_normal(&self, longitude: f64, latitude: f64) -> DVec3 {
        let cos_latitude = latitude.cos();
        DVec3::new(
            cos_latitude * longitude.cos(),
            cos_latitude * longitude.sin(),
            latitude.sin(),
        )
    }
}
