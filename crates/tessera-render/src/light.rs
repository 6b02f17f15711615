//! Sun position driven by a simulated clock.
//!
//! The night layer is blended in where the surface faces away from the
//! light, so the renderer hands the light direction to the shader with every
//! frame. Positions are geocentric: z through the north pole, x through the
//! prime meridian.

use std::f64::consts::{PI, TAU};

use glam::DVec3;
use tessera_config::SimulationConfig;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_IN_YEAR: f64 = 365.25;
const AXIAL_TILT_DEGREES: f64 = 23.44;
/// Days after January 1st 00:00 UTC of the June solstice.
const JUNE_SOLSTICE_DAY: f64 = 171.5;

/// Mean Earth-Sun distance in Earth radii.
pub const SUN_DISTANCE_RADII: f64 = 23_455.0;

/// A light that moves with simulated time.
pub trait LightSource {
    /// Move the simulated clock forward by `elapsed` real seconds.
    fn advance(&mut self, elapsed: f64);

    fn light_position(&self) -> DVec3;

    /// Unit vector from the globe's center towards the light.
    fn light_direction(&self) -> DVec3 {
        self.light_position().normalize_or_zero()
    }
}

/// Sun over a fixed, circular orbit.
///
/// The subsolar point moves west by 15° per simulated hour, crossing the
/// prime meridian at 12:00 UTC, and its latitude follows the axial tilt over
/// the year (cosine model peaking at the June solstice).
#[derive(Clone, Debug)]
pub struct SolarSimulator {
    distance: f64,
    time_scale: f64,
    /// Simulated seconds since January 1st 00:00 UTC.
    seconds: f64,
}

impl SolarSimulator {
    pub fn new(distance: f64, config: &SimulationConfig) -> Self {
        Self {
            distance,
            time_scale: config.time_scale,
            seconds: config.start_day * SECONDS_PER_DAY,
        }
    }

    /// Fractional day within the simulated year.
    pub fn day_of_year(&self) -> f64 {
        (self.seconds / SECONDS_PER_DAY).rem_euclid(DAYS_IN_YEAR)
    }

    pub fn seconds_of_day(&self) -> f64 {
        self.seconds.rem_euclid(SECONDS_PER_DAY)
    }

    /// Latitude of the subsolar point in radians.
    pub fn declination(&self) -> f64 {
        let phase = TAU * (self.day_of_year() - JUNE_SOLSTICE_DAY) / DAYS_IN_YEAR;
        AXIAL_TILT_DEGREES.to_radians() * phase.cos()
    }

    /// Longitude of the subsolar point in radians, in `(-π, π]`.
    pub fn subsolar_longitude(&self) -> f64 {
        let hours = self.seconds_of_day() / 3600.0;
        PI * (12.0 - hours) / 12.0
    }
}

impl LightSource for SolarSimulator {
    fn advance(&mut self, elapsed: f64) {
        self.seconds += elapsed.max(0.0) * self.time_scale;
    }

    fn light_position(&self) -> DVec3 {
        let (lat, lon) = (self.declination(), self.subsolar_longitude());
        DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()) * self.distance
    }
}
