//! Longitude/latitude windows in degrees.

use std::fmt;

/// Slack for containment tests, so grid cells computed by repeated division
/// still count as inside the atlas cell they were derived from.
const CONTAINMENT_EPSILON: f64 = 1e-9;

/// A geographic rectangle spanning
/// `[longitude, longitude + longitude_width] × [latitude, latitude + latitude_width]`.
///
/// `longitude` is the western edge in \[-180, 180), `latitude` the southern
/// edge in \[-90, 90). Widths are positive degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoRect {
    pub longitude: f64,
    pub latitude: f64,
    pub longitude_width: f64,
    pub latitude_width: f64,
}

impl GeoRect {
    pub fn new(longitude: f64, latitude: f64, longitude_width: f64, latitude_width: f64) -> Self {
        Self {
            longitude,
            latitude,
            longitude_width,
            latitude_width,
        }
    }

    /// The whole globe.
    pub fn globe() -> Self {
        Self::new(-180.0, -90.0, 360.0, 180.0)
    }

    pub fn east(&self) -> f64 {
        self.longitude + self.longitude_width
    }

    pub fn north(&self) -> f64 {
        self.latitude + self.latitude_width
    }

    /// Center as `(longitude, latitude)` in degrees.
    pub fn center(&self) -> (f64, f64) {
        (
            self.longitude + self.longitude_width / 2.0,
            self.latitude + self.latitude_width / 2.0,
        )
    }

    /// Corners as `(longitude, latitude)` pairs in perimeter order:
    /// south-west, south-east, north-east, north-west.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.longitude, self.latitude),
            (self.east(), self.latitude),
            (self.east(), self.north()),
            (self.longitude, self.north()),
        ]
    }

    /// `true` if `other` lies entirely inside this rect (edges included).
    pub fn contains(&self, other: &GeoRect) -> bool {
        other.longitude >= self.longitude - CONTAINMENT_EPSILON
            && other.latitude >= self.latitude - CONTAINMENT_EPSILON
            && other.east() <= self.east() + CONTAINMENT_EPSILON
            && other.north() <= self.north() + CONTAINMENT_EPSILON
    }

    /// Fraction of this rect's width and height covered by `inner`.
    pub fn coverage_of(&self, inner: &GeoRect) -> (f64, f64) {
        (
            inner.longitude_width / self.longitude_width,
            inner.latitude_width / self.latitude_width,
        )
    }
}

impl fmt::Display for GeoRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}\u{00B0}..{:.3}\u{00B0} lon, {:.3}\u{00B0}..{:.3}\u{00B0} lat]",
            self.longitude,
            self.east(),
            self.latitude,
            self.north()
        )
    }
}
