//! Geographic value types and the reference surface the globe is draped on.
//!
//! - [`Resolution`]: pixel or vertex extents.
//! - [`GeoRect`]: a longitude/latitude window in degrees.
//! - [`GridSize`]: how many atlas images one source image was split into.
//! - [`GeodeticSurface`]: pure geodetic → geocentric conversion, implemented by [`Ellipsoid`].

mod ellipsoid;
mod geo_rect;
mod resolution;

pub use ellipsoid::{Ellipsoid, GeodeticSurface};
pub use geo_rect::GeoRect;
pub use resolution::{GridSize, Resolution};
