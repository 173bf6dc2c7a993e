//! Coordinate types for the sensor (physical) and projected-screen (virtual) spaces.

mod coords;

pub use coords::{Coord2D, Coord3D};
