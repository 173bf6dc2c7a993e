//! Frame source abstraction over the depth sensor.
//!
//! The concrete sensor SDK is an external collaborator; the detector only
//! needs start/stop/read over a stream of per-frame physical samples. The
//! [`ReplaySource`] and [`ScriptedSource`] implement the same contract from
//! recorded data for tests and offline runs.

mod replay;

pub use replay::{ReplaySource, ScriptedSource};

use thiserror::Error;

use crate::geometry::Coord3D;

/// Sensor errors.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Could not open sensor: {0}")]
    Open(String),
    #[error("Sensor read failed: {0}")]
    Read(String),
    #[error("Sensor is not open")]
    NotOpen,
}

/// One per-frame observation from the sensor: the tracked physical position
/// and its estimated distance from the touch plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSample {
    pub position: Coord3D,
    /// Scalar proximity to the virtual touch plane, in sensor depth units.
    pub contact_distance: f64,
}

impl PhysicalSample {
    pub fn new(position: Coord3D, contact_distance: f64) -> Self {
        Self {
            position,
            contact_distance,
        }
    }
}

/// Contract the interaction detector needs from a depth sensor.
///
/// `read_sample` blocks until the next frame is available; `Ok(None)` means
/// the stream is exhausted or closed. Implementations are not expected to
/// retry reads internally.
pub trait FrameSource {
    /// Acquire the device and start the depth/position stream.
    fn open(&mut self) -> Result<(), SensorError>;

    /// Read the next sample, or `None` at end of stream.
    fn read_sample(&mut self) -> Result<Option<PhysicalSample>, SensorError>;

    /// Release the device. Must be safe to call repeatedly.
    fn close(&mut self);
}
