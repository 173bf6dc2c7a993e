//! Calibration: paired point table, persistence, the physical-to-virtual
//! transform, and the target-by-target calibration session.

mod points;
mod session;
mod transform;

pub use points::{CalibrationError, CalibrationPointSet};
pub use session::{CalibrationProgress, CalibrationSession};
pub use transform::Transform;

/// Calibration grid size used by the stock setup: 2 rows x 4 columns.
pub const DEFAULT_CALIBRATION_ROWS: usize = 2;
pub const DEFAULT_CALIBRATION_COLS: usize = 4;

/// Default calibration data file name.
pub const CALIBRATION_DATA_FILENAME: &str = "calibration.vmcal";
