//! Calibration session: visit every target in raster order, capture one
//! physical sample per qualifying tap, persist when all points are visited.

use tracing::{debug, info};

use super::points::CalibrationPointSet;
use crate::geometry::{Coord2D, Coord3D};

/// Fraction of each screen dimension kept clear between the outermost
/// targets and the screen edge.
const TARGET_MARGIN_RATIO: f64 = 0.1;

/// Progress report after a captured calibration tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationProgress {
    /// Index of the target just captured.
    pub index: usize,
    /// Total number of targets in this pass.
    pub total: usize,
    /// Whether every target has now been visited.
    pub complete: bool,
}

/// Sequencing state for one calibration pass.
///
/// Targets are laid out on an evenly spaced `rows` x `cols` grid inset from
/// the screen edges and visited in raster order. The displaying shell reads
/// `current_target` to know where to draw the marker; the acquisition loop
/// calls `record_tap` once per qualifying tap.
#[derive(Debug)]
pub struct CalibrationSession {
    points: CalibrationPointSet,
    targets: Vec<Coord2D>,
    next_index: usize,
}

impl CalibrationSession {
    /// Start a pass over a `rows` x `cols` grid on a screen of the given
    /// pixel size.
    pub fn new(rows: usize, cols: usize, screen_width: i32, screen_height: i32) -> Self {
        let targets = raster_targets(rows, cols, screen_width, screen_height);
        info!(
            "Calibration pass over {} targets ({}x{} grid)",
            targets.len(),
            rows,
            cols
        );
        Self {
            points: CalibrationPointSet::new(rows, cols),
            targets,
            next_index: 0,
        }
    }

    /// The target the user should tap next, or `None` when the pass is done.
    pub fn current_target(&self) -> Option<Coord2D> {
        self.targets.get(self.next_index).copied()
    }

    /// Whether every target has been visited.
    pub fn is_complete(&self) -> bool {
        self.next_index >= self.targets.len()
    }

    /// Record the physical location of a qualifying tap on the current
    /// target and advance to the next one.
    ///
    /// Calling after completion reports the final state again without
    /// touching the table.
    pub fn record_tap(&mut self, physical: Coord3D) -> CalibrationProgress {
        let total = self.targets.len();
        if self.is_complete() {
            return CalibrationProgress {
                index: total.saturating_sub(1),
                total,
                complete: true,
            };
        }

        let index = self.next_index;
        let target = self.targets[index];
        self.points.record(index, physical, target);
        self.next_index += 1;

        debug!(
            "Captured calibration point {}/{}: physical ({}, {}, {}) -> virtual ({}, {})",
            index + 1,
            total,
            physical.x,
            physical.y,
            physical.z,
            target.x,
            target.y
        );

        CalibrationProgress {
            index,
            total,
            complete: self.next_index >= total,
        }
    }

    /// The point table collected so far.
    pub fn points(&self) -> &CalibrationPointSet {
        &self.points
    }

    /// Consume the session, yielding the collected table.
    pub fn into_points(self) -> CalibrationPointSet {
        self.points
    }
}

/// Evenly spaced grid targets in raster order, inset from the screen edges.
fn raster_targets(rows: usize, cols: usize, screen_width: i32, screen_height: i32) -> Vec<Coord2D> {
    let margin_x = (screen_width as f64 * TARGET_MARGIN_RATIO).round() as i32;
    let margin_y = (screen_height as f64 * TARGET_MARGIN_RATIO).round() as i32;
    let span_x = (screen_width - 2 * margin_x).max(0);
    let span_y = (screen_height - 2 * margin_y).max(0);

    let mut targets = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let x = if cols > 1 {
                margin_x + (span_x as f64 * col as f64 / (cols - 1) as f64).round() as i32
            } else {
                screen_width / 2
            };
            let y = if rows > 1 {
                margin_y + (span_y as f64 * row as f64 / (rows - 1) as f64).round() as i32
            } else {
                screen_height / 2
            };
            targets.push(Coord2D::new(x, y));
        }
    }
    targets
}
