//! Calibration point table and its on-disk format.
//!
//! The table pairs each of `rows * cols` calibration targets with the
//! physical coordinate observed when the user touched it. Index `i` refers
//! to the same target in both spaces, in raster order.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::geometry::{Coord2D, Coord3D};

/// Calibration errors.
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Insufficient calibration points: expected {expected}, got {actual}")]
    InsufficientPoints { expected: usize, actual: usize },
    #[error("Degenerate calibration points (coincident or collinear)")]
    DegeneratePoints,
    #[error("Malformed calibration data at line {line}")]
    Malformed { line: usize },
    #[error("Calibration data I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Ordered table of `rows * cols` paired physical/virtual samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPointSet {
    rows: usize,
    cols: usize,
    physical: Vec<Coord3D>,
    virtual_: Vec<Coord2D>,
    /// How many leading entries have been populated by a calibration pass.
    filled: usize,
}

impl CalibrationPointSet {
    /// Allocate an empty table for a `rows` x `cols` grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows * cols;
        Self {
            rows,
            cols,
            physical: vec![Coord3D::default(); len],
            virtual_: vec![Coord2D::default(); len],
            filled: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of calibration targets.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every entry has been populated.
    pub fn is_complete(&self) -> bool {
        self.filled == self.len()
    }

    /// Number of populated entries.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// The paired sample at `index`.
    pub fn pair(&self, index: usize) -> (Coord3D, Coord2D) {
        (self.physical[index], self.virtual_[index])
    }

    pub fn physical(&self) -> &[Coord3D] {
        &self.physical
    }

    pub fn virtual_points(&self) -> &[Coord2D] {
        &self.virtual_
    }

    /// Record the sample pair for target `index`.
    ///
    /// Entries are expected to arrive in raster order during a live
    /// calibration pass; writing index `i` marks entries `0..=i` as filled.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside the `rows * cols` table.
    pub fn record(&mut self, index: usize, physical: Coord3D, virtual_: Coord2D) {
        assert!(
            index < self.len(),
            "calibration index {} out of range for a {}x{} table",
            index,
            self.rows,
            self.cols
        );
        self.physical[index] = physical;
        self.virtual_[index] = virtual_;
        self.filled = self.filled.max(index + 1);
    }

    /// Read a persisted table from `path`.
    ///
    /// The file holds `rows * cols` whitespace-separated lines of
    /// `physical_x physical_y physical_z virtual_x virtual_y` in raster
    /// order. A short or unparsable file is an error; callers treat it the
    /// same as a missing file and continue uncalibrated.
    pub fn read_from(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Self, CalibrationError> {
        let content = fs::read_to_string(path)?;
        let mut set = Self::new(rows, cols);

        let mut index = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if index >= set.len() {
                break;
            }

            let mut fields = line.split_whitespace();
            let parsed = (|| {
                let px: i32 = fields.next()?.parse().ok()?;
                let py: i32 = fields.next()?.parse().ok()?;
                let pz: f64 = fields.next()?.parse().ok()?;
                let vx: i32 = fields.next()?.parse().ok()?;
                let vy: i32 = fields.next()?.parse().ok()?;
                Some((Coord3D::new(px, py, pz), Coord2D::new(vx, vy)))
            })();

            match parsed {
                Some((physical, virtual_)) => set.record(index, physical, virtual_),
                None => return Err(CalibrationError::Malformed { line: line_no + 1 }),
            }
            index += 1;
        }

        if index < set.len() {
            return Err(CalibrationError::InsufficientPoints {
                expected: set.len(),
                actual: index,
            });
        }

        Ok(set)
    }

    /// Write the table to `path` in the format `read_from` expects.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let mut out = String::new();
        for i in 0..self.len() {
            let (p, v) = self.pair(i);
            out.push_str(&format!("{} {} {} {} {}\n", p.x, p.y, p.z, v.x, v.y));
        }
        fs::write(path, out)?;
        Ok(())
    }
}
