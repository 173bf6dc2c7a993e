//! Replay frame sources for tests and offline runs.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{FrameSource, PhysicalSample, SensorError};
use crate::geometry::Coord3D;

/// In-memory frame source fed from a fixed sample vector.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    samples: VecDeque<PhysicalSample>,
    open: bool,
    /// When set, `open` fails with this message instead.
    fail_open: Option<String>,
}

impl ScriptedSource {
    /// Create a source that will replay the given samples in order.
    pub fn new(samples: impl IntoIterator<Item = PhysicalSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            open: false,
            fail_open: None,
        }
    }

    /// Convenience constructor from `(x, y, z, contact_distance)` tuples.
    pub fn from_tuples(tuples: impl IntoIterator<Item = (i32, i32, f64, f64)>) -> Self {
        Self::new(
            tuples
                .into_iter()
                .map(|(x, y, z, d)| PhysicalSample::new(Coord3D::new(x, y, z), d)),
        )
    }

    /// Create a source whose `open` always fails, for error-path tests.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            samples: VecDeque::new(),
            open: false,
            fail_open: Some(message.into()),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<(), SensorError> {
        if let Some(msg) = &self.fail_open {
            return Err(SensorError::Open(msg.clone()));
        }
        self.open = true;
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Option<PhysicalSample>, SensorError> {
        if !self.open {
            return Err(SensorError::NotOpen);
        }
        Ok(self.samples.pop_front())
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Frame source replaying samples from a recorded text file.
///
/// One sample per line: `x y z contact_distance`, whitespace separated.
/// Blank lines and `#` comment lines are skipped.
pub struct ReplaySource {
    path: PathBuf,
    samples: VecDeque<PhysicalSample>,
    open: bool,
}

impl ReplaySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            samples: VecDeque::new(),
            open: false,
        }
    }

    fn parse_line(line: &str) -> Option<PhysicalSample> {
        let mut fields = line.split_whitespace();
        let x: i32 = fields.next()?.parse().ok()?;
        let y: i32 = fields.next()?.parse().ok()?;
        let z: f64 = fields.next()?.parse().ok()?;
        let distance: f64 = fields.next()?.parse().ok()?;
        Some(PhysicalSample::new(Coord3D::new(x, y, z), distance))
    }
}

impl FrameSource for ReplaySource {
    fn open(&mut self) -> Result<(), SensorError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| SensorError::Open(format!("{}: {}", self.path.display(), e)))?;

        self.samples = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(Self::parse_line)
            .collect();

        info!(
            "Replaying {} samples from {}",
            self.samples.len(),
            self.path.display()
        );
        self.open = true;
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Option<PhysicalSample>, SensorError> {
        if !self.open {
            return Err(SensorError::NotOpen);
        }
        Ok(self.samples.pop_front())
    }

    fn close(&mut self) {
        self.open = false;
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scripted_source_replays_in_order() {
        let mut source = ScriptedSource::from_tuples([(1, 2, 3.0, 10.0), (4, 5, 6.0, 2.0)]);
        source.open().unwrap();

        let first = source.read_sample().unwrap().unwrap();
        assert_eq!(first.position, Coord3D::new(1, 2, 3.0));
        assert_eq!(first.contact_distance, 10.0);

        let second = source.read_sample().unwrap().unwrap();
        assert_eq!(second.position, Coord3D::new(4, 5, 6.0));

        assert!(source.read_sample().unwrap().is_none());
    }

    #[test]
    fn test_scripted_source_read_before_open() {
        let mut source = ScriptedSource::from_tuples([(0, 0, 0.0, 0.0)]);
        assert!(matches!(
            source.read_sample(),
            Err(SensorError::NotOpen)
        ));
    }

    #[test]
    fn test_failing_source_open() {
        let mut source = ScriptedSource::failing("no device");
        assert!(matches!(source.open(), Err(SensorError::Open(_))));
    }

    #[test]
    fn test_replay_source_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# recorded session").unwrap();
        writeln!(file, "10 20 850.5 12.0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "11 21 848.0 3.5").unwrap();

        let mut source = ReplaySource::new(file.path());
        source.open().unwrap();

        let first = source.read_sample().unwrap().unwrap();
        assert_eq!(first.position, Coord3D::new(10, 20, 850.5));
        let second = source.read_sample().unwrap().unwrap();
        assert_eq!(second.contact_distance, 3.5);
        assert!(source.read_sample().unwrap().is_none());
    }

    #[test]
    fn test_replay_source_missing_file() {
        let mut source = ReplaySource::new("/nonexistent/samples.log");
        assert!(matches!(source.open(), Err(SensorError::Open(_))));
    }
}
