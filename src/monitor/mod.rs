//! Process wiring: owns the Paused/Detecting/Calibrating state and the
//! acquisition worker thread, maps the external control surface onto the
//! detector and handler.

mod loops;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::calibration::{
    CalibrationPointSet, CalibrationProgress, CalibrationSession, CALIBRATION_DATA_FILENAME,
    DEFAULT_CALIBRATION_COLS, DEFAULT_CALIBRATION_ROWS,
};
use crate::detector::{DetectorConfig, InteractionDetector};
use crate::handler::{
    CaptureEffect, InteractionHandler, PointerEffect, PointerSink, DEFAULT_TAP_TOLERANCE,
};
use crate::sensor::{FrameSource, SensorError};

/// Monitor control errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("An acquisition loop is already running ({0:?})")]
    AlreadyRunning(MonitorState),
    #[error("No acquisition loop of that kind is running")]
    NotRunning,
    #[error(transparent)]
    Sensor(#[from] SensorError),
}

/// Which acquisition mode, if any, is active. The two modes are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Paused,
    Detecting,
    Calibrating,
}

/// Configuration for the virtual monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Calibration grid rows.
    pub rows: usize,
    /// Calibration grid columns.
    pub cols: usize,
    /// Virtual screen width in pixels.
    pub screen_width: i32,
    /// Virtual screen height in pixels.
    pub screen_height: i32,
    /// Path of the persisted calibration table.
    pub calibration_path: PathBuf,
    /// Detector thresholds and tuning.
    pub detector: DetectorConfig,
    /// Tap drift tolerance in physical pixels.
    pub tap_tolerance: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_CALIBRATION_ROWS,
            cols: DEFAULT_CALIBRATION_COLS,
            screen_width: 1920,
            screen_height: 1080,
            calibration_path: PathBuf::from(CALIBRATION_DATA_FILENAME),
            detector: DetectorConfig::default(),
            tap_tolerance: DEFAULT_TAP_TOLERANCE,
        }
    }
}

impl MonitorConfig {
    /// Set the calibration grid size.
    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the virtual screen size.
    pub fn with_screen(mut self, width: i32, height: i32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Set the calibration data file path.
    pub fn with_calibration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_path = path.into();
        self
    }

    /// Set the detector tuning.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Set the tap drift tolerance.
    pub fn with_tap_tolerance(mut self, tolerance: f64) -> Self {
        self.tap_tolerance = tolerance;
        self
    }
}

/// Owns the acquisition lifecycle of the virtual monitor.
///
/// At most one acquisition loop (detection or calibration) runs at a time;
/// `stop_*` raises the cancellation flag and joins the worker before
/// returning, so the frame source is released when it does.
pub struct VirtualMonitor {
    config: MonitorConfig,
    state: MonitorState,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Latest fully collected calibration table, shared with the shell for
    /// display. Written only by a completing calibration loop.
    calibration_points: Arc<Mutex<CalibrationPointSet>>,
}

impl VirtualMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let points = CalibrationPointSet::new(config.rows, config.cols);
        Self {
            config,
            state: MonitorState::Paused,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
            calibration_points: Arc::new(Mutex::new(points)),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Shared view of the latest collected calibration table.
    pub fn calibration_points(&self) -> Arc<Mutex<CalibrationPointSet>> {
        self.calibration_points.clone()
    }

    /// Start normal detection over `source`, injecting pointer events into
    /// `sink`.
    ///
    /// The persisted calibration table is loaded first; when it is missing
    /// or malformed the session runs uncalibrated (physical coordinates
    /// only). Fails with `SensorError` when the source cannot be opened and
    /// with `AlreadyRunning` when an acquisition loop is active.
    pub fn start_detection<S, K>(&mut self, source: S, sink: K) -> Result<(), MonitorError>
    where
        S: FrameSource + Send + 'static,
        K: PointerSink + Send + 'static,
    {
        if self.state != MonitorState::Paused {
            return Err(MonitorError::AlreadyRunning(self.state));
        }

        let mut detector = InteractionDetector::with_config(source, self.config.detector.clone());
        detector.set_screen_virtual(self.config.screen_height, self.config.screen_width);

        match CalibrationPointSet::read_from(
            &self.config.calibration_path,
            self.config.rows,
            self.config.cols,
        ) {
            Ok(points) => {
                // Fit failure already degrades to uncalibrated inside the
                // detector.
                let _ = detector.set_calibration_points(&points);
                *self
                    .calibration_points
                    .lock()
                    .expect("calibration table lock poisoned") = points;
            }
            Err(e) => {
                warn!("Could not read calibration data ({}); running uncalibrated", e);
            }
        }

        // Open on the control thread so "detection did not start" is
        // reported synchronously.
        detector.start()?;

        let handler = InteractionHandler::with_tap_tolerance(
            Box::new(PointerEffect::new(sink)),
            self.config.tap_tolerance,
        );

        self.cancel.store(false, Ordering::Relaxed);
        let cancel = self.cancel.clone();
        self.worker = Some(std::thread::spawn(move || {
            loops::run_detection(detector, handler, cancel);
        }));
        self.state = MonitorState::Detecting;
        Ok(())
    }

    /// Stop detection: raise the cancellation flag and join the worker.
    pub fn stop_detection(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Detecting {
            return Err(MonitorError::NotRunning);
        }
        self.join_worker();
        info!("Detection stopped");
        Ok(())
    }

    /// Start a calibration pass over `source`.
    ///
    /// A running detection loop is stopped first (the modes are mutually
    /// exclusive). Progress is reported on `progress_tx` fire-and-forget;
    /// after the event with `complete == true` the caller should invoke
    /// [`stop_calibration`](Self::stop_calibration) to join the worker.
    pub fn start_calibration<S>(
        &mut self,
        source: S,
        progress_tx: mpsc::Sender<CalibrationProgress>,
    ) -> Result<(), MonitorError>
    where
        S: FrameSource + Send + 'static,
    {
        match self.state {
            MonitorState::Calibrating => return Err(MonitorError::AlreadyRunning(self.state)),
            MonitorState::Detecting => self.stop_detection()?,
            MonitorState::Paused => {}
        }

        let mut detector = InteractionDetector::with_config(source, self.config.detector.clone());
        detector.start()?;

        let handler = InteractionHandler::with_tap_tolerance(
            Box::new(CaptureEffect::default()),
            self.config.tap_tolerance,
        );
        let session = CalibrationSession::new(
            self.config.rows,
            self.config.cols,
            self.config.screen_width,
            self.config.screen_height,
        );

        self.cancel.store(false, Ordering::Relaxed);
        let cancel = self.cancel.clone();
        let path = self.config.calibration_path.clone();
        let shared = self.calibration_points.clone();
        self.worker = Some(std::thread::spawn(move || {
            loops::run_calibration(detector, handler, session, &path, shared, progress_tx, cancel);
        }));
        self.state = MonitorState::Calibrating;
        Ok(())
    }

    /// Stop calibration: raise the cancellation flag and join the worker.
    ///
    /// A pass that already visited every point has persisted its table by
    /// the time this returns; an interrupted pass persists nothing.
    pub fn stop_calibration(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Calibrating {
            return Err(MonitorError::NotRunning);
        }
        self.join_worker();
        info!("Calibration stopped");
        Ok(())
    }

    fn join_worker(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Acquisition worker panicked");
            }
        }
        self.state = MonitorState::Paused;
    }
}

impl Drop for VirtualMonitor {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.join_worker();
        }
    }
}
