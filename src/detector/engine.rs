//! The interaction detector state machine.
//!
//! One detector owns one frame source for one session. Each session is a
//! reduction: per-frame proximity samples in, a clean sequence of
//! Start/Move/End events out, with hysteresis around the contact threshold
//! so boundary chatter does not fabricate taps.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use super::interaction::{Interaction, InteractionKind};
use crate::calibration::{CalibrationError, CalibrationPointSet, Transform};
use crate::geometry::{Coord2D, Coord3D};
use crate::sensor::{FrameSource, SensorError};

/// Thresholds and reduction tuning for a detector session.
///
/// Contact is entered when the plane distance drops to `press_distance` or
/// below, and left when it rises above `release_distance`; keeping the
/// release level higher gives the hysteresis band. Calibration uses its own
/// pair of levels tuned for a deliberate tap rather than continuous
/// tracking.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Contact-entry distance for normal detection, in sensor depth units.
    pub press_distance: f64,
    /// Contact-exit distance for normal detection; must be >= press.
    pub release_distance: f64,
    /// Contact-entry distance during calibration.
    pub calibration_press_distance: f64,
    /// Contact-exit distance during calibration.
    pub calibration_release_distance: f64,
    /// Minimum planar motion (physical pixels) before a Move is emitted.
    /// Zero reports every in-contact frame.
    pub move_epsilon: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            press_distance: 10.0,
            release_distance: 14.0,
            calibration_press_distance: 6.0,
            calibration_release_distance: 12.0,
            move_epsilon: 0.0,
        }
    }
}

impl DetectorConfig {
    /// Set the normal-detection press/release distances.
    ///
    /// `release` is raised to `press` when lower, keeping the hysteresis
    /// band non-negative.
    pub fn with_thresholds(mut self, press: f64, release: f64) -> Self {
        self.press_distance = press;
        self.release_distance = release.max(press);
        self
    }

    /// Set the calibration press/release distances.
    ///
    /// `release` is raised to `press` when lower.
    pub fn with_calibration_thresholds(mut self, press: f64, release: f64) -> Self {
        self.calibration_press_distance = press;
        self.calibration_release_distance = release.max(press);
        self
    }

    /// Set the Move suppression epsilon.
    pub fn with_move_epsilon(mut self, epsilon: f64) -> Self {
        self.move_epsilon = epsilon;
        self
    }
}

/// Reduces a frame source's sample stream to interaction events.
pub struct InteractionDetector<S: FrameSource> {
    source: S,
    config: DetectorConfig,
    transform: Option<Transform>,
    /// `(width, height)` clamp bounds for virtual coordinates.
    screen: Option<(i32, i32)>,
    started: bool,
    contacting: bool,
    /// Last in-contact physical position; tracked independently of Move
    /// suppression so End never carries stale coordinates.
    last_contact: Option<Coord3D>,
    /// Position of the last emitted Start/Move; the suppression reference,
    /// so a slow drag cannot accumulate unbounded unreported drift.
    last_emitted: Option<Coord3D>,
}

impl<S: FrameSource> InteractionDetector<S> {
    /// Create a detector over `source` with default tuning.
    pub fn new(source: S) -> Self {
        Self::with_config(source, DetectorConfig::default())
    }

    /// Create a detector with explicit tuning.
    pub fn with_config(source: S, config: DetectorConfig) -> Self {
        Self {
            source,
            config,
            transform: None,
            screen: None,
            started: false,
            contacting: false,
            last_contact: None,
            last_emitted: None,
        }
    }

    /// Bind a calibration point set and rebuild the transform from it.
    ///
    /// On failure the detector continues in uncalibrated mode: events carry
    /// physical coordinates only. May be called only before or between
    /// detection passes.
    pub fn set_calibration_points(
        &mut self,
        points: &CalibrationPointSet,
    ) -> Result<(), CalibrationError> {
        match Transform::fit(points) {
            Ok(transform) => {
                self.transform = Some(transform);
                info!(
                    "Calibration transform rebuilt from {} points",
                    points.len()
                );
                Ok(())
            }
            Err(e) => {
                self.transform = None;
                warn!("Calibration rejected, continuing uncalibrated: {}", e);
                Err(e)
            }
        }
    }

    /// Configure the virtual screen bounds used to clamp mapped coordinates.
    pub fn set_screen_virtual(&mut self, height: i32, width: i32) {
        self.screen = Some((width, height));
    }

    /// Whether a calibration transform is currently bound.
    pub fn is_calibrated(&self) -> bool {
        self.transform.is_some()
    }

    /// Open the frame source and begin a session.
    pub fn start(&mut self) -> Result<(), SensorError> {
        self.source.open()?;
        self.started = true;
        self.contacting = false;
        self.last_contact = None;
        self.last_emitted = None;
        info!("Interaction detector started");
        Ok(())
    }

    /// Poll the frame source until the next interaction event.
    ///
    /// Returns `None` when the stream ends, a read fails, or `cancel` is
    /// raised; all three mean the caller's acquisition loop should wind
    /// down. `cancel` is checked once per sample, so stop latency is
    /// bounded by one frame period. With `is_calibrating` the
    /// calibration-tuned thresholds apply; the state machine is the same.
    pub fn detect_interaction(
        &mut self,
        is_calibrating: bool,
        cancel: &AtomicBool,
    ) -> Option<Interaction> {
        if !self.started {
            return None;
        }

        let (press, release) = if is_calibrating {
            (
                self.config.calibration_press_distance,
                self.config.calibration_release_distance,
            )
        } else {
            (self.config.press_distance, self.config.release_distance)
        };

        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            let sample = match self.source.read_sample() {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    debug!("Frame stream ended");
                    return None;
                }
                Err(e) => {
                    // Read errors are fatal to the session, not retried here.
                    error!("Sensor read failed, ending session: {}", e);
                    return None;
                }
            };

            if self.contacting {
                if sample.contact_distance > release {
                    self.contacting = false;
                    self.last_emitted = None;
                    let physical = self.last_contact.take().unwrap_or(sample.position);
                    return Some(Interaction::new(
                        InteractionKind::End,
                        physical,
                        self.map_virtual(physical),
                    ));
                }

                self.last_contact = Some(sample.position);
                if self.config.move_epsilon > 0.0 {
                    if let Some(reference) = self.last_emitted {
                        if reference.planar_distance(&sample.position) < self.config.move_epsilon {
                            continue;
                        }
                    }
                }
                self.last_emitted = Some(sample.position);
                return Some(Interaction::new(
                    InteractionKind::Move,
                    sample.position,
                    self.map_virtual(sample.position),
                ));
            }

            if sample.contact_distance <= press {
                self.contacting = true;
                self.last_contact = Some(sample.position);
                self.last_emitted = Some(sample.position);
                return Some(Interaction::new(
                    InteractionKind::Start,
                    sample.position,
                    self.map_virtual(sample.position),
                ));
            }
            // Idle and above threshold: keep polling.
        }
    }

    /// Release the frame source. Idempotent; a no-op when not started.
    ///
    /// If a contact is still in progress a terminal `End` is synthesized
    /// and returned so the downstream effect (a pressed pointer) is not
    /// left dangling.
    pub fn stop(&mut self) -> Option<Interaction> {
        if !self.started {
            return None;
        }

        self.started = false;
        self.source.close();
        info!("Interaction detector stopped");

        if self.contacting {
            self.contacting = false;
            let physical = self.last_contact.take()?;
            debug!("Synthesizing End for contact still active at stop");
            return Some(Interaction::new(
                InteractionKind::End,
                physical,
                self.map_virtual(physical),
            ));
        }
        None
    }

    fn map_virtual(&self, physical: Coord3D) -> Option<Coord2D> {
        let mapped = self.transform.as_ref()?.apply(physical);
        Some(match self.screen {
            Some((width, height)) => mapped.clamped(width, height),
            None => mapped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ScriptedSource;

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    /// Detector with press == release == 5 so scenarios read directly off
    /// the raw threshold.
    fn flat_threshold_detector(
        distances: &[f64],
    ) -> InteractionDetector<ScriptedSource> {
        let samples = distances
            .iter()
            .enumerate()
            .map(|(i, &d)| (i as i32 * 10, i as i32 * 10, 850.0, d));
        InteractionDetector::with_config(
            ScriptedSource::from_tuples(samples),
            DetectorConfig::default().with_thresholds(5.0, 5.0),
        )
    }

    fn drain(detector: &mut InteractionDetector<ScriptedSource>) -> Vec<Interaction> {
        let cancel = no_cancel();
        let mut events = Vec::new();
        while let Some(event) = detector.detect_interaction(false, &cancel) {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_threshold_crossing_scenario() {
        // Distances [10,10,2,2,2,9,9] against threshold 5 must produce
        // Start@2, Move@3, Move@4, End@5 with End carrying idx4 coords.
        let mut detector = flat_threshold_detector(&[10.0, 10.0, 2.0, 2.0, 2.0, 9.0, 9.0]);
        detector.start().unwrap();

        let events = drain(&mut detector);
        let kinds: Vec<InteractionKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InteractionKind::Start,
                InteractionKind::Move,
                InteractionKind::Move,
                InteractionKind::End
            ]
        );

        assert_eq!(events[0].physical, Coord3D::new(20, 20, 850.0));
        assert_eq!(events[2].physical, Coord3D::new(40, 40, 850.0));
        // End carries the last in-contact sample, not the over-threshold one.
        assert_eq!(events[3].physical, Coord3D::new(40, 40, 850.0));
    }

    #[test]
    fn test_single_start_end_per_crossing() {
        let mut detector = flat_threshold_detector(&[9.0, 3.0, 3.0, 9.0, 9.0, 3.0, 9.0]);
        detector.start().unwrap();

        let events = drain(&mut detector);
        let starts = events
            .iter()
            .filter(|e| e.kind == InteractionKind::Start)
            .count();
        let ends = events
            .iter()
            .filter(|e| e.kind == InteractionKind::End)
            .count();
        assert_eq!(starts, 2);
        assert_eq!(ends, 2);
    }

    #[test]
    fn test_idle_invariant() {
        // No Move or End without a preceding unmatched Start.
        let mut detector = flat_threshold_detector(&[2.0, 8.0, 2.0, 2.0, 8.0, 8.0, 1.0]);
        detector.start().unwrap();

        let mut depth = 0_i32;
        for event in drain(&mut detector) {
            match event.kind {
                InteractionKind::Start => {
                    assert_eq!(depth, 0, "Start while already contacting");
                    depth += 1;
                }
                InteractionKind::Move => assert_eq!(depth, 1, "Move without Start"),
                InteractionKind::End => {
                    assert_eq!(depth, 1, "End without Start");
                    depth -= 1;
                }
            }
        }
    }

    #[test]
    fn test_inverted_thresholds_are_clamped() {
        let config = DetectorConfig::default()
            .with_thresholds(10.0, 4.0)
            .with_calibration_thresholds(6.0, 2.0);
        assert_eq!(config.release_distance, 10.0);
        assert_eq!(config.calibration_release_distance, 6.0);
    }

    #[test]
    fn test_hysteresis_suppresses_chatter() {
        // Press at 5, release at 8: a bounce to 7 stays in contact.
        let mut detector = InteractionDetector::with_config(
            ScriptedSource::from_tuples([
                (0, 0, 850.0, 10.0),
                (1, 1, 850.0, 4.0),
                (2, 2, 850.0, 7.0),
                (3, 3, 850.0, 4.0),
                (4, 4, 850.0, 9.0),
            ]),
            DetectorConfig::default().with_thresholds(5.0, 8.0),
        );
        detector.start().unwrap();

        let kinds: Vec<InteractionKind> = drain(&mut detector).iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InteractionKind::Start,
                InteractionKind::Move,
                InteractionKind::Move,
                InteractionKind::End
            ]
        );
    }

    #[test]
    fn test_uncalibrated_events_omit_virtual() {
        let mut detector = flat_threshold_detector(&[2.0, 9.0]);
        detector.start().unwrap();

        let events = drain(&mut detector);
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| e.virtual_location.is_none()));
    }

    #[test]
    fn test_calibrated_events_carry_clamped_virtual() {
        use crate::calibration::CalibrationPointSet;
        use crate::geometry::Coord2D;

        let mut set = CalibrationPointSet::new(2, 2);
        // Identity-ish mapping scaled x4 onto a 400x400 screen.
        set.record(0, Coord3D::new(0, 0, 850.0), Coord2D::new(0, 0));
        set.record(1, Coord3D::new(100, 0, 850.0), Coord2D::new(400, 0));
        set.record(2, Coord3D::new(0, 100, 850.0), Coord2D::new(0, 400));
        set.record(3, Coord3D::new(100, 100, 850.0), Coord2D::new(400, 400));

        let mut detector = InteractionDetector::with_config(
            ScriptedSource::from_tuples([(50, 50, 850.0, 2.0), (500, 500, 850.0, 2.0)]),
            DetectorConfig::default().with_thresholds(5.0, 5.0),
        );
        detector.set_calibration_points(&set).unwrap();
        detector.set_screen_virtual(400, 400);
        detector.start().unwrap();

        let cancel = no_cancel();
        let start = detector.detect_interaction(false, &cancel).unwrap();
        assert_eq!(start.virtual_location, Some(Coord2D::new(200, 200)));

        // Physical point far outside the calibrated area clamps to bounds.
        let moved = detector.detect_interaction(false, &cancel).unwrap();
        assert_eq!(moved.virtual_location, Some(Coord2D::new(399, 399)));
    }

    #[test]
    fn test_calibration_mode_uses_tighter_threshold() {
        let config = DetectorConfig::default()
            .with_thresholds(10.0, 10.0)
            .with_calibration_thresholds(3.0, 3.0);
        let mut detector = InteractionDetector::with_config(
            ScriptedSource::from_tuples([(0, 0, 850.0, 5.0)]),
            config,
        );
        detector.start().unwrap();

        // Distance 5 would press in normal mode but not during calibration.
        let cancel = no_cancel();
        assert!(detector.detect_interaction(true, &cancel).is_none());
    }

    #[test]
    fn test_move_epsilon_suppression_keeps_final_coords() {
        let mut detector = InteractionDetector::with_config(
            ScriptedSource::from_tuples([
                (100, 100, 850.0, 2.0), // Start
                (101, 100, 850.0, 2.0), // 1 px, suppressed
                (102, 101, 850.0, 2.0), // ~2.2 px from the Start, suppressed
                (200, 200, 850.0, 9.0), // End
            ]),
            DetectorConfig::default()
                .with_thresholds(5.0, 5.0)
                .with_move_epsilon(5.0),
        );
        detector.start().unwrap();

        let events = drain(&mut detector);
        let kinds: Vec<InteractionKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![InteractionKind::Start, InteractionKind::End]);
        // End carries the last in-contact sample even though its Move was
        // suppressed.
        assert_eq!(events[1].physical, Coord3D::new(102, 101, 850.0));
    }

    #[test]
    fn test_slow_drag_still_emits_moves() {
        // 2 px per frame under a 5 px epsilon: drift accumulates against
        // the last emitted position, so a Move surfaces at 6 px total.
        let mut detector = InteractionDetector::with_config(
            ScriptedSource::from_tuples([
                (100, 100, 850.0, 2.0), // Start
                (102, 100, 850.0, 2.0), // 2 px from Start, suppressed
                (104, 100, 850.0, 2.0), // 4 px, suppressed
                (106, 100, 850.0, 2.0), // 6 px, Move
                (108, 100, 850.0, 2.0), // 2 px from the Move, suppressed
                (200, 200, 850.0, 9.0), // End
            ]),
            DetectorConfig::default()
                .with_thresholds(5.0, 5.0)
                .with_move_epsilon(5.0),
        );
        detector.start().unwrap();

        let events = drain(&mut detector);
        let kinds: Vec<InteractionKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![InteractionKind::Start, InteractionKind::Move, InteractionKind::End]
        );
        assert_eq!(events[1].physical, Coord3D::new(106, 100, 850.0));
        // End still carries the freshest in-contact sample.
        assert_eq!(events[2].physical, Coord3D::new(108, 100, 850.0));
    }

    #[test]
    fn test_stop_synthesizes_end_for_active_contact() {
        let mut detector = flat_threshold_detector(&[2.0, 2.0]);
        detector.start().unwrap();

        let cancel = no_cancel();
        let start = detector.detect_interaction(false, &cancel).unwrap();
        assert_eq!(start.kind, InteractionKind::Start);

        let synthesized = detector.stop().expect("pending contact must End");
        assert_eq!(synthesized.kind, InteractionKind::End);
        assert_eq!(synthesized.physical, start.physical);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut detector = flat_threshold_detector(&[]);
        assert!(detector.stop().is_none());

        detector.start().unwrap();
        assert!(detector.stop().is_none());
        assert!(detector.stop().is_none());
    }

    #[test]
    fn test_cancel_unblocks_idle_poll() {
        // An idle stream never crosses the threshold; cancellation must
        // still return promptly.
        let mut detector = flat_threshold_detector(&[10.0; 32]);
        detector.start().unwrap();

        let cancel = AtomicBool::new(true);
        assert!(detector.detect_interaction(false, &cancel).is_none());
    }

    #[test]
    fn test_start_failure_propagates() {
        let mut detector = InteractionDetector::new(ScriptedSource::failing("unplugged"));
        assert!(matches!(detector.start(), Err(SensorError::Open(_))));

        // Contract: detect after a failed start yields nothing.
        let cancel = no_cancel();
        assert!(detector.detect_interaction(false, &cancel).is_none());
    }

    #[test]
    fn test_insufficient_calibration_degrades() {
        let mut detector = flat_threshold_detector(&[]);
        let empty = CalibrationPointSet::new(2, 4);
        assert!(detector.set_calibration_points(&empty).is_err());
        assert!(!detector.is_calibrated());
    }
}
