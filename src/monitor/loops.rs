//! Acquisition loop bodies run on the worker thread.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::calibration::{CalibrationPointSet, CalibrationProgress, CalibrationSession};
use crate::detector::InteractionDetector;
use crate::handler::InteractionHandler;
use crate::sensor::FrameSource;

/// Normal detection: reduce samples to events and feed them to the handler
/// until the stream ends or cancellation is observed.
pub(crate) fn run_detection<S: FrameSource>(
    mut detector: InteractionDetector<S>,
    mut handler: InteractionHandler,
    cancel: Arc<AtomicBool>,
) {
    info!("Starting detection...");

    while !cancel.load(Ordering::Relaxed) {
        match detector.detect_interaction(false, &cancel) {
            Some(interaction) => {
                handler.handle_interaction(Some(interaction));
            }
            None => break,
        }
    }

    // A contact still in progress gets its terminal End before the source
    // is released, so the pointer is never left pressed.
    if let Some(end) = detector.stop() {
        handler.handle_interaction(Some(end));
    }
}

/// Calibration: wait for one qualifying tap per target, record it, report
/// progress, and persist the table once every target was visited.
pub(crate) fn run_calibration<S: FrameSource>(
    mut detector: InteractionDetector<S>,
    mut handler: InteractionHandler,
    mut session: CalibrationSession,
    calibration_path: &Path,
    shared_points: Arc<Mutex<CalibrationPointSet>>,
    progress_tx: mpsc::Sender<CalibrationProgress>,
    cancel: Arc<AtomicBool>,
) {
    info!("Starting calibration...");

    while !session.is_complete() && !cancel.load(Ordering::Relaxed) {
        let interaction = detector.detect_interaction(true, &cancel);
        let stream_ended = interaction.is_none();
        let physical = interaction.as_ref().map(|i| i.physical);

        if handler.handle_interaction(interaction) {
            // The qualifying tap's End carries the contact position for the
            // currently displayed target.
            if let Some(physical) = physical {
                let progress = session.record_tap(physical);
                // Fire-and-forget so a slow control thread cannot stall the
                // acquisition loop.
                if progress_tx.try_send(progress).is_err() {
                    warn!("Calibration progress listener not keeping up");
                }
            }
        }

        if stream_ended {
            break;
        }
    }

    if session.is_complete() {
        let points = session.into_points();
        match points.write_to(calibration_path) {
            Ok(()) => info!(
                "Calibration complete, {} points written to {}",
                points.len(),
                calibration_path.display()
            ),
            Err(e) => error!("Could not write calibration data: {}", e),
        }
        *shared_points.lock().expect("calibration table lock poisoned") = points;
    } else {
        warn!(
            "Calibration abandoned after {} of {} points; table not persisted",
            session.points().filled(),
            session.points().len()
        );
    }

    if let Some(end) = detector.stop() {
        handler.handle_interaction(Some(end));
    }
}
