//! Pluggable interaction effects and the pointer sink contract.

use tracing::{info, warn};

use crate::detector::Interaction;
use crate::geometry::Coord2D;

/// Strategy invoked by the handler for each interaction phase.
///
/// Two variants cover the two acquisition modes: [`PointerEffect`] drives a
/// pointer during normal detection, [`CaptureEffect`] sits passive during
/// calibration where only the qualifying tap matters.
pub trait InteractionEffect {
    fn on_start(&mut self, interaction: &Interaction);
    fn on_move(&mut self, interaction: &Interaction);
    fn on_end(&mut self, interaction: &Interaction);
}

/// Pointer-injection contract, in screen-space pixels.
///
/// The concrete OS injector lives outside this crate; tests and the CLI use
/// [`TracingPointerSink`].
pub trait PointerSink {
    fn press(&mut self, at: Coord2D);
    fn move_to(&mut self, at: Coord2D);
    fn release(&mut self, at: Coord2D);
}

/// Effect that maps Start/Move/End onto press/move/release on a sink.
///
/// Events without a virtual location (uncalibrated session) are dropped
/// with a warning; there is no meaningful cursor position to inject.
pub struct PointerEffect<S: PointerSink> {
    sink: S,
}

impl<S: PointerSink> PointerEffect<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: PointerSink> InteractionEffect for PointerEffect<S> {
    fn on_start(&mut self, interaction: &Interaction) {
        match interaction.virtual_location {
            Some(at) => self.sink.press(at),
            None => warn!("Uncalibrated Start dropped; no virtual location"),
        }
    }

    fn on_move(&mut self, interaction: &Interaction) {
        if let Some(at) = interaction.virtual_location {
            self.sink.move_to(at);
        }
    }

    fn on_end(&mut self, interaction: &Interaction) {
        match interaction.virtual_location {
            Some(at) => self.sink.release(at),
            None => warn!("Uncalibrated End dropped; no virtual location"),
        }
    }
}

/// Calibration-capture effect: no side effects per phase; the handler's tap
/// verdict tells the calibration loop when to record the contact.
#[derive(Debug, Default)]
pub struct CaptureEffect;

impl InteractionEffect for CaptureEffect {
    fn on_start(&mut self, _interaction: &Interaction) {}
    fn on_move(&mut self, _interaction: &Interaction) {}
    fn on_end(&mut self, _interaction: &Interaction) {}
}

/// Pointer sink that logs injections instead of performing them.
#[derive(Debug, Default)]
pub struct TracingPointerSink;

impl PointerSink for TracingPointerSink {
    fn press(&mut self, at: Coord2D) {
        info!("pointer press at ({}, {})", at.x, at.y);
    }

    fn move_to(&mut self, at: Coord2D) {
        info!("pointer move to ({}, {})", at.x, at.y);
    }

    fn release(&mut self, at: Coord2D) {
        info!("pointer release at ({}, {})", at.x, at.y);
    }
}
