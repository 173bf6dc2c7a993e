//! Interaction handling: consumes detector events and drives a pluggable
//! effect, tracking whether a discrete tap completed.

mod effect;

pub use effect::{CaptureEffect, InteractionEffect, PointerEffect, PointerSink, TracingPointerSink};

use tracing::debug;

use crate::detector::{Interaction, InteractionKind};
use crate::geometry::Coord3D;

/// Default positional drift (physical pixels) under which a Start/End pair
/// still counts as a discrete tap rather than a drag.
pub const DEFAULT_TAP_TOLERANCE: f64 = 3.0;

/// Consumes interaction events, forwards them to an effect, and reports
/// completed taps.
///
/// The handler takes each `Interaction` by value: the detector produced it,
/// the handler disposes of it, exactly once.
pub struct InteractionHandler {
    effect: Box<dyn InteractionEffect + Send>,
    tap_tolerance: f64,
    /// Where the current contact went down, while one is being tracked.
    contact_down: Option<Coord3D>,
}

impl InteractionHandler {
    /// Create a handler over `effect` with the default tap tolerance.
    pub fn new(effect: Box<dyn InteractionEffect + Send>) -> Self {
        Self::with_tap_tolerance(effect, DEFAULT_TAP_TOLERANCE)
    }

    /// Create a handler with an explicit tap tolerance in physical pixels.
    pub fn with_tap_tolerance(effect: Box<dyn InteractionEffect + Send>, tap_tolerance: f64) -> Self {
        Self {
            effect,
            tap_tolerance,
            contact_down: None,
        }
    }

    /// Handle one event (or `None` for "no new event this cycle").
    ///
    /// Returns `true` only on an `End` whose total drift from its `Start`
    /// stayed within the tap tolerance: a completed discrete tap.
    pub fn handle_interaction(&mut self, interaction: Option<Interaction>) -> bool {
        let Some(interaction) = interaction else {
            return false;
        };

        match interaction.kind {
            InteractionKind::Start => {
                self.contact_down = Some(interaction.physical);
                self.effect.on_start(&interaction);
                false
            }
            InteractionKind::Move => {
                self.effect.on_move(&interaction);
                false
            }
            InteractionKind::End => {
                self.effect.on_end(&interaction);
                let is_tap = match self.contact_down.take() {
                    Some(down) => {
                        let drift = down.planar_distance(&interaction.physical);
                        debug!("Contact ended with {:.1} px drift", drift);
                        drift <= self.tap_tolerance
                    }
                    // End without a tracked Start (e.g. handler attached
                    // mid-contact): not a tap.
                    None => false,
                };
                is_tap
            }
        }
    }
}
