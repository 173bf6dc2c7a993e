//! Interaction event type.

use crate::geometry::{Coord2D, Coord3D};

/// Phase of a contact interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Contact began this frame.
    Start,
    /// Contact continued with (possibly) updated coordinates.
    Move,
    /// Contact ended; coordinates are the last in-contact position.
    End,
}

/// One detected interaction event.
///
/// The detector hands each event to exactly one consumer by value; dropping
/// it is the single disposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Contact point in sensor space.
    pub physical: Coord3D,
    /// Contact point in screen space; `None` while running uncalibrated.
    pub virtual_location: Option<Coord2D>,
}

impl Interaction {
    pub fn new(kind: InteractionKind, physical: Coord3D, virtual_location: Option<Coord2D>) -> Self {
        Self {
            kind,
            physical,
            virtual_location,
        }
    }
}
