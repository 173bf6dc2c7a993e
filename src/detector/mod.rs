//! Interaction detection: reduces the raw per-frame proximity signal into
//! discrete Start/Move/End interaction events.

mod engine;
mod interaction;

pub use engine::{DetectorConfig, InteractionDetector};
pub use interaction::{Interaction, InteractionKind};
