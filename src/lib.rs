//! # Virtual Monitor
//!
//! Turns a depth-sensing camera and a flat projected surface into a virtual
//! touchscreen: a continuous acquisition loop interprets depth frames,
//! reduces them to discrete touch interactions (start / move / end), maps
//! each physical contact point onto the projected screen through a fitted
//! calibration transform, and drives a pluggable pointer sink.
//!
//! The windowing shell, the concrete depth-sensor SDK, and the OS pointer
//! injector stay outside the crate; they plug in through the
//! [`sensor::FrameSource`] and [`handler::PointerSink`] contracts.
//!
//! ## Detection Example
//!
//! ```rust,no_run
//! use virtual_monitor::{MonitorConfig, VirtualMonitor};
//! use virtual_monitor::sensor::ReplaySource;
//! use virtual_monitor::handler::TracingPointerSink;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut monitor = VirtualMonitor::new(MonitorConfig::default());
//!     monitor.start_detection(ReplaySource::new("session.samples"), TracingPointerSink)?;
//!     // ... until the user asks to stop:
//!     monitor.stop_detection()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Calibration Example
//!
//! ```rust,no_run
//! use virtual_monitor::{MonitorConfig, VirtualMonitor};
//! use virtual_monitor::sensor::ReplaySource;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut monitor = VirtualMonitor::new(MonitorConfig::default());
//!     let (tx, mut rx) = mpsc::channel(16);
//!     monitor.start_calibration(ReplaySource::new("taps.samples"), tx)?;
//!
//!     while let Some(progress) = rx.recv().await {
//!         println!("calibrated point {}/{}", progress.index + 1, progress.total);
//!         if progress.complete {
//!             break;
//!         }
//!     }
//!     monitor.stop_calibration()?;
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod detector;
pub mod geometry;
pub mod handler;
pub mod monitor;
pub mod sensor;
pub mod settings;

pub use calibration::{
    CalibrationError, CalibrationPointSet, CalibrationProgress, CalibrationSession, Transform,
};
pub use detector::{DetectorConfig, Interaction, InteractionDetector, InteractionKind};
pub use geometry::{Coord2D, Coord3D};
pub use handler::{InteractionEffect, InteractionHandler, PointerSink};
pub use monitor::{MonitorConfig, MonitorError, MonitorState, VirtualMonitor};
pub use sensor::{FrameSource, PhysicalSample, SensorError};
pub use settings::MonitorSettings;
