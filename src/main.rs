//! Virtual Monitor - depth-camera touchscreen for projected surfaces
//!
//! This is the main entry point for the virtual-monitor CLI tool. Without a
//! windowing shell it drives the core against a recorded sample file.

use std::env;
use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;

use virtual_monitor::handler::TracingPointerSink;
use virtual_monitor::sensor::ReplaySource;
use virtual_monitor::{MonitorSettings, VirtualMonitor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let calibrate = args.iter().any(|arg| arg == "--calibrate");
    let sample_file = args
        .iter()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .cloned()
        .or_else(|| env::var("SAMPLE_FILE").ok());

    let Some(sample_file) = sample_file else {
        eprintln!("Usage: virtual-monitor [--calibrate] <sample-file>");
        eprintln!("  sample-file: recorded frames, one 'x y z distance' line per sample");
        std::process::exit(2);
    };

    // Settings from the config file, with environment overrides
    let mut settings = MonitorSettings::load();
    if let Ok(path) = env::var("CALIBRATION_DATA_FILE") {
        settings.calibration_path = path;
    }
    if let Some(width) = env::var("SCREEN_WIDTH").ok().and_then(|s| s.parse().ok()) {
        settings.screen_width = width;
    }
    if let Some(height) = env::var("SCREEN_HEIGHT").ok().and_then(|s| s.parse().ok()) {
        settings.screen_height = height;
    }

    println!("🖥️  Virtual Monitor - Projected Touchscreen");
    println!("============================================");
    println!("Sample file: {}", sample_file);
    println!("Screen: {}x{}", settings.screen_width, settings.screen_height);
    println!("Calibration data: {}", settings.calibration_path);
    println!();

    let mut monitor = VirtualMonitor::new(settings.monitor_config());
    let source = ReplaySource::new(&sample_file);

    if calibrate {
        run_calibration(&mut monitor, source).await?;
    } else {
        run_detection(&mut monitor, source)?;
    }

    Ok(())
}

/// Replay detection until the stream drains or the user asks to stop.
fn run_detection(monitor: &mut VirtualMonitor, source: ReplaySource) -> anyhow::Result<()> {
    monitor.start_detection(source, TracingPointerSink)?;

    print!("Detection running; press Enter to stop... ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    monitor.stop_detection()?;
    println!("Detection stopped.");
    Ok(())
}

/// Replay a calibration pass, reporting each captured target.
async fn run_calibration(
    monitor: &mut VirtualMonitor,
    source: ReplaySource,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    monitor.start_calibration(source, tx)?;

    println!("Calibrating; tap each displayed target in order.");
    let mut completed = false;
    while let Some(progress) = rx.recv().await {
        println!("  ✓ point {}/{}", progress.index + 1, progress.total);
        if progress.complete {
            completed = true;
            break;
        }
    }

    monitor.stop_calibration()?;
    if completed {
        println!("Calibration complete.");
    } else {
        println!("Calibration ended before all points were visited; nothing saved.");
    }
    Ok(())
}
