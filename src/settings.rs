//! Shared settings for the virtual monitor CLI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::detector::DetectorConfig;
use crate::monitor::MonitorConfig;

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Calibration grid rows
    pub calibration_rows: usize,
    /// Calibration grid columns
    pub calibration_cols: usize,
    /// Virtual screen width in pixels
    pub screen_width: i32,
    /// Virtual screen height in pixels
    pub screen_height: i32,
    /// Calibration data file path
    pub calibration_path: String,
    /// Contact-entry distance for normal detection (sensor depth units)
    pub press_distance: f64,
    /// Contact-exit distance for normal detection
    pub release_distance: f64,
    /// Contact-entry distance during calibration
    pub calibration_press_distance: f64,
    /// Contact-exit distance during calibration
    pub calibration_release_distance: f64,
    /// Minimum planar motion before a Move event is emitted
    pub move_epsilon: f64,
    /// Tap drift tolerance in physical pixels
    pub tap_tolerance: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        let detector = DetectorConfig::default();
        let monitor = MonitorConfig::default();
        Self {
            calibration_rows: monitor.rows,
            calibration_cols: monitor.cols,
            screen_width: monitor.screen_width,
            screen_height: monitor.screen_height,
            calibration_path: monitor.calibration_path.display().to_string(),
            press_distance: detector.press_distance,
            release_distance: detector.release_distance,
            calibration_press_distance: detector.calibration_press_distance,
            calibration_release_distance: detector.calibration_release_distance,
            move_epsilon: detector.move_epsilon,
            tap_tolerance: monitor.tap_tolerance,
        }
    }
}

impl MonitorSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "virtualmonitor", "virtual-monitor")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), String> {
        let dir = Self::config_dir().ok_or("Cannot determine config directory")?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = dir.join("settings.json");
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Build the monitor configuration these settings describe.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::default()
            .with_grid(self.calibration_rows, self.calibration_cols)
            .with_screen(self.screen_width, self.screen_height)
            .with_calibration_path(&self.calibration_path)
            .with_detector(
                DetectorConfig::default()
                    .with_thresholds(self.press_distance, self.release_distance)
                    .with_calibration_thresholds(
                        self.calibration_press_distance,
                        self.calibration_release_distance,
                    )
                    .with_move_epsilon(self.move_epsilon),
            )
            .with_tap_tolerance(self.tap_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_round_trip() {
        let mut settings = MonitorSettings::default();
        settings.press_distance = 7.5;
        settings.calibration_rows = 3;

        let json = serde_json::to_string(&settings).unwrap();
        let loaded: MonitorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.press_distance, 7.5);
        assert_eq!(loaded.calibration_rows, 3);
    }

    #[test]
    fn test_partial_settings_backfill_defaults() {
        let loaded: MonitorSettings = serde_json::from_str(r#"{"screen_width": 2560}"#).unwrap();
        assert_eq!(loaded.screen_width, 2560);
        assert_eq!(loaded.calibration_cols, MonitorSettings::default().calibration_cols);
    }

    #[test]
    fn test_monitor_config_reflects_settings() {
        let mut settings = MonitorSettings::default();
        settings.screen_width = 2560;
        settings.screen_height = 1440;
        settings.tap_tolerance = 6.0;

        let config = settings.monitor_config();
        assert_eq!(config.screen_width, 2560);
        assert_eq!(config.screen_height, 1440);
        assert_eq!(config.tap_tolerance, 6.0);
    }
}
