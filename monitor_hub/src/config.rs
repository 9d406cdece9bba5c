//! Hub settings and calibration loading.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use zonewatch_pipeline::error::MonitorError;
use zonewatch_pipeline::geometry::Quad;

/// Number of lines in the calibration file: the bird's eye quad and the
/// danger zone quad.
const CALIBRATION_LINES: usize = 2;

/// Values per calibration line (four corner points).
const CALIBRATION_VALUES: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub converter: ConverterSettings,
    pub frame: FrameSettings,
    pub buzzer: BuzzerSettings,
    pub calibration_file: String,
    /// Pause between processing cycles, standing in for the camera frame
    /// pacing the video pipeline would impose.
    pub cycle_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterSettings {
    pub command: String,
    pub input_file: String,
    pub output_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuzzerSettings {
    pub enabled: bool,
    pub gpio_pin: u32,
}

pub fn load_settings(path: &str) -> anyhow::Result<Settings> {
    let file = File::open(path).with_context(|| format!("cannot open settings file {path}"))?;
    let settings: Settings =
        serde_yml::from_reader(file).with_context(|| format!("cannot parse {path}"))?;
    Ok(settings)
}

/// Reads the two calibration quads. Any problem here leaves the engine in
/// permanent non-monitoring mode, so the diagnostics distinguish the
/// failure shapes the field has actually produced: missing file, wrong
/// line count, wrong value count, non-numeric values.
pub fn read_calibration(path: &str) -> Result<(Quad, Quad), MonitorError> {
    if !Path::new(path).is_file() {
        return Err(MonitorError::CalibrationMissing);
    }
    let content = std::fs::read_to_string(path).map_err(|err| {
        MonitorError::CalibrationMalformed {
            reason: format!("unreadable: {err}"),
        }
    })?;

    let lines: Vec<&str> = content.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() != CALIBRATION_LINES {
        return Err(MonitorError::CalibrationMalformed {
            reason: format!("expected {CALIBRATION_LINES} lines, found {}", lines.len()),
        });
    }

    let bird_eye = parse_quad(lines[0], 1)?;
    let zone = parse_quad(lines[1], 2)?;
    Ok((bird_eye, zone))
}

fn parse_quad(line: &str, line_number: usize) -> Result<Quad, MonitorError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != CALIBRATION_VALUES {
        return Err(MonitorError::CalibrationMalformed {
            reason: format!(
                "line {line_number} has {} value(s), expected {CALIBRATION_VALUES}",
                fields.len()
            ),
        });
    }

    let mut values = [0i64; CALIBRATION_VALUES];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = field.trim().parse().map_err(|_| {
            MonitorError::CalibrationMalformed {
                reason: format!("line {line_number} has a non-numeric value: {field:?}"),
            }
        })?;
    }
    Ok(Quad(values))
}
