//! Buzzer adapters.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use zonewatch_pipeline::traits::PhysicalAlarm;

/// Buzzer on a sysfs GPIO pin. The last written level is remembered so
/// repeated activate/deactivate calls do not touch the pin again.
pub struct GpioAlarm {
    value_path: PathBuf,
    active: bool,
}

impl GpioAlarm {
    pub fn new(pin: u32) -> anyhow::Result<Self> {
        let gpio_dir = PathBuf::from(format!("/sys/class/gpio/gpio{pin}"));
        if !gpio_dir.is_dir() {
            fs::write("/sys/class/gpio/export", pin.to_string())
                .with_context(|| format!("cannot export gpio pin {pin}"))?;
        }
        fs::write(gpio_dir.join("direction"), "out")
            .with_context(|| format!("cannot configure gpio pin {pin} as output"))?;

        let alarm = Self {
            value_path: gpio_dir.join("value"),
            active: false,
        };
        alarm.write_level("0");
        Ok(alarm)
    }

    fn write_level(&self, level: &str) {
        if let Err(err) = fs::write(&self.value_path, level) {
            warn!("cannot drive buzzer pin {}: {err}", self.value_path.display());
        }
    }
}

impl PhysicalAlarm for GpioAlarm {
    fn activate(&mut self) {
        if !self.active {
            self.write_level("1");
            self.active = true;
        }
    }

    fn deactivate(&mut self) {
        if self.active {
            self.write_level("0");
            self.active = false;
        }
    }
}

/// Stand-in used off-device: transitions are logged, nothing is driven.
#[derive(Default)]
pub struct DisabledAlarm {
    active: bool,
}

impl DisabledAlarm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicalAlarm for DisabledAlarm {
    fn activate(&mut self) {
        if !self.active {
            info!("alarm on (buzzer disabled)");
            self.active = true;
        }
    }

    fn deactivate(&mut self) {
        if self.active {
            info!("alarm off (buzzer disabled)");
            self.active = false;
        }
    }
}
