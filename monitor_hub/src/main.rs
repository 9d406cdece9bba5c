//! Zonewatch monitor hub.
//!
//! Connects the danger-zone monitoring engine to the machines around it:
//! the external detection pipeline (over a line feed), the bird's eye
//! converter process, the push gateway, and the buzzer pin.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::Context;
use docopt::Docopt;
use zonewatch_pipeline::engine::MonitorEngine;
use zonewatch_pipeline::traits::PhysicalAlarm;

mod alarm;
mod annotate;
mod config;
mod feed;
mod notify;
mod overview;
mod transform;

use crate::alarm::{DisabledAlarm, GpioAlarm};
use crate::annotate::SceneAnnotator;
use crate::feed::{DetectionFeed, ReplayFeed, StdinFeed};
use crate::notify::HttpNotifier;
use crate::overview::OverviewPublisher;
use crate::transform::FileExchangeTransform;

const USAGE: &str = "
Zonewatch monitor hub: watches a calibrated scene and raises buzzer and mobile push alerts when a person dwells inside the danger zone too long.

Usage:
  zonewatch-monitor-hub [--settings=<path>] [--replay=<file>]
  zonewatch-monitor-hub (--version | -v)
  zonewatch-monitor-hub (--help | -h)

Options:
    --settings=<path>   Settings file [default: zonewatch.yaml]
    --replay=<file>     Drive cycles from a recorded detection file instead of stdin
    --version, -v       Show version
    --help, -h          Show help
";

#[derive(Debug, Clone, Deserialize)]
struct Args {
    flag_settings: String,
    flag_replay: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_NAME").to_string() + ", version: " + env!("CARGO_PKG_VERSION");
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .map(|d| d.help(true))
        .map(|d| d.version(Some(version)))
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let settings = config::load_settings(&args.flag_settings)?;

    let notifier = HttpNotifier::new(&settings.gateway.host, settings.gateway.port)
        .context("push gateway configuration rejected")?;
    let transform = FileExchangeTransform::new(
        &settings.converter.command,
        &settings.converter.input_file,
        &settings.converter.output_file,
    );
    let buzzer: Box<dyn PhysicalAlarm> = if settings.buzzer.enabled {
        Box::new(GpioAlarm::new(settings.buzzer.gpio_pin)?)
    } else {
        Box::new(DisabledAlarm::new())
    };
    let annotator = SceneAnnotator::new(settings.frame.width, settings.frame.height);

    let mut engine = MonitorEngine::new(
        Box::new(transform),
        Box::new(notifier.clone()),
        buzzer,
        Box::new(annotator),
    );

    // Calibration is read once. Any failure leaves the engine tracking
    // without monitoring for the rest of the process.
    match config::read_calibration(&settings.calibration_file) {
        Ok((bird_eye, zone)) => {
            if let Err(err) = engine.initialize_zone(bird_eye, zone) {
                error!("danger zone projection failed, monitoring disabled: {err}");
            } else {
                info!("calibration loaded, monitoring enabled");
            }
        }
        Err(err) => error!("calibration unavailable, monitoring disabled: {err}"),
    }

    let overview = engine.zone_corners().map(OverviewPublisher::new);

    let mut feed: Box<dyn DetectionFeed> = match &args.flag_replay {
        Some(path) => {
            info!("replaying detections from {path}");
            Box::new(ReplayFeed::open(path)?)
        }
        None => Box::new(StdinFeed::new()),
    };

    info!("zonewatch monitor hub started");
    while let Some(detections) = feed.next_cycle() {
        let report = engine.process_cycle(&detections, Instant::now());
        if let Some(overview) = &overview {
            overview.publish(&report.overlay, &notifier);
        }
        sleep(Duration::from_millis(settings.cycle_ms));
    }

    info!("detection feed ended, shutting down");
    Ok(())
}
