//! Detection feeds.
//!
//! The GPU video pipeline is a separate process; it hands the hub one line
//! of JSON per frame, an array of person detections. `StdinFeed` consumes
//! that stream live, `ReplayFeed` plays a recorded file back for
//! development and tests.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};

use anyhow::Context;
use log::warn;
use zonewatch_pipeline::engine::Detection;

/// Per-cycle detection source. `None` ends the run.
pub trait DetectionFeed {
    fn next_cycle(&mut self) -> Option<Vec<Detection>>;
}

fn parse_cycle(line: &str) -> Vec<Detection> {
    if line.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(line) {
        Ok(detections) => detections,
        Err(err) => {
            warn!("ignoring malformed detection line: {err}");
            Vec::new()
        }
    }
}

pub struct ReplayFeed {
    lines: Lines<BufReader<File>>,
}

impl ReplayFeed {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open replay file {path}"))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

impl DetectionFeed for ReplayFeed {
    fn next_cycle(&mut self) -> Option<Vec<Detection>> {
        match self.lines.next()? {
            Ok(line) => Some(parse_cycle(&line)),
            Err(err) => {
                warn!("replay file read error, ending feed: {err}");
                None
            }
        }
    }
}

#[derive(Default)]
pub struct StdinFeed;

impl StdinFeed {
    pub fn new() -> Self {
        Self
    }
}

impl DetectionFeed for StdinFeed {
    fn next_cycle(&mut self) -> Option<Vec<Detection>> {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(parse_cycle(&line)),
            Err(err) => {
                warn!("stdin read error, ending feed: {err}");
                None
            }
        }
    }
}
