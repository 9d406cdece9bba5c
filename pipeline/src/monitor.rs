//! Danger-zone occupancy and dwell-time monitoring.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, info};

use crate::geometry::{Point, Quad};

/// Side length of the zone-local plane the converter projects occupancy
/// checks onto.
pub const ZONE_RANGE: i64 = 50;

/// Continuous dwell inside the zone before an alert fires.
pub const DWELL_LIMIT: Duration = Duration::from_secs(5);

/// Corner points of the zone-local plane, in converter exchange order.
pub const ZONE_PLANE: Quad = Quad([
    0, 0, ZONE_RANGE, 0, ZONE_RANGE, ZONE_RANGE, 0, ZONE_RANGE,
]);

/// Format of the human-readable trigger stamp carried in the data
/// notification.
const TRIGGER_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Strict interior test in zone-local coordinates. The converter maps the
/// danger quad onto the `ZONE_RANGE` square, so landing exactly on an edge
/// counts as outside.
fn outside_zone(point: Point) -> bool {
    point.x <= 0 || point.x >= ZONE_RANGE || point.y <= 0 || point.y >= ZONE_RANGE
}

/// Occupancy record for one object currently inside the danger zone. A
/// record exists for an id iff its last-evaluated projection was inside
/// the zone and no exit has been seen since; the entry instant is kept
/// unchanged for the whole episode, including after the alert fires.
#[derive(Clone, Debug)]
pub struct ZoneRecord {
    pub object_id: u64,
    pub entered_at: Instant,
    pub alerted: bool,
    pub triggered_at: String,
    /// Delivery marker consumed by `drain_triggered`; independent of the
    /// latched `alerted` flag used for buzzer and overview state.
    pending: bool,
}

/// One alert episode handed to the dispatcher: the object, when it
/// entered, and the wall-clock stamp taken at the moment the dwell limit
/// was crossed.
#[derive(Clone, Debug)]
pub struct AlertEpisode {
    pub object_id: u64,
    pub entered_at: Instant,
    pub triggered_at: String,
}

/// Converts a stream of projected foot points into timed alerts. Entry
/// starts the dwell clock, exit removes the record immediately (no
/// carry-over credit on re-entry), and crossing the dwell limit latches
/// the alert exactly once per episode.
#[derive(Default)]
pub struct ZoneMonitor {
    records: Vec<ZoneRecord>,
}

impl ZoneMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one evaluation pass. Each sample pairs an id with its
    /// zone-local projection for this cycle; the pairing is done upstream
    /// so a short transform result can never be indexed against the wrong
    /// id here.
    pub fn evaluate(&mut self, samples: &[(u64, Point)], now: Instant) {
        for &(id, point) in samples {
            let outside = outside_zone(point);
            match self.position(id) {
                Some(index) => {
                    if outside {
                        debug!("object {id} left the danger zone");
                        self.records.remove(index);
                    } else {
                        self.check_dwell(index, now);
                    }
                }
                None => {
                    if !outside {
                        debug!("object {id} entered the danger zone");
                        self.records.push(ZoneRecord {
                            object_id: id,
                            entered_at: now,
                            alerted: false,
                            triggered_at: String::new(),
                            pending: false,
                        });
                    }
                }
            }
        }
    }

    fn check_dwell(&mut self, index: usize, now: Instant) {
        let record = &mut self.records[index];
        if record.alerted {
            return;
        }
        if now.saturating_duration_since(record.entered_at) >= DWELL_LIMIT {
            record.alerted = true;
            record.pending = true;
            record.triggered_at = Local::now().format(TRIGGER_STAMP_FORMAT).to_string();
            info!(
                "dwell limit exceeded for object {} at {}",
                record.object_id, record.triggered_at
            );
        }
    }

    /// Edge-triggered drain: when at least one record crossed the dwell
    /// limit since the previous call, returns every currently-alerted
    /// record and clears the delivery markers; otherwise returns nothing,
    /// even though the latched flags remain set.
    pub fn drain_triggered(&mut self) -> Vec<AlertEpisode> {
        if !self.records.iter().any(|record| record.pending) {
            return Vec::new();
        }
        for record in &mut self.records {
            record.pending = false;
        }
        self.records
            .iter()
            .filter(|record| record.alerted)
            .map(|record| AlertEpisode {
                object_id: record.object_id,
                entered_at: record.entered_at,
                triggered_at: record.triggered_at.clone(),
            })
            .collect()
    }

    /// True iff some current record is alerted; the caller silences the
    /// physical alarm when this turns false.
    pub fn any_alert(&self) -> bool {
        self.records.iter().any(|record| record.alerted)
    }

    /// False when the id has no record, else the record's latched flag.
    pub fn alert_for(&self, id: u64) -> bool {
        self.position(id)
            .map(|index| self.records[index].alerted)
            .unwrap_or(false)
    }

    pub fn occupancy(&self) -> usize {
        self.records.len()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.object_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSIDE: Point = Point { x: 25, y: 25 };
    const OUTSIDE: Point = Point { x: 80, y: 25 };

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn boundary_points_count_as_outside() {
        assert!(outside_zone(Point::new(0, 25)));
        assert!(outside_zone(Point::new(50, 25)));
        assert!(outside_zone(Point::new(25, 0)));
        assert!(outside_zone(Point::new(25, 50)));
        assert!(!outside_zone(Point::new(1, 1)));
        assert!(!outside_zone(Point::new(49, 49)));
    }

    #[test]
    fn alert_fires_at_exactly_the_dwell_limit() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(5, INSIDE)], base);
        monitor.evaluate(&[(5, INSIDE)], at(base, 4_999));
        assert!(!monitor.alert_for(5));
        assert!(monitor.drain_triggered().is_empty());

        monitor.evaluate(&[(5, INSIDE)], at(base, 5_000));
        assert!(monitor.alert_for(5));
        let episodes = monitor.drain_triggered();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].object_id, 5);
        assert!(!episodes[0].triggered_at.is_empty());
    }

    #[test]
    fn drain_returns_an_episode_exactly_once() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(5, INSIDE)], base);
        monitor.evaluate(&[(5, INSIDE)], at(base, 6_000));
        assert_eq!(monitor.drain_triggered().len(), 1);
        // Still alerted, but nothing new has triggered.
        assert!(monitor.alert_for(5));
        assert!(monitor.drain_triggered().is_empty());
    }

    #[test]
    fn exit_resets_dwell_credit() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(5, INSIDE)], base);
        monitor.evaluate(&[(5, OUTSIDE)], at(base, 4_000));
        assert_eq!(monitor.occupancy(), 0);

        // Re-entry starts a fresh episode: 4 prior seconds earn nothing.
        monitor.evaluate(&[(5, INSIDE)], at(base, 4_100));
        monitor.evaluate(&[(5, INSIDE)], at(base, 8_000));
        assert!(!monitor.alert_for(5));
        monitor.evaluate(&[(5, INSIDE)], at(base, 9_100));
        assert!(monitor.alert_for(5));
    }

    #[test]
    fn exit_clears_a_latched_alert() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(5, INSIDE)], base);
        monitor.evaluate(&[(5, INSIDE)], at(base, 5_000));
        assert!(monitor.any_alert());

        monitor.evaluate(&[(5, OUTSIDE)], at(base, 5_500));
        assert!(!monitor.any_alert());
        assert!(!monitor.alert_for(5));
    }

    #[test]
    fn entry_instant_is_preserved_after_the_trigger() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(5, INSIDE)], base);
        monitor.evaluate(&[(5, INSIDE)], at(base, 7_300));
        let episodes = monitor.drain_triggered();
        assert_eq!(episodes[0].entered_at, base);
    }

    #[test]
    fn a_later_trigger_redelivers_earlier_alerted_records() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(1, INSIDE)], base);
        monitor.evaluate(&[(1, INSIDE), (2, INSIDE)], at(base, 5_000));
        assert_eq!(monitor.drain_triggered().len(), 1);

        // Object 2 crosses the limit later; the drain carries both
        // alerted records so the caller can pick the most recent.
        monitor.evaluate(&[(1, INSIDE), (2, INSIDE)], at(base, 10_000));
        let episodes = monitor.drain_triggered();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[1].object_id, 2);
    }

    #[test]
    fn untracked_outside_points_are_ignored() {
        let base = Instant::now();
        let mut monitor = ZoneMonitor::new();
        monitor.evaluate(&[(9, OUTSIDE)], base);
        assert_eq!(monitor.occupancy(), 0);
        assert!(!monitor.alert_for(9));
    }
}
