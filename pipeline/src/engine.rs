//! Per-cycle monitoring engine.
//!
//! Owns the tracker, the zone monitor, and the alert queue, and arbitrates
//! the buzzer and notification side effects once per frame. Collaborators
//! are injected through the ports in `traits`; the engine never touches a
//! camera, a socket, or a GPIO pin itself.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Instant;

use log::{debug, warn};

use crate::dispatch::AlertDispatcher;
use crate::error::MonitorError;
use crate::geometry::{BoundingBox, Point, Quad};
use crate::monitor::{ZoneMonitor, ZONE_PLANE};
use crate::tracker::ObjectTracker;
use crate::traits::{FrameAnnotator, NotificationTransport, PhysicalAlarm, PlaneTransform};

/// Bird's eye view plane corners, the display target every camera-plane
/// point is projected onto.
pub const BIRD_EYE_VIEW: Quad = Quad([0, 0, 200, 0, 200, 300, 0, 300]);

/// One person detection handed over by the external video pipeline for the
/// current frame.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub id: u64,
    pub bbox: BoundingBox,
}

/// What one processing cycle produced, for the overview publisher and for
/// tests.
#[derive(Default)]
pub struct CycleReport {
    /// Bird's-eye projections of this cycle's fresh foot points together
    /// with the per-id alert state.
    pub overlay: Vec<(Point, bool)>,
    /// False when calibration is absent or a transform came back short.
    pub zone_evaluated: bool,
    /// Alert episodes that crossed the dwell limit this cycle.
    pub triggered: usize,
}

pub struct MonitorEngine {
    tracker: ObjectTracker,
    monitor: ZoneMonitor,
    dispatcher: AlertDispatcher,
    transform: Box<dyn PlaneTransform>,
    transport: Box<dyn NotificationTransport>,
    alarm: Box<dyn PhysicalAlarm>,
    annotator: Box<dyn FrameAnnotator>,
    /// Bird's-eye calibration and the zone quad projected through it, set
    /// once by `initialize_zone`. `None` means permanent non-monitoring
    /// mode: the tracker still runs, zone evaluation does not.
    calibration: Option<Calibration>,
}

struct Calibration {
    bird_eye: Quad,
    /// Danger-zone corners after the one-time projection onto the display
    /// plane; never changes for the life of the process.
    zone: Quad,
}

impl MonitorEngine {
    pub fn new(
        transform: Box<dyn PlaneTransform>,
        transport: Box<dyn NotificationTransport>,
        alarm: Box<dyn PhysicalAlarm>,
        annotator: Box<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            tracker: ObjectTracker::new(),
            monitor: ZoneMonitor::new(),
            dispatcher: AlertDispatcher::new(),
            transform,
            transport,
            alarm,
            annotator,
            calibration: None,
        }
    }

    /// Projects the danger-zone quad onto the display plane, once. Without
    /// a successful call the engine stays in non-monitoring mode for the
    /// rest of the process; there is no mid-run recalibration.
    pub fn initialize_zone(&mut self, bird_eye: Quad, zone: Quad) -> Result<(), MonitorError> {
        let corners = zone.corners();
        let projected = self
            .transform
            .transform(&BIRD_EYE_VIEW, &bird_eye, &corners);
        let Some(zone) = Quad::from_corners(&projected) else {
            return Err(MonitorError::TransformMisaligned {
                expected: corners.len(),
                actual: projected.len(),
            });
        };
        debug!("danger zone projected to {:?}", zone.values());
        self.calibration = Some(Calibration { bird_eye, zone });
        Ok(())
    }

    /// The danger-zone corners on the display plane, when calibrated.
    pub fn zone_corners(&self) -> Option<&Quad> {
        self.calibration.as_ref().map(|c| &c.zone)
    }

    pub fn any_alert(&self) -> bool {
        self.monitor.any_alert()
    }

    pub fn alert_for(&self, id: u64) -> bool {
        self.monitor.alert_for(id)
    }

    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }

    /// Runs one frame worth of work: refresh the tracker, project the
    /// fresh foot points, evaluate zone occupancy, and fire the buzzer and
    /// notification side effects for any episode that crossed the dwell
    /// limit. `now` is the frame arrival instant supplied by the caller.
    ///
    /// Errors never leave this function; a misaligned transform skips the
    /// cycle's zone evaluation (no partial update) and the tracker is
    /// maintained regardless.
    pub fn process_cycle(&mut self, detections: &[Detection], now: Instant) -> CycleReport {
        for detection in detections {
            self.tracker.observe(detection.id, detection.bbox);
        }

        let mut report = CycleReport::default();
        if let Some(calibration) = &self.calibration {
            let fresh = self.tracker.fresh();
            let points: Vec<Point> = fresh.iter().map(|&(_, point)| point).collect();

            let bird_eye =
                self.transform
                    .transform(&BIRD_EYE_VIEW, &calibration.bird_eye, &points);
            if bird_eye.len() != points.len() {
                let err = MonitorError::TransformMisaligned {
                    expected: points.len(),
                    actual: bird_eye.len(),
                };
                warn!("skipping zone evaluation this cycle: {err}");
            } else {
                let local = self
                    .transform
                    .transform(&ZONE_PLANE, &calibration.zone, &bird_eye);
                if local.len() != bird_eye.len() {
                    let err = MonitorError::TransformMisaligned {
                        expected: bird_eye.len(),
                        actual: local.len(),
                    };
                    warn!("skipping zone evaluation this cycle: {err}");
                } else {
                    let samples: Vec<(u64, Point)> = fresh
                        .iter()
                        .map(|&(id, _)| id)
                        .zip(local)
                        .collect();
                    self.monitor.evaluate(&samples, now);
                    report.zone_evaluated = true;
                }

                report.overlay = fresh
                    .iter()
                    .map(|&(id, _)| id)
                    .zip(bird_eye)
                    .map(|(id, point)| (point, self.monitor.alert_for(id)))
                    .collect();
            }
        }

        let episodes = self.monitor.drain_triggered();
        report.triggered = episodes.len();
        if let Some(latest) = episodes.last() {
            let entries: Vec<(BoundingBox, Point)> = episodes
                .iter()
                .filter_map(|episode| self.tracker.get(episode.object_id))
                .collect();
            if !entries.is_empty() {
                let image = self.annotator.render(&entries);
                self.dispatcher.enqueue(latest, image);
                self.alarm.activate();
            }
        }

        self.dispatcher.flush(self.transport.as_ref());

        if !self.monitor.any_alert() {
            self.alarm.deactivate();
        }

        self.tracker.maintain();
        report
    }
}
