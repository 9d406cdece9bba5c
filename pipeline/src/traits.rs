//! Collaborator ports the monitoring engine depends on.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::TransportError;
use crate::geometry::{BoundingBox, Point, Quad};

/// Homography helper mapping points from one plane onto a target
/// rectangle. The helper signals failure by returning fewer points than it
/// was given, never by panicking; callers must defend against short
/// results before pairing the output back up with ids.
pub trait PlaneTransform {
    fn transform(&self, target: &Quad, calibration: &Quad, points: &[Point]) -> Vec<Point>;
}

/// Outbound channel to the mobile host.
pub trait NotificationTransport {
    fn send(&self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;
}

/// On-device buzzer. Both operations are idempotent: activating an active
/// alarm or deactivating an inactive one is a no-op.
pub trait PhysicalAlarm {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// Produces the encoded snapshot image attached to an alert, with the
/// given bounding boxes and foot points drawn on the current scene.
pub trait FrameAnnotator {
    fn render(&self, entries: &[(BoundingBox, Point)]) -> Vec<u8>;
}
