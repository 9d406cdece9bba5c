//! Alert snapshot rendering.
//!
//! Draws the alerting bounding boxes and foot points and encodes the
//! result as the JPEG payload attached to a push notification. The camera
//! frame itself belongs to the video pipeline; when the hub runs without
//! one (replay or piped detections) the boxes are drawn on a blank canvas
//! of the configured frame size.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::warn;
use zonewatch_pipeline::geometry::{BoundingBox, Point};
use zonewatch_pipeline::traits::FrameAnnotator;

/// Alert overlay color.
const ALERT_COLOR: Rgb<u8> = Rgb([255, 10, 0]);

/// Foot point marker radius in pixels.
const MARKER_RADIUS: i32 = 7;

pub struct SceneAnnotator {
    width: u32,
    height: u32,
}

impl SceneAnnotator {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameAnnotator for SceneAnnotator {
    fn render(&self, entries: &[(BoundingBox, Point)]) -> Vec<u8> {
        let mut canvas = RgbImage::new(self.width, self.height);

        for (bbox, centroid) in entries {
            let width = (bbox.width as i64).max(1) as u32;
            let height = (bbox.height as i64).max(1) as u32;
            let rect = Rect::at(bbox.left as i32, bbox.top as i32).of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, rect, ALERT_COLOR);
            draw_filled_circle_mut(
                &mut canvas,
                (centroid.x as i32, centroid.y as i32),
                MARKER_RADIUS,
                ALERT_COLOR,
            );
        }

        let mut bytes = Vec::new();
        if let Err(err) = canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg) {
            warn!("cannot encode alert snapshot: {err}");
            return Vec::new();
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_a_jpeg() {
        let annotator = SceneAnnotator::new(320, 240);
        let bbox = BoundingBox {
            left: 40.0,
            top: 30.0,
            width: 60.0,
            height: 120.0,
        };
        let bytes = annotator.render(&[(bbox, Point::new(70, 150))]);
        // JPEG start-of-image marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
