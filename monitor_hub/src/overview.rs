//! Bird's eye overview publisher.
//!
//! Keeps the mobile host's top-down view current: a cached grid template
//! with the danger-zone outline, overlaid each cycle with the projected
//! foot points colored by alert state, JPEG-encoded and published on the
//! overview topic.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use log::warn;
use zonewatch_pipeline::dispatch::TOPIC_OVERVIEW;
use zonewatch_pipeline::engine::BIRD_EYE_VIEW;
use zonewatch_pipeline::geometry::{Point, Quad};
use zonewatch_pipeline::traits::NotificationTransport;

/// Grid cells per axis.
const GRID_DIVISIONS: i64 = 20;

const GRID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const ZONE_COLOR: Rgb<u8> = Rgb([255, 10, 0]);
const NORMAL_POINT_COLOR: Rgb<u8> = Rgb([0, 100, 180]);
const ALERT_POINT_COLOR: Rgb<u8> = Rgb([255, 10, 0]);

/// Foot point marker radius in pixels.
const MARKER_RADIUS: i32 = 7;

pub struct OverviewPublisher {
    template: RgbImage,
}

impl OverviewPublisher {
    /// Renders the grid template once; the zone outline never changes for
    /// the life of the process.
    pub fn new(zone: &Quad) -> Self {
        let view = BIRD_EYE_VIEW.values();
        let (width, height) = (view[2], view[7]);
        let mut template = RgbImage::new(width as u32, height as u32);

        let cell_x = width / GRID_DIVISIONS;
        let cell_y = height / GRID_DIVISIONS;
        let mut x = cell_x;
        while x < width {
            draw_line_segment_mut(
                &mut template,
                (x as f32, 0.0),
                (x as f32, height as f32),
                GRID_COLOR,
            );
            x += cell_x;
        }
        let mut y = cell_y;
        while y < height {
            draw_line_segment_mut(
                &mut template,
                (0.0, y as f32),
                (width as f32, y as f32),
                GRID_COLOR,
            );
            y += cell_y;
        }

        let corners = zone.corners();
        for i in 0..corners.len() {
            let from = corners[i];
            let to = corners[(i + 1) % corners.len()];
            draw_line_segment_mut(
                &mut template,
                (from.x as f32, from.y as f32),
                (to.x as f32, to.y as f32),
                ZONE_COLOR,
            );
        }

        Self { template }
    }

    /// One overview frame: the cached template plus this cycle's foot
    /// points, alerted ids in the alert color.
    pub fn render(&self, overlay: &[(Point, bool)]) -> Vec<u8> {
        let mut frame = self.template.clone();
        for &(point, alerted) in overlay {
            let color = if alerted {
                ALERT_POINT_COLOR
            } else {
                NORMAL_POINT_COLOR
            };
            draw_filled_circle_mut(
                &mut frame,
                (point.x as i32, point.y as i32),
                MARKER_RADIUS,
                color,
            );
        }

        let mut bytes = Vec::new();
        if let Err(err) = frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg) {
            warn!("cannot encode overview image: {err}");
            return Vec::new();
        }
        bytes
    }

    pub fn publish(&self, overlay: &[(Point, bool)], transport: &dyn NotificationTransport) {
        let image = self.render(overlay);
        if image.is_empty() {
            return;
        }
        if let Err(err) = transport.send(TOPIC_OVERVIEW, &image) {
            warn!("overview update failed: {err}");
        }
    }
}
