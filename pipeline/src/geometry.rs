//! Image-plane and projected-plane value types shared across the engine.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Axis-aligned detection box in image-plane pixels, as delivered by the
/// upstream video pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Reference point used for all zone geometry: horizontal midpoint of
    /// the box, vertical bottom edge. This is where the person stands, not
    /// the box center, and the projection onto the top-down plane depends
    /// on exactly this formula.
    pub fn foot_point(&self) -> Point {
        let half_width = (self.width / 2.0 + 0.5).floor();
        Point {
            x: (self.left + half_width) as i64,
            y: (self.top + self.height) as i64,
        }
    }
}

/// Integer coordinates in whichever plane the context dictates (image
/// pixels, bird's-eye plane, or the zone-local plane). The converter
/// exchanges whole-number coordinates only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Four corner points flattened as x1,y1,...,x4,y4 — the exchange format
/// shared by the calibration file and the bird's eye converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad(pub [i64; 8]);

impl Quad {
    pub fn corners(&self) -> [Point; 4] {
        let v = &self.0;
        [
            Point::new(v[0], v[1]),
            Point::new(v[2], v[3]),
            Point::new(v[4], v[5]),
            Point::new(v[6], v[7]),
        ]
    }

    pub fn from_corners(corners: &[Point]) -> Option<Self> {
        if corners.len() != 4 {
            return None;
        }
        let mut v = [0i64; 8];
        for (i, p) in corners.iter().enumerate() {
            v[2 * i] = p.x;
            v[2 * i + 1] = p.y;
        }
        Some(Quad(v))
    }

    /// Flattened values in exchange order.
    pub fn values(&self) -> &[i64; 8] {
        &self.0
    }
}
