//! Geometry in the center/half-extent form the window backend speaks.
//!
//! Every rectangle is a center point plus half extents. Edge accessors are
//! derived; nothing stores a left/top/width/height tuple as authoritative
//! state. The y axis grows downward, so `top = center.y - half_size.y`.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub center: Point,
    pub half_size: Point,
}

impl Rect {
    pub fn new(center: Point, half_size: Point) -> Self { Rect { center, half_size } }

    pub fn from_extent(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            center: Point::new(left + width / 2.0, top + height / 2.0),
            half_size: Point::new(width / 2.0, height / 2.0),
        }
    }

    pub fn left(&self) -> f64 { self.center.x - self.half_size.x }

    pub fn right(&self) -> f64 { self.center.x + self.half_size.x }

    pub fn top(&self) -> f64 { self.center.y - self.half_size.y }

    pub fn bottom(&self) -> f64 { self.center.y + self.half_size.y }

    pub fn width(&self) -> f64 { self.half_size.x * 2.0 }

    pub fn height(&self) -> f64 { self.half_size.y * 2.0 }

    /// Subpixel-insensitive comparison; backend round-trips may quantize.
    pub fn same_as(&self, other: &Rect) -> bool {
        (self.center.x - other.center.x).abs() < EPSILON
            && (self.center.y - other.center.y).abs() < EPSILON
            && (self.half_size.x - other.half_size.x).abs() < EPSILON
            && (self.half_size.y - other.half_size.y).abs() < EPSILON
    }

    /// Splits off a band of height `h` from the top edge. Returns
    /// `(band, remainder)`; the combined footprint equals `self`.
    pub fn split_top(&self, h: f64) -> (Rect, Rect) {
        let band = Rect {
            center: Point::new(self.center.x, self.top() + h / 2.0),
            half_size: Point::new(self.half_size.x, h / 2.0),
        };
        let remainder = Rect {
            center: Point::new(self.center.x, self.center.y + h / 2.0),
            half_size: Point::new(self.half_size.x, self.half_size.y - h / 2.0),
        };
        (band, remainder)
    }

    /// A band of height `h` sitting directly above this rect, same x extent.
    pub fn band_above(&self, h: f64) -> Rect {
        Rect {
            center: Point::new(self.center.x, self.top() - h / 2.0),
            half_size: Point::new(self.half_size.x, h / 2.0),
        }
    }

    /// Grows the rect upward by `h`: height increases by exactly `h`, the
    /// vertical center shifts up by `h / 2`, the bottom edge stays put.
    pub fn grow_top(&self, h: f64) -> Rect {
        Rect {
            center: Point::new(self.center.x, self.center.y - h / 2.0),
            half_size: Point::new(self.half_size.x, self.half_size.y + h / 2.0),
        }
    }
}
