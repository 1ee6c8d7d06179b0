use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A 2D axis-aligned bounding box.
///
/// Used by bounding-box finders (`in_envelope`) and computed client-side
/// from any non-empty [`Geometry`](super::Geometry).
///
/// # Examples
///
/// ```rust,ignore
/// use postgis_adapter::geometry::BoundingBox;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
/// assert!(bbox.contains_point(50.0, 50.0));
/// ```
#[derive(Clone, Copy, PartialEq, Default, Debug, Deserialize, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Hash for BoundingBox {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.min_x.to_bits().hash(state);
        self.min_y.to_bits().hash(state);
        self.max_x.to_bits().hash(state);
        self.max_y.to_bits().hash(state);
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BOX({} {},{} {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl BoundingBox {
    /// Creates a bounding box from two opposite corners in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Smallest box covering every coordinate, or `None` for an empty input.
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for coordinate in iter {
            bbox.expand_to(coordinate.x, coordinate.y);
        }
        Some(bbox)
    }

    /// Grows the box so that it covers `(x, y)`.
    pub fn expand_to(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Returns the union of both boxes.
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center of the box as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Returns `true` if the boxes share at least one point.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// All four corners are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }
}
