//!
//! # Rectangular Bounding Boxes and Associated Trait
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::geom::{Coord, Point};

/// # Rectangular Bounding Box
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Create a new [BoundBox] from two [Point]s.
    /// Callers are responsible for ensuring that p0.x <= p1.x, and p0.y <= p1.y.
    fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
    /// Create a new [BoundBox] from a single [Point].
    /// The resultant [BoundBox] comprises solely the point, having zero area.
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Create a new [BoundBox] from two points, normalizing corner order
    pub fn from_points(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
    /// Create an empty, otherwise invalid [BoundBox]
    pub fn empty() -> Self {
        Self {
            p0: Point::new(Coord::MAX, Coord::MAX),
            p1: Point::new(Coord::MIN, Coord::MIN),
        }
    }
    /// Boolean indication of whether a box is empty
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Boolean indication of whether [Point] `pt` lies inside our box.
    pub fn contains(&self, pt: &Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// Boolean indication of whether we overlap `other`, boundaries inclusive
    pub fn overlaps(&self, other: &BoundBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.p0.x <= other.p1.x
            && other.p0.x <= self.p1.x
            && self.p0.y <= other.p1.y
            && other.p0.y <= self.p1.y
    }
    /// Expand an existing [BoundBox] in all directions by `delta`
    pub fn expand(&mut self, delta: Coord) {
        self.p0.x -= delta;
        self.p0.y -= delta;
        self.p1.x += delta;
        self.p1.y += delta;
    }
    /// Get the box's size as an (x,y) tuple
    pub fn size(&self) -> (Coord, Coord) {
        (self.p1.x - self.p0.x, self.p1.y - self.p0.y)
    }
    /// Center-point
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2.0, (self.p0.y + self.p1.y) / 2.0)
    }
    /// Enclosed area. Zero for empty boxes.
    pub fn area(&self) -> Coord {
        if self.is_empty() {
            return 0.0;
        }
        let (w, h) = self.size();
        w * h
    }
    /// Create the union with [Point] `pt`
    pub fn union_point(&self, pt: &Point) -> BoundBox {
        BoundBox::new(
            Point::new(self.p0.x.min(pt.x), self.p0.y.min(pt.y)),
            Point::new(self.p1.x.max(pt.x), self.p1.y.max(pt.y)),
        )
    }
}

///
/// # Bounding Box Trait
///
/// Methods for interacting with [BoundBox]s.
/// Enables geometric accumulation such as union and intersection
/// over heterogeneous entities.
///
pub trait BoundBoxTrait {
    /// Compute the intersection with rectangular bounding box `bbox`.
    /// Creates and returns a new [BoundBox].
    fn intersection(&self, bbox: &BoundBox) -> BoundBox;
    /// Compute the union with rectangular bounding box `bbox`.
    /// Creates and returns a new [BoundBox].
    fn union(&self, bbox: &BoundBox) -> BoundBox;
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> BoundBox;
}

impl BoundBoxTrait for BoundBox {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        let pmin = Point::new(self.p0.x.max(bbox.p0.x), self.p0.y.max(bbox.p0.y));
        let pmax = Point::new(self.p1.x.min(bbox.p1.x), self.p1.y.min(bbox.p1.y));
        if pmin.x > pmax.x || pmin.y > pmax.y {
            return BoundBox::empty();
        }
        BoundBox::new(pmin, pmax)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::new(
            Point::new(self.p0.x.min(bbox.p0.x), self.p0.y.min(bbox.p0.y)),
            Point::new(self.p1.x.max(bbox.p1.x), self.p1.y.max(bbox.p1.y)),
        )
    }
    fn bbox(&self) -> BoundBox {
        *self
    }
}

impl BoundBoxTrait for Point {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        if !bbox.contains(self) {
            return BoundBox::empty();
        }
        BoundBox::from_point(*self)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        bbox.union_point(self)
    }
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_union() {
        let mut bbox = BoundBox::empty();
        assert!(bbox.is_empty());
        bbox = bbox.union_point(&Point::new(1.0, 2.0));
        bbox = bbox.union_point(&Point::new(-1.0, 0.0));
        assert!(!bbox.is_empty());
        assert_eq!(bbox.size(), (2.0, 2.0));
        assert_eq!(bbox.center(), Point::new(0.0, 1.0));
        assert!((bbox.area() - 4.0).abs() < 1e-12);
    }
    #[test]
    fn intersection() {
        let a = BoundBox::from_points(Point::new(0.0, 0.0), Point::new(4.0, 4.0));
        let b = BoundBox::from_points(Point::new(2.0, 2.0), Point::new(6.0, 6.0));
        let i = a.intersection(&b);
        assert_eq!(i, BoundBox::from_points(Point::new(2.0, 2.0), Point::new(4.0, 4.0)));
        let c = BoundBox::from_points(Point::new(5.0, 5.0), Point::new(6.0, 6.0));
        assert!(a.intersection(&c).is_empty());
    }
}
