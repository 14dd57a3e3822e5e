//!
//! # Geometry Module
//!
//! Defines the core geometric types including [Point], [Rect], [Polygon], [Path],
//! the [Geometry] sum type, and the cardinal-orientation [Transform],
//! along with their core operations: bounding boxes, segment distance and
//! intersection, point containment, and area.
//!
//! All coordinates are real-valued design units, micrometers by convention.
//!

// Crates.io
use derive_more::{Add, Sub};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::BoundBox;
use crate::error::{LayoutError, LayoutResult};

/// # Coordinate Type-Alias
///
/// Real-valued coordinate in design units (micrometers by convention).
pub type Coord = f64;

/// Tolerance for all zero-distance and collinearity comparisons
pub const EPS: Coord = 1e-9;

/// # Point in two-dimensional layout-space
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd, Add, Sub)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
    /// Create a new point shifted by `x` in the x-dimension and by `y` in the y-dimension
    pub fn shift(&self, p: &Point) -> Point {
        Point {
            x: p.x + self.x,
            y: p.y + self.y,
        }
    }
    /// Get the coordinate associated with direction `dir`
    pub fn coord(&self, dir: Dir) -> Coord {
        match dir {
            Dir::Horiz => self.x,
            Dir::Vert => self.y,
        }
    }
    /// Euclidean distance to `other`
    pub fn dist(&self, other: &Point) -> Coord {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
    /// Manhattan (L1) distance to `other`
    pub fn manhattan_dist(&self, other: &Point) -> Coord {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// # Two-Dimensional Size
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub w: Coord,
    pub h: Coord,
}
impl Size {
    pub fn new(w: Coord, h: Coord) -> Self {
        Self { w, h }
    }
    pub fn area(&self) -> Coord {
        self.w * self.h
    }
}

/// Direction Enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dir {
    Horiz,
    Vert,
}
impl Dir {
    /// Whichever direction we are, return the other one.
    pub fn other(self) -> Self {
        match self {
            Self::Horiz => Self::Vert,
            Self::Vert => Self::Horiz,
        }
    }
}
impl std::ops::Not for Dir {
    type Output = Self;
    /// Exclamation Operator returns the opposite direction
    fn not(self) -> Self::Output {
        self.other()
    }
}

/// # Line Segment
///
/// Directed segment between two [Point]s, the unit of decomposition
/// for all shape-to-shape distance queries.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}
impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }
    /// Segment length
    pub fn length(&self) -> Coord {
        self.a.dist(&self.b)
    }
    /// Distance from [Point] `p` to this segment,
    /// via scalar projection clamped to [0,1].
    pub fn dist_to_point(&self, p: &Point) -> Coord {
        let d = self.b - self.a;
        let len2 = d.x * d.x + d.y * d.y;
        if len2 < EPS {
            // Degenerate (zero-length) segment
            return self.a.dist(p);
        }
        let t = ((p.x - self.a.x) * d.x + (p.y - self.a.y) * d.y) / len2;
        let t = t.clamp(0.0, 1.0);
        let proj = Point::new(self.a.x + t * d.x, self.a.y + t * d.y);
        proj.dist(p)
    }
    /// Boolean indication of whether we intersect segment `other`.
    /// Uses the cross-product orientation test, with collinear-overlap handling.
    pub fn intersects(&self, other: &Segment) -> bool {
        let o1 = orient(&self.a, &self.b, &other.a);
        let o2 = orient(&self.a, &self.b, &other.b);
        let o3 = orient(&other.a, &other.b, &self.a);
        let o4 = orient(&other.a, &other.b, &self.b);

        // General case: strictly opposite orientations on both sides
        if ((o1 > EPS && o2 < -EPS) || (o1 < -EPS && o2 > EPS))
            && ((o3 > EPS && o4 < -EPS) || (o3 < -EPS && o4 > EPS))
        {
            return true;
        }
        // Collinear cases: an endpoint lying on the other segment
        (o1.abs() <= EPS && on_segment(&self.a, &self.b, &other.a))
            || (o2.abs() <= EPS && on_segment(&self.a, &self.b, &other.b))
            || (o3.abs() <= EPS && on_segment(&other.a, &other.b, &self.a))
            || (o4.abs() <= EPS && on_segment(&other.a, &other.b, &self.b))
    }
    /// Distance to segment `other`: zero if they intersect,
    /// else the minimum of the four point-to-segment distances.
    pub fn dist_to_segment(&self, other: &Segment) -> Coord {
        if self.intersects(other) {
            return 0.0;
        }
        self.dist_to_point(&other.a)
            .min(self.dist_to_point(&other.b))
            .min(other.dist_to_point(&self.a))
            .min(other.dist_to_point(&self.b))
    }
}
/// Signed cross-product orientation of the triple (a, b, c).
/// Positive for counter-clockwise, negative for clockwise, ~zero for collinear.
fn orient(a: &Point, b: &Point, c: &Point) -> Coord {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
/// Whether collinear point `p` lies within the bounding span of segment (a, b)
fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}

/// # Rectangle
///
/// Axis-aligned rectangle, specified by an origin corner and a [Size].
/// Sizes are kept non-negative; use [Rect::from_corners] to normalize.
///
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}
impl Rect {
    /// Create a new [Rect] from an origin corner and size
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }
    /// Create a normalized [Rect] from two opposite corners
    pub fn from_corners(p0: Point, p1: Point) -> Self {
        let min = Point::new(p0.x.min(p1.x), p0.y.min(p1.y));
        let max = Point::new(p0.x.max(p1.x), p0.y.max(p1.y));
        Self {
            origin: min,
            size: Size::new(max.x - min.x, max.y - min.y),
        }
    }
    /// Minimum (lower-left) corner
    pub fn min(&self) -> Point {
        self.origin
    }
    /// Maximum (upper-right) corner
    pub fn max(&self) -> Point {
        Point::new(self.origin.x + self.size.w, self.origin.y + self.size.h)
    }
    /// Calculate our center-point
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.w / 2.0,
            self.origin.y + self.size.h / 2.0,
        )
    }
    pub fn width(&self) -> Coord {
        self.size.w
    }
    pub fn height(&self) -> Coord {
        self.size.h
    }
    /// Create a new [Rect] expanded by `delta` in all four directions
    pub fn expanded(&self, delta: Coord) -> Rect {
        Rect::from_corners(
            Point::new(self.min().x - delta, self.min().y - delta),
            Point::new(self.max().x + delta, self.max().y + delta),
        )
    }
    /// Boolean indication of whether we overlap rect `other`, boundaries inclusive
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min().x <= other.max().x + EPS
            && other.min().x <= self.max().x + EPS
            && self.min().y <= other.max().y + EPS
            && other.min().y <= self.max().y + EPS
    }
}

/// # Polygon
///
/// Closed n-sided polygon with at least three vertices.
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}
impl Polygon {
    /// Create a new [Polygon]. Fails for fewer than three vertices.
    pub fn new(points: Vec<Point>) -> LayoutResult<Self> {
        if points.len() < 3 {
            return Err(LayoutError::Validation(format!(
                "Polygon requires at least 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }
    /// Minimum width, approximated as the smallest distance between
    /// pairs of parallel edges.
    ///
    /// This is *not* a true Minkowski-based width computation; narrow
    /// features bounded by non-parallel edges are not captured. Kept as a
    /// deliberate, documented approximation.
    pub fn min_width(&self) -> Option<Coord> {
        let edges = self.edges();
        let mut min: Option<Coord> = None;
        for i in 0..edges.len() {
            for j in (i + 1)..edges.len() {
                let (ei, ej) = (&edges[i], &edges[j]);
                let di = ei.b - ei.a;
                let dj = ej.b - ej.a;
                // Parallel test: cross-product of the edge directions near zero
                if (di.x * dj.y - di.y * dj.x).abs() > EPS {
                    continue;
                }
                let d = ei.dist_to_segment(ej);
                if d > EPS {
                    min = Some(match min {
                        Some(m) => m.min(d),
                        None => d,
                    });
                }
            }
        }
        min
    }
}

/// # Path
///
/// Open-ended geometric path with non-zero width.
/// Requires at least two points and a strictly positive width.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub points: Vec<Point>,
    pub width: Coord,
}
impl Path {
    /// Create a new [Path]. Fails for fewer than two points or non-positive width.
    pub fn new(points: Vec<Point>, width: Coord) -> LayoutResult<Self> {
        if points.len() < 2 {
            return Err(LayoutError::Validation(format!(
                "Path requires at least 2 points, got {}",
                points.len()
            )));
        }
        if width <= 0.0 {
            return Err(LayoutError::Validation(format!(
                "Path requires positive width, got {}",
                width
            )));
        }
        Ok(Self { points, width })
    }
    /// Total spine length
    pub fn length(&self) -> Coord {
        self.points
            .windows(2)
            .map(|w| w[0].dist(&w[1]))
            .sum()
    }
}

/// # Geometry
///
/// The primary geometric sum type comprising raw layout.
/// Variants include [Rect], [Polygon], and [Path].
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(GeometryOps)]
pub enum Geometry {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
}
impl Default for Geometry {
    fn default() -> Self {
        Self::Rect(Rect::default())
    }
}
impl Geometry {
    /// Boolean indication of whether we intersect with [Geometry] `other`.
    /// Exactly equivalent to a zero [minimum_distance].
    pub fn intersects(&self, other: &Geometry) -> bool {
        minimum_distance(self, other) <= EPS
    }
}

/// # GeometryOps
///
/// Common geometric operations, dispatched from the [Geometry] enum
/// to its variants by [enum_dispatch].
///
#[enum_dispatch]
pub trait GeometryOps {
    /// Compute a rectangular bounding box.
    /// Paths are inflated by half their width in both axes.
    fn bbox(&self) -> BoundBox;
    /// Enclosed area
    fn area(&self) -> Coord;
    /// Decompose into edge [Segment]s
    fn edges(&self) -> Vec<Segment>;
    /// Half-width inflation applied around the edge decomposition.
    /// Non-zero for paths only.
    fn inflation(&self) -> Coord;
    /// Boolean indication of whether the geometry contains [Point] `pt`.
    /// Containment is inclusive of boundaries.
    fn contains(&self, pt: &Point) -> bool;
}

impl GeometryOps for Rect {
    fn bbox(&self) -> BoundBox {
        BoundBox::from_points(self.min(), self.max())
    }
    fn area(&self) -> Coord {
        self.size.area()
    }
    fn edges(&self) -> Vec<Segment> {
        let (p0, p1) = (self.min(), self.max());
        let (p01, p10) = (Point::new(p0.x, p1.y), Point::new(p1.x, p0.y));
        vec![
            Segment::new(p0, p10),
            Segment::new(p10, p1),
            Segment::new(p1, p01),
            Segment::new(p01, p0),
        ]
    }
    fn inflation(&self) -> Coord {
        0.0
    }
    fn contains(&self, pt: &Point) -> bool {
        let (p0, p1) = (self.min(), self.max());
        p0.x - EPS <= pt.x && pt.x <= p1.x + EPS && p0.y - EPS <= pt.y && pt.y <= p1.y + EPS
    }
}
impl GeometryOps for Polygon {
    fn bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for pt in &self.points {
            bbox = bbox.union_point(pt);
        }
        bbox
    }
    /// Area via the shoelace formula, absolute-valued and halved
    fn area(&self) -> Coord {
        let mut sum = 0.0;
        let n = self.points.len();
        for i in 0..n {
            let (p, q) = (&self.points[i], &self.points[(i + 1) % n]);
            sum += p.x * q.y - q.x * p.y;
        }
        sum.abs() / 2.0
    }
    fn edges(&self) -> Vec<Segment> {
        let n = self.points.len();
        (0..n)
            .map(|i| Segment::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }
    fn inflation(&self) -> Coord {
        0.0
    }
    /// Even-odd ray-casting containment test.
    /// A small epsilon guards the division on (near-)horizontal edges.
    fn contains(&self, pt: &Point) -> bool {
        // Points on an edge count as inside
        for edge in self.edges() {
            if edge.dist_to_point(pt) <= EPS {
                return true;
            }
        }
        let mut inside = false;
        let n = self.points.len();
        for i in 0..n {
            let (a, b) = (&self.points[i], &self.points[(i + 1) % n]);
            if (a.y > pt.y) != (b.y > pt.y) {
                let mut dy = b.y - a.y;
                if dy.abs() < EPS {
                    dy = EPS;
                }
                let x = a.x + (pt.y - a.y) * (b.x - a.x) / dy;
                if pt.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}
impl GeometryOps for Path {
    fn bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for pt in &self.points {
            bbox = bbox.union_point(pt);
        }
        bbox.expand(self.width / 2.0);
        bbox
    }
    /// Area as spine length times width
    fn area(&self) -> Coord {
        self.length() * self.width
    }
    fn edges(&self) -> Vec<Segment> {
        self.points
            .windows(2)
            .map(|w| Segment::new(w[0], w[1]))
            .collect()
    }
    fn inflation(&self) -> Coord {
        self.width / 2.0
    }
    fn contains(&self, pt: &Point) -> bool {
        self.edges()
            .iter()
            .any(|seg| seg.dist_to_point(pt) <= self.width / 2.0 + EPS)
    }
}

/// Minimum distance between two [Geometry]s.
///
/// Both are decomposed into edge segments; the minimum pairwise segment
/// distance is taken, then each geometry's path-inflation (half-width for
/// paths, zero otherwise) is subtracted, floored at zero.
pub fn minimum_distance(a: &Geometry, b: &Geometry) -> Coord {
    let ea = a.edges();
    let eb = b.edges();
    let mut min = Coord::MAX;
    for sa in &ea {
        for sb in &eb {
            min = min.min(sa.dist_to_segment(sb));
            if min <= 0.0 {
                break;
            }
        }
    }
    (min - a.inflation() - b.inflation()).max(0.0)
}

/// # Cardinal Rotation
///
/// One of the four rotations layout instances may take.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}
impl Rotation {
    /// Angle in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }
    /// All four cardinal values, in increasing-angle order
    pub fn all() -> [Rotation; 4] {
        [Self::R0, Self::R90, Self::R180, Self::R270]
    }
}

/// # Cardinal-Orientation Transform
///
/// Translation plus one of four cardinal rotations plus independent
/// X/Y mirror flags. Application order is fixed:
/// mirror first, then rotation, then translation.
///
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// X-Y Translation
    pub loc: Point,
    /// Cardinal rotation, applied after mirroring
    pub rotation: Rotation,
    /// Mirror about the y-axis (negates x), applied first
    pub mirror_x: bool,
    /// Mirror about the x-axis (negates y), applied first
    pub mirror_y: bool,
}
impl Transform {
    /// The identity transform, leaving any transformed object unmodified
    pub fn identity() -> Self {
        Self::default()
    }
    /// Translation by (x,y)
    pub fn translate(x: Coord, y: Coord) -> Self {
        Self {
            loc: Point::new(x, y),
            ..Default::default()
        }
    }
    /// Pure rotation by `rotation`
    pub fn rotate(rotation: Rotation) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }
    /// Apply to [Point] `p`: mirror, then rotate, then translate.
    pub fn apply(&self, p: Point) -> Point {
        let (mut x, mut y) = (p.x, p.y);
        if self.mirror_x {
            x = -x;
        }
        if self.mirror_y {
            y = -y;
        }
        let (x, y) = match self.rotation {
            Rotation::R0 => (x, y),
            Rotation::R90 => (-y, x),
            Rotation::R180 => (-x, -y),
            Rotation::R270 => (y, -x),
        };
        Point::new(x + self.loc.x, y + self.loc.y)
    }
    /// Undo this transform: un-translate, un-rotate, un-mirror.
    pub fn inverse_apply(&self, p: Point) -> Point {
        let (x, y) = (p.x - self.loc.x, p.y - self.loc.y);
        let (mut x, mut y) = match self.rotation {
            Rotation::R0 => (x, y),
            Rotation::R90 => (y, -x),
            Rotation::R180 => (-x, -y),
            Rotation::R270 => (-y, x),
        };
        if self.mirror_y {
            y = -y;
        }
        if self.mirror_x {
            x = -x;
        }
        Point::new(x, y)
    }
}

/// Apply a hierarchical chain of [Transform]s to [Point] `p`.
///
/// `chain` is ordered outermost-first, as accumulated walking top-down
/// through an instance hierarchy; transforms are applied in reverse
/// traversal order, innermost (leaf) first.
pub fn apply_chain(chain: &[Transform], p: Point) -> Point {
    chain.iter().rev().fold(p, |p, t| t.apply(p))
}

pub trait TransformTrait {
    /// Apply [Transform] `trans`, creating a new geometry at the transformed location.
    fn transform(&self, trans: &Transform) -> Self;
}
impl TransformTrait for Rect {
    fn transform(&self, trans: &Transform) -> Self {
        // Cardinal rotations and mirrors keep rects axis-aligned;
        // transform both corners and re-normalize.
        Rect::from_corners(trans.apply(self.min()), trans.apply(self.max()))
    }
}
impl TransformTrait for Polygon {
    fn transform(&self, trans: &Transform) -> Self {
        Polygon {
            points: self.points.iter().map(|p| trans.apply(*p)).collect(),
        }
    }
}
impl TransformTrait for Path {
    fn transform(&self, trans: &Transform) -> Self {
        Path {
            points: self.points.iter().map(|p| trans.apply(*p)).collect(),
            width: self.width,
        }
    }
}
impl TransformTrait for Geometry {
    fn transform(&self, trans: &Transform) -> Self {
        match self {
            Geometry::Rect(r) => Geometry::Rect(r.transform(trans)),
            Geometry::Polygon(p) => Geometry::Polygon(p.transform(trans)),
            Geometry::Path(p) => Geometry::Path(p.transform(trans)),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn transform_identity() {
        let p = Point::new(3.0, -2.0);
        assert_eq!(Transform::identity().apply(p), p);
    }
    #[test]
    fn transform_rotate() {
        let t = Transform::rotate(Rotation::R90);
        let p = Point::new(1.0, 0.0);
        let p = t.apply(p);
        assert_eq!(p, Point::new(0.0, 1.0));
        let p = t.apply(p);
        assert_eq!(p, Point::new(-1.0, 0.0));
        let p = t.apply(p);
        assert_eq!(p, Point::new(0.0, -1.0));
        let p = t.apply(p);
        assert_eq!(p, Point::new(1.0, 0.0));
    }
    #[test]
    fn transform_order_mirror_then_rotate_then_translate() {
        let t = Transform {
            loc: Point::new(1.0, 1.0),
            rotation: Rotation::R90,
            mirror_x: true,
            mirror_y: false,
        };
        // (2, 3) -> mirror-x (-2, 3) -> R90 (-3, -2) -> translate (-2, -1)
        assert_eq!(t.apply(Point::new(2.0, 3.0)), Point::new(-2.0, -1.0));
    }
    #[test]
    fn transform_inverse_roundtrip() {
        let t = Transform {
            loc: Point::new(-4.0, 7.5),
            rotation: Rotation::R270,
            mirror_x: false,
            mirror_y: true,
        };
        let p = Point::new(1.25, -3.5);
        let q = t.inverse_apply(t.apply(p));
        assert!(p.dist(&q) < EPS);
    }
    #[test]
    fn chain_applies_child_first() {
        let outer = Transform {
            loc: Point::new(10.0, 0.0),
            rotation: Rotation::R90,
            ..Default::default()
        };
        let inner = Transform::translate(1.0, 2.0);
        let p = Point::new(1.0, 0.0);
        let composed = apply_chain(&[outer, inner], p);
        assert_eq!(composed, outer.apply(inner.apply(p)));
        assert_eq!(composed, Point::new(8.0, 2.0));
    }
    #[test]
    fn segment_distance() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((s.dist_to_point(&Point::new(5.0, 3.0)) - 3.0).abs() < EPS);
        // Projection clamps to endpoints
        assert!((s.dist_to_point(&Point::new(-3.0, 4.0)) - 5.0).abs() < EPS);

        let t = Segment::new(Point::new(5.0, -1.0), Point::new(5.0, 1.0));
        assert!(s.intersects(&t));
        assert_eq!(s.dist_to_segment(&t), 0.0);

        let u = Segment::new(Point::new(0.0, 2.0), Point::new(10.0, 2.0));
        assert!(!s.intersects(&u));
        assert!((s.dist_to_segment(&u) - 2.0).abs() < EPS);
    }
    #[test]
    fn segment_collinear_overlap() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(4.0, 0.0));
        let t = Segment::new(Point::new(2.0, 0.0), Point::new(8.0, 0.0));
        assert!(s.intersects(&t));
        let u = Segment::new(Point::new(5.0, 0.0), Point::new(8.0, 0.0));
        assert!(!s.intersects(&u));
    }
    #[test]
    fn areas() {
        let r = Geometry::Rect(Rect::new(Point::new(0.0, 0.0), Size::new(4.0, 2.0)));
        assert!((r.area() - 8.0).abs() < EPS);

        let tri = Geometry::Polygon(
            Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(0.0, 4.0),
            ])
            .unwrap(),
        );
        assert!((tri.area() - 8.0).abs() < EPS);

        let path = Geometry::Path(
            Path::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 0.5).unwrap(),
        );
        assert!((path.area() - 5.0).abs() < EPS);
    }
    #[test]
    fn invalid_geometry_rejected() {
        assert!(Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_err());
        assert!(Path::new(vec![Point::new(0.0, 0.0)], 1.0).is_err());
        assert!(Path::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)], 0.0).is_err());
    }
    #[test]
    fn min_distance_and_intersects() {
        let a = Geometry::Rect(Rect::new(Point::new(0.0, 0.0), Size::new(1.0, 1.0)));
        let b = Geometry::Rect(Rect::new(Point::new(2.0, 0.0), Size::new(1.0, 1.0)));
        assert!((minimum_distance(&a, &b) - 1.0).abs() < EPS);
        assert!(!a.intersects(&b));

        let c = Geometry::Rect(Rect::new(Point::new(0.5, 0.5), Size::new(1.0, 1.0)));
        assert_eq!(minimum_distance(&a, &c), 0.0);
        assert!(a.intersects(&c));

        // Path inflation pulls the measured distance in by half-width
        let p = Geometry::Path(
            Path::new(vec![Point::new(0.0, 3.0), Point::new(1.0, 3.0)], 1.0).unwrap(),
        );
        assert!((minimum_distance(&a, &p) - 1.5).abs() < EPS);
    }
    #[test]
    fn polygon_contains() {
        let u = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(2.0, 10.0),
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            Point::new(8.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ])
        .unwrap();
        assert!(u.contains(&Point::new(1.0, 9.0)));
        assert!(u.contains(&Point::new(9.0, 1.0)));
        // Inside the "U" notch, outside the polygon
        assert!(!u.contains(&Point::new(5.0, 9.0)));
        // Boundary points are inside
        assert!(u.contains(&Point::new(0.0, 0.0)));
    }
    #[test]
    fn polygon_min_width_approximation() {
        // A 2-wide, 10-tall bar: the parallel vertical edges are 2 apart
        let bar = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap();
        let w = bar.min_width().unwrap();
        assert!((w - 2.0).abs() < EPS);
    }
}
