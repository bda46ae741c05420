pub mod power;

use crate::error::{Result, TreemapError};

/// A point (or site position) in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn squared_distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// A closed polygon; the last vertex connects back to the first.
pub type Polygon = Vec<Point>;

/// Shoelace area, positive for counter-clockwise vertex order.
pub fn signed_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..n {
        let p = polygon[i];
        let q = polygon[(i + 1) % n];
        a += p.x * q.y - q.x * p.y;
    }
    0.5 * a
}

pub fn area(polygon: &[Point]) -> f64 {
    signed_area(polygon).abs()
}

/// Area centroid. Falls back to the vertex mean for zero-area polygons.
pub fn centroid(polygon: &[Point]) -> Point {
    let n = polygon.len();
    if n == 0 {
        return Point::default();
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut a = 0.0;
    for i in 0..n {
        let p = polygon[i];
        let q = polygon[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        a += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    let a = a * 0.5;
    if a.abs() < f64::EPSILON {
        let inv = 1.0 / n as f64;
        let (sx, sy) = polygon
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point::new(sx * inv, sy * inv);
    }
    Point::new(cx / (6.0 * a), cy / (6.0 * a))
}

/// Even-odd ray casting test. Points exactly on an edge may fall either way.
pub fn contains(polygon: &[Point], point: Point) -> bool {
    let n = polygon.len();
    let mut inside = false;
    if n < 3 {
        return inside;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone chain. Output is counter-clockwise without collinear
/// or duplicate vertices.
pub fn convex_hull(points: &[Point]) -> Polygon {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// A convex, hole-free, counter-clockwise clipping region with cached
/// extent and area.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPolygon {
    vertices: Polygon,
    min: Point,
    max: Point,
    area: f64,
}

impl ClipPolygon {
    /// Normalize arbitrary input to its convex hull. Self-intersecting or
    /// clockwise input is accepted; input without a positive-area hull is not.
    pub fn new(points: &[Point]) -> Result<Self> {
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(TreemapError::InvalidClip {
                reason: format!("non-finite vertex ({}, {})", p.x, p.y),
            });
        }
        let vertices = convex_hull(points);
        if vertices.len() < 3 {
            return Err(TreemapError::InvalidClip {
                reason: format!("{} distinct hull vertices", vertices.len()),
            });
        }
        let area = signed_area(&vertices);
        if !(area > 0.0) {
            return Err(TreemapError::InvalidClip {
                reason: format!("hull area {area}"),
            });
        }

        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &vertices {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Ok(Self {
            vertices,
            min,
            max,
            area,
        })
    }

    /// Axis-aligned rectangle spanning `[x0, y0]` to `[x1, y1]`.
    pub fn from_extent(extent: [[f64; 2]; 2]) -> Result<Self> {
        let [[x0, y0], [x1, y1]] = extent;
        Self::new(&[
            Point::new(x0, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
            Point::new(x1, y0),
        ])
    }

    /// Rectangle of the given `[width, height]` anchored at the origin.
    pub fn from_size(size: [f64; 2]) -> Result<Self> {
        Self::from_extent([[0.0, 0.0], size])
    }

    pub fn unit_square() -> Self {
        let vertices = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        Self {
            vertices,
            min: Point::new(0.0, 0.0),
            max: Point::new(1.0, 1.0),
            area: 1.0,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// `[[min_x, min_y], [max_x, max_y]]`
    pub fn extent(&self) -> [[f64; 2]; 2] {
        [[self.min.x, self.min.y], [self.max.x, self.max.y]]
    }

    /// `[width, height]` of the extent.
    pub fn size(&self) -> [f64; 2] {
        [self.max.x - self.min.x, self.max.y - self.min.y]
    }

    pub fn contains(&self, point: Point) -> bool {
        contains(&self.vertices, point)
    }
}

impl Default for ClipPolygon {
    fn default() -> Self {
        Self::unit_square()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Polygon {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn area_is_orientation_independent() {
        let mut sq = square(2.0);
        assert!((signed_area(&sq) - 4.0).abs() < 1e-12);
        sq.reverse();
        assert!((signed_area(&sq) + 4.0).abs() < 1e-12);
        assert!((area(&sq) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_square_is_its_center() {
        let c = centroid(&square(2.0));
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn contains_interior_and_rejects_exterior() {
        let sq = square(1.0);
        assert!(contains(&sq, Point::new(0.5, 0.5)));
        assert!(!contains(&sq, Point::new(1.5, 0.5)));
        assert!(!contains(&sq, Point::new(0.5, -0.1)));
    }

    #[test]
    fn self_intersecting_clip_is_normalized_to_counter_clockwise_hull() {
        let clip = ClipPolygon::new(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(clip.vertices().len(), 4);
        assert!(signed_area(clip.vertices()) > 0.0);
        assert!((clip.area() - 1.0).abs() < 1e-12);
        for corner in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
            assert!(clip.vertices().contains(&Point::from(corner)));
        }
    }

    #[test]
    fn collinear_clip_is_rejected() {
        let err = ClipPolygon::new(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TreemapError::InvalidClip { .. }));
    }

    #[test]
    fn size_and_extent_agree() {
        let clip = ClipPolygon::from_extent([[10.0, 20.0], [110.0, 70.0]]).unwrap();
        assert_eq!(clip.size(), [100.0, 50.0]);
        assert_eq!(clip.extent(), [[10.0, 20.0], [110.0, 70.0]]);
        assert!((clip.area() - 5000.0).abs() < 1e-9);
        assert_eq!(ClipPolygon::from_size([1.0, 1.0]).unwrap(), ClipPolygon::unit_square());
    }
}
