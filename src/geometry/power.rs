use super::{area, ClipPolygon, Point, Polygon};

/// Cells thinner than this fraction of the clip area are treated as empty.
const MIN_CELL_AREA_RATIO: f64 = 1e-12;

/// Anything the diagram builder can read a position and a weight from.
pub trait PowerSite {
    fn position(&self) -> Point;
    fn weight(&self) -> f64;
}

/// One cell of a power diagram, tagged with the index of its generating site.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub site: usize,
    pub polygon: Polygon,
}

impl Cell {
    pub fn area(&self) -> f64 {
        area(&self.polygon)
    }
}

/// Builds a weighted (power) Voronoi diagram restricted to a clip polygon.
///
/// Implementations return at most one cell per site, in site order, and omit
/// sites whose cell is empty.
pub trait DiagramBuilder {
    fn build<S: PowerSite>(&self, sites: &[S], clip: &ClipPolygon) -> Vec<Cell>;
}

/// Power diagram by half-plane intersection.
///
/// A point `p` belongs to site `i` when `|p - s_i|² - w_i <= |p - s_j|² - w_j`
/// for every other site `j`, which is linear in `p`. Each cell is therefore the
/// clip polygon cut by `n - 1` half-planes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerDiagram;

impl DiagramBuilder for PowerDiagram {
    fn build<S: PowerSite>(&self, sites: &[S], clip: &ClipPolygon) -> Vec<Cell> {
        let min_area = clip.area() * MIN_CELL_AREA_RATIO;
        let mut cells = Vec::with_capacity(sites.len());

        for (i, site) in sites.iter().enumerate() {
            let si = site.position();
            let wi = site.weight();
            let si_sq = si.x * si.x + si.y * si.y;
            let mut polygon: Polygon = clip.vertices().to_vec();

            for (j, other) in sites.iter().enumerate() {
                if i == j {
                    continue;
                }
                let sj = other.position();
                let sj_sq = sj.x * sj.x + sj.y * sj.y;
                let normal = Point::new(2.0 * (sj.x - si.x), 2.0 * (sj.y - si.y));
                let offset = sj_sq - si_sq - other.weight() + wi;
                polygon = clip_half_plane(&polygon, normal, offset);
                if polygon.len() < 3 {
                    break;
                }
            }

            if polygon.len() >= 3 && area(&polygon) > min_area {
                cells.push(Cell { site: i, polygon });
            }
        }

        cells
    }
}

/// Keep the part of a convex polygon where `normal · p <= offset`.
fn clip_half_plane(polygon: &[Point], normal: Point, offset: f64) -> Polygon {
    let n = polygon.len();
    let mut out = Vec::with_capacity(n + 1);
    if normal.x == 0.0 && normal.y == 0.0 {
        // coincident sites: the lighter one loses everything
        if offset >= 0.0 {
            out.extend_from_slice(polygon);
        }
        return out;
    }

    let side = |p: Point| normal.x * p.x + normal.y * p.y - offset;
    for k in 0..n {
        let cur = polygon[k];
        let next = polygon[(k + 1) % n];
        let dc = side(cur);
        let dn = side(next);
        if dc <= 0.0 {
            out.push(cur);
        }
        if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
            let t = dc / (dc - dn);
            out.push(Point::new(
                cur.x + (next.x - cur.x) * t,
                cur.y + (next.y - cur.y) * t,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ws(Point, f64);

    impl PowerSite for Ws {
        fn position(&self) -> Point {
            self.0
        }
        fn weight(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn equal_weights_split_along_bisector() {
        let clip = ClipPolygon::unit_square();
        let sites = [
            Ws(Point::new(0.25, 0.5), 0.0),
            Ws(Point::new(0.75, 0.5), 0.0),
        ];
        let cells = PowerDiagram.build(&sites, &clip);
        assert_eq!(cells.len(), 2);
        assert!((cells[0].area() - 0.5).abs() < 1e-12);
        assert!((cells[1].area() - 0.5).abs() < 1e-12);
        assert_eq!(cells[0].site, 0);
        assert_eq!(cells[1].site, 1);
    }

    #[test]
    fn heavier_site_pushes_the_boundary() {
        let clip = ClipPolygon::unit_square();
        let sites = [
            Ws(Point::new(0.25, 0.5), 0.2),
            Ws(Point::new(0.75, 0.5), 0.0),
        ];
        let cells = PowerDiagram.build(&sites, &clip);
        // boundary x satisfies (x - 0.25)² - 0.2 = (x - 0.75)², i.e. x = 0.7
        assert!((cells[0].area() - 0.7).abs() < 1e-12);
        assert!((cells[1].area() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn cells_tile_the_clip() {
        let clip = ClipPolygon::from_size([100.0, 60.0]).unwrap();
        let sites = [
            Ws(Point::new(10.0, 10.0), 50.0),
            Ws(Point::new(80.0, 15.0), 10.0),
            Ws(Point::new(40.0, 45.0), 120.0),
            Ws(Point::new(70.0, 50.0), 0.0),
        ];
        let cells = PowerDiagram.build(&sites, &clip);
        assert_eq!(cells.len(), 4);
        let total: f64 = cells.iter().map(Cell::area).sum();
        assert!((total - clip.area()).abs() < 1e-6);
    }

    #[test]
    fn overweighted_neighbour_swallows_a_cell() {
        let clip = ClipPolygon::unit_square();
        let sites = [
            Ws(Point::new(0.5, 0.5), 10.0),
            Ws(Point::new(0.55, 0.5), 0.0),
        ];
        let cells = PowerDiagram.build(&sites, &clip);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site, 0);
    }
}
