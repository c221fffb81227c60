use crate::structs::parameters::ParameterPoint;
use geo::{Area, ConvexHull, Coord, Intersects, MultiPoint, Point, Polygon};

const EPS: f64 = 1e-12;

/// The region of parameter space spanned by a set of accepted points
///
/// The region is the convex hull of the points, boundary included. When all points are collinear the hull has no
/// area, and the region is the segment between the two extreme points.
#[derive(Debug, Clone)]
pub struct Region {
    hull: Polygon<f64>,
    segment: Option<(Coord<f64>, Coord<f64>)>,
}

fn on_segment(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (cx, cy) = (c.x - a.x, c.y - a.y);
    let length = (dx * dx + dy * dy).sqrt();
    if length <= EPS {
        return cx.abs() <= EPS && cy.abs() <= EPS;
    }
    let cross = dx * cy - dy * cx;
    let dot = dx * cx + dy * cy;
    cross.abs() <= EPS * length.max(1.0) && dot >= -EPS && dot <= length * length + EPS
}

impl Region {
    /// The region spanned by `points`, or `None` if there are no points
    pub fn from_points(points: &[ParameterPoint]) -> Option<Self> {
        let coords: Vec<Coord<f64>> = points
            .iter()
            .map(|p| Coord {
                x: p.scout_prob,
                y: p.survival_prob,
            })
            .collect();
        let lexicographic = |a: &&Coord<f64>, b: &&Coord<f64>| {
            a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
        };
        let first = *coords.iter().min_by(lexicographic)?;
        let last = *coords.iter().max_by(lexicographic)?;

        let multipoint: MultiPoint<f64> = coords.iter().map(|c| Point::from(*c)).collect();
        let hull = multipoint.convex_hull();
        let segment = if hull.unsigned_area() <= EPS * EPS {
            Some((first, last))
        } else {
            None
        };
        Some(Region { hull, segment })
    }

    pub fn contains(&self, point: &ParameterPoint) -> bool {
        let coord = Coord {
            x: point.scout_prob,
            y: point.survival_prob,
        };
        match self.segment {
            Some((a, b)) => on_segment(a, b, coord),
            None => self.hull.intersects(&coord),
        }
    }

    pub fn hull(&self) -> &Polygon<f64> {
        &self.hull
    }
}
