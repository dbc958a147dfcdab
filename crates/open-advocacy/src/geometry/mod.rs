//! Geometry primitives: geocoded points, stored district boundaries, and containment.

pub mod boundary;
pub mod point;

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::MultiPolygon;

pub use boundary::{BoundaryGeometry, GeometryError, Position, Ring};
pub use point::GeoPoint;

/// Containment with the boundary counted as inside.
///
/// Members are tested one at a time: the multi-polygon position applies the mod-2 rule to
/// boundary hits, which would report a vertex shared by two members as outside.
pub fn covers(shape: &MultiPolygon<f64>, point: &GeoPoint) -> bool {
    let coord = point.coord();
    shape
        .0
        .iter()
        .any(|polygon| polygon.coordinate_position(&coord) != CoordPos::Outside)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).expect("valid point")
    }

    fn ward_with_courtyard() -> MultiPolygon<f64> {
        BoundaryGeometry::Polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]],
        ])
        .to_multi_polygon()
        .expect("valid shape")
    }

    #[test]
    fn interior_point_is_covered() {
        assert!(covers(&ward_with_courtyard(), &point(2.0, 2.0)));
    }

    #[test]
    fn exterior_point_is_not_covered() {
        assert!(!covers(&ward_with_courtyard(), &point(2.0, 12.0)));
        assert!(!covers(&ward_with_courtyard(), &point(-0.5, 5.0)));
    }

    #[test]
    fn edge_and_vertex_points_are_covered() {
        let shape = ward_with_courtyard();
        assert!(covers(&shape, &point(0.0, 5.0)));
        assert!(covers(&shape, &point(10.0, 10.0)));
    }

    #[test]
    fn hole_interior_is_outside_but_hole_edge_is_covered() {
        let shape = ward_with_courtyard();
        assert!(!covers(&shape, &point(5.0, 5.0)));
        assert!(covers(&shape, &point(4.0, 5.0)));
    }

    #[test]
    fn diagonal_edge_point_is_covered() {
        let triangle = BoundaryGeometry::Polygon(vec![vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ]])
        .to_multi_polygon()
        .expect("valid triangle");
        assert!(covers(&triangle, &point(2.0, 2.0)));
        assert!(!covers(&triangle, &point(2.5, 2.0)));
    }

    #[test]
    fn vertex_shared_by_two_members_is_covered() {
        let shape = BoundaryGeometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
            vec![vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]],
        ])
        .to_multi_polygon()
        .expect("valid shape");

        assert!(covers(&shape, &point(1.0, 1.0)));
        assert!(covers(&shape, &point(1.5, 1.5)));
        assert!(covers(&shape, &point(0.5, 1.0)));
        assert!(!covers(&shape, &point(0.5, 1.5)));
    }
}
