use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// `[longitude, latitude]`, GeoJSON axis order.
pub type Position = [f64; 2];
pub type Ring = Vec<Position>;

/// District boundary as stored: a GeoJSON geometry object in EPSG:4326.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum BoundaryGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl BoundaryGeometry {
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Self::Polygon(rings) => vec![rings.as_slice()],
            Self::MultiPolygon(polygons) => polygons.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Complete validity check for ingestion: structure, ring topology, and for
    /// multi-polygons, members that meet at most at isolated points.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let shape = self.to_multi_polygon()?;
        for (index, polygon) in shape.0.iter().enumerate() {
            check_topology(index, polygon)?;
        }
        check_members(&shape.0)
    }

    /// Builds the planar shape after structural checks only.
    ///
    /// Topology is assumed to have been verified by [`BoundaryGeometry::validate`] when the
    /// boundary was ingested.
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        let polygons = self.polygons();
        if polygons.is_empty() {
            return Err(GeometryError::Empty);
        }

        polygons
            .into_iter()
            .enumerate()
            .map(|(index, rings)| build_polygon(index, rings))
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon::new)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry contains no polygons")]
    Empty,
    #[error("polygon {polygon} has no rings")]
    EmptyPolygon { polygon: usize },
    #[error("ring {ring} of polygon {polygon} has {positions} positions; at least 4 are required")]
    TooFewPositions {
        polygon: usize,
        ring: usize,
        positions: usize,
    },
    #[error("ring {ring} of polygon {polygon} contains a non-finite coordinate")]
    NonFiniteCoordinate { polygon: usize, ring: usize },
    #[error(
        "ring {ring} of polygon {polygon} has position ({longitude}, {latitude}) outside EPSG:4326 bounds"
    )]
    OutOfRange {
        polygon: usize,
        ring: usize,
        longitude: f64,
        latitude: f64,
    },
    #[error("ring {ring} of polygon {polygon} is not closed")]
    UnclosedRing { polygon: usize, ring: usize },
    #[error("ring {ring} of polygon {polygon} collapses to fewer than three edges")]
    Degenerate { polygon: usize, ring: usize },
    #[error("ring {ring} of polygon {polygon} intersects itself")]
    SelfIntersection { polygon: usize, ring: usize },
    #[error("hole {ring} of polygon {polygon} lies outside its exterior ring")]
    HoleOutsideShell { polygon: usize, ring: usize },
    #[error("rings {first} and {second} of polygon {polygon} cross")]
    CrossingRings {
        polygon: usize,
        first: usize,
        second: usize,
    },
    #[error("polygons {first} and {second} overlap or share an edge")]
    OverlappingPolygons { first: usize, second: usize },
    #[error("point coordinates must be finite")]
    NonFinitePoint,
    #[error("point ({latitude}, {longitude}) is outside EPSG:4326 bounds")]
    PointOutOfRange { latitude: f64, longitude: f64 },
}

fn build_polygon(index: usize, rings: &[Ring]) -> Result<Polygon<f64>, GeometryError> {
    let mut line_strings = rings
        .iter()
        .enumerate()
        .map(|(ring, positions)| build_ring(index, ring, positions));

    let exterior = match line_strings.next() {
        Some(ring) => ring?,
        None => return Err(GeometryError::EmptyPolygon { polygon: index }),
    };
    let interiors = line_strings.collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn build_ring(
    polygon: usize,
    ring: usize,
    positions: &[Position],
) -> Result<LineString<f64>, GeometryError> {
    if positions.len() < 4 {
        return Err(GeometryError::TooFewPositions {
            polygon,
            ring,
            positions: positions.len(),
        });
    }

    for &[longitude, latitude] in positions {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { polygon, ring });
        }
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeometryError::OutOfRange {
                polygon,
                ring,
                longitude,
                latitude,
            });
        }
    }

    if positions.first() != positions.last() {
        return Err(GeometryError::UnclosedRing { polygon, ring });
    }

    Ok(LineString::from(
        positions
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect::<Vec<_>>(),
    ))
}

fn segments(ring: &LineString<f64>) -> Vec<Line<f64>> {
    ring.lines().filter(|line| line.start != line.end).collect()
}

fn check_topology(index: usize, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    let rings: Vec<Vec<Line<f64>>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(segments)
        .collect();

    for (ring, edges) in rings.iter().enumerate() {
        if edges.len() < 3 {
            return Err(GeometryError::Degenerate {
                polygon: index,
                ring,
            });
        }
        if !is_simple(edges) {
            return Err(GeometryError::SelfIntersection {
                polygon: index,
                ring,
            });
        }
    }

    let shell = Polygon::new(polygon.exterior().clone(), Vec::new());
    for (offset, hole) in polygon.interiors().iter().enumerate() {
        let escapes = hole
            .coords()
            .any(|coord| shell.coordinate_position(coord) == CoordPos::Outside);
        if escapes {
            return Err(GeometryError::HoleOutsideShell {
                polygon: index,
                ring: offset + 1,
            });
        }
    }

    for first in 0..rings.len() {
        for second in (first + 1)..rings.len() {
            if rings_cross(&rings[first], &rings[second]) {
                return Err(GeometryError::CrossingRings {
                    polygon: index,
                    first,
                    second,
                });
            }
        }
    }

    Ok(())
}

fn check_members(polygons: &[Polygon<f64>]) -> Result<(), GeometryError> {
    let shells: Vec<Vec<Line<f64>>> = polygons
        .iter()
        .map(|polygon| segments(polygon.exterior()))
        .collect();

    for first in 0..polygons.len() {
        for second in (first + 1)..polygons.len() {
            let overlapping = rings_cross(&shells[first], &shells[second])
                || reaches_inside(&shells[second], &polygons[first])
                || reaches_inside(&shells[first], &polygons[second]);
            if overlapping {
                return Err(GeometryError::OverlappingPolygons { first, second });
            }
        }
    }
    Ok(())
}

/// True when a vertex or edge midpoint of `shell` lies in the interior of `other`.
fn reaches_inside(shell: &[Line<f64>], other: &Polygon<f64>) -> bool {
    shell.iter().any(|edge| {
        let midpoint = Coord {
            x: (edge.start.x + edge.end.x) / 2.0,
            y: (edge.start.y + edge.end.y) / 2.0,
        };
        other.coordinate_position(&edge.start) == CoordPos::Inside
            || other.coordinate_position(&midpoint) == CoordPos::Inside
    })
}

/// Consecutive edges may only share their common vertex; all other pairs must be disjoint.
fn is_simple(edges: &[Line<f64>]) -> bool {
    let count = edges.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let adjacent = j == i + 1 || (i == 0 && j == count - 1);
            match line_intersection(edges[i], edges[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return false,
            }
        }
    }
    true
}

/// Rings of one polygon may touch at isolated points but never cross or share an edge.
fn rings_cross(first: &[Line<f64>], second: &[Line<f64>]) -> bool {
    first.iter().any(|a| {
        second.iter().any(|b| {
            matches!(
                line_intersection(*a, *b),
                Some(LineIntersection::SinglePoint {
                    is_proper: true,
                    ..
                }) | Some(LineIntersection::Collinear { .. })
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    #[test]
    fn square_polygon_is_valid() {
        let geometry = BoundaryGeometry::Polygon(vec![square(0.0, 10.0)]);
        geometry.validate().expect("square is valid");
        let shape = geometry.to_multi_polygon().expect("shape builds");
        assert_eq!(shape.0.len(), 1);
    }

    #[test]
    fn polygon_with_contained_hole_is_valid() {
        let geometry = BoundaryGeometry::Polygon(vec![square(0.0, 10.0), square(2.0, 4.0)]);
        geometry.validate().expect("hole inside shell is valid");
    }

    #[test]
    fn unclosed_ring_is_rejected() {
        let geometry = BoundaryGeometry::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]]);
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::UnclosedRing {
                polygon: 0,
                ring: 0
            })
        );
    }

    #[test]
    fn short_ring_is_rejected() {
        let geometry =
            BoundaryGeometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]);
        assert!(matches!(
            geometry.to_multi_polygon(),
            Err(GeometryError::TooFewPositions { positions: 3, .. })
        ));
    }

    #[test]
    fn bowtie_ring_is_rejected() {
        let geometry = BoundaryGeometry::Polygon(vec![vec![
            [0.0, 0.0],
            [4.0, 4.0],
            [4.0, 0.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ]]);
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::SelfIntersection {
                polygon: 0,
                ring: 0
            })
        );
    }

    #[test]
    fn spike_ring_is_rejected() {
        let geometry = BoundaryGeometry::Polygon(vec![vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [4.0, 2.0],
            [0.0, 0.0],
        ]]);
        assert!(matches!(
            geometry.validate(),
            Err(GeometryError::SelfIntersection { .. })
        ));
    }

    #[test]
    fn swapped_axes_are_out_of_range() {
        let geometry = BoundaryGeometry::Polygon(vec![vec![
            [41.8, -87.7],
            [41.9, -87.7],
            [41.9, -87.6],
            [41.8, -87.6],
            [41.8, -87.7],
        ]]);
        assert!(matches!(
            geometry.validate(),
            Err(GeometryError::OutOfRange { .. })
        ));
    }

    #[test]
    fn hole_outside_shell_is_rejected() {
        let geometry = BoundaryGeometry::Polygon(vec![square(0.0, 10.0), square(20.0, 30.0)]);
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::HoleOutsideShell {
                polygon: 0,
                ring: 1
            })
        );
    }

    #[test]
    fn hole_crossing_shell_is_rejected() {
        let geometry = BoundaryGeometry::Polygon(vec![square(0.0, 10.0), square(5.0, 15.0)]);
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn multipolygon_reports_offending_member() {
        let geometry = BoundaryGeometry::MultiPolygon(vec![
            vec![square(0.0, 1.0)],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.5]]],
        ]);
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::UnclosedRing {
                polygon: 1,
                ring: 0
            })
        );
    }

    #[test]
    fn multipolygon_members_sharing_an_edge_are_rejected() {
        let geometry = BoundaryGeometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
            vec![vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]],
        ]);
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::OverlappingPolygons {
                first: 0,
                second: 1
            })
        );
    }

    #[test]
    fn overlapping_and_nested_members_are_rejected() {
        let overlapping =
            BoundaryGeometry::MultiPolygon(vec![vec![square(0.0, 2.0)], vec![square(1.0, 3.0)]]);
        assert!(matches!(
            overlapping.validate(),
            Err(GeometryError::OverlappingPolygons { .. })
        ));

        let nested =
            BoundaryGeometry::MultiPolygon(vec![vec![square(0.0, 10.0)], vec![square(2.0, 4.0)]]);
        assert_eq!(
            nested.validate(),
            Err(GeometryError::OverlappingPolygons {
                first: 0,
                second: 1
            })
        );
    }

    #[test]
    fn multipolygon_members_may_touch_at_a_vertex() {
        let geometry =
            BoundaryGeometry::MultiPolygon(vec![vec![square(0.0, 1.0)], vec![square(1.0, 2.0)]]);
        geometry.validate().expect("single shared vertex is valid");
    }

    #[test]
    fn island_inside_a_hole_is_valid() {
        let geometry = BoundaryGeometry::MultiPolygon(vec![
            vec![square(0.0, 10.0), square(2.0, 8.0)],
            vec![square(4.0, 6.0)],
        ]);
        geometry.validate().expect("island sits in the hole");
    }

    #[test]
    fn empty_multipolygon_is_rejected() {
        assert_eq!(
            BoundaryGeometry::MultiPolygon(Vec::new()).validate(),
            Err(GeometryError::Empty)
        );
        assert_eq!(
            BoundaryGeometry::Polygon(Vec::new()).validate(),
            Err(GeometryError::EmptyPolygon { polygon: 0 })
        );
    }

    #[test]
    fn deserializes_geojson_geometry_objects() {
        let json = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;
        let geometry: BoundaryGeometry = serde_json::from_str(json).expect("parse geometry");
        assert_eq!(geometry, BoundaryGeometry::Polygon(vec![square(0.0, 1.0)]));
    }
}
