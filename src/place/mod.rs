mod admin;
mod gazetteer;

pub use admin::{city_and_region, AdminArea, AdminLookup};
pub use gazetteer::{CandidateSelector, FirstMatch, Gazetteer, PlaceCandidate};

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::geometry::{make_valid, parse_wkt};

/// The ways a place can be specified.
#[derive(Debug, Clone)]
pub enum PlaceInput {
    /// Free-text name, resolved through the gazetteer.
    Name(String),
    /// Corner coordinates in degrees.
    BoundingBox { north: f64, south: f64, west: f64, east: f64 },
    /// POLYGON/MULTIPOLYGON well-known text.
    Wkt(String),
    /// An already-constructed boundary.
    Geometry(Geometry<f64>),
}

/// Resolve a place input into one validated boundary.
///
/// Whatever the path, the result funnels through validity repair, so every
/// downstream consumer receives a valid multi-polygon.
pub fn resolve_place(
    input: &PlaceInput,
    gazetteer: &dyn Gazetteer,
    selector: &dyn CandidateSelector,
    verbose: u8,
) -> Result<MultiPolygon<f64>> {
    let geometry = match input {
        PlaceInput::Name(name) => {
            let candidates = gazetteer
                .search(name)
                .with_context(|| format!("[place] Gazetteer lookup failed for {name:?}"))?;
            if verbose > 0 {
                for (i, c) in candidates.iter().enumerate() {
                    eprintln!("[place] candidate {i}: {}", c.display_name);
                }
            }
            let Some(chosen) = selector.choose(&candidates) else {
                bail!("[place] No boundary candidate selected for {name:?}");
            };
            if !chosen.is_polygonal() {
                bail!("[place] Place {name:?} has no polygonal boundary");
            }
            chosen.geometry.clone()
        }
        PlaceInput::BoundingBox { north, south, west, east } => {
            Geometry::Polygon(quad(*north, *south, *west, *east))
        }
        PlaceInput::Wkt(text) => parse_wkt(text)?,
        PlaceInput::Geometry(geometry) => geometry.clone(),
    };

    into_boundary(make_valid(&geometry))
}

/// Closed quadrilateral from corner coordinates, wound NW→NE→SE→SW→NW.
fn quad(north: f64, south: f64, west: f64, east: f64) -> Polygon<f64> {
    let ring = vec![
        Coord { x: west, y: north },
        Coord { x: east, y: north },
        Coord { x: east, y: south },
        Coord { x: west, y: south },
        Coord { x: west, y: north },
    ];
    Polygon::new(LineString(ring), Vec::new())
}

fn into_boundary(geometry: Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        other => bail!("[place] Boundary must be polygonal, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    struct NoGazetteer;
    impl Gazetteer for NoGazetteer {
        fn search(&self, _query: &str) -> Result<Vec<PlaceCandidate>> {
            Ok(Vec::new())
        }
    }

    fn resolve(input: PlaceInput) -> Result<MultiPolygon<f64>> {
        resolve_place(&input, &NoGazetteer, &FirstMatch::default(), 0)
    }

    #[test]
    fn bounding_box_builds_closed_quad() {
        let boundary = resolve(PlaceInput::BoundingBox {
            north: 2.0,
            south: 1.0,
            west: 10.0,
            east: 11.0,
        })
        .unwrap();
        let exterior = boundary.0[0].exterior();
        assert_eq!(exterior.0.len(), 5);
        assert_eq!(exterior.0[0], Coord { x: 10.0, y: 2.0 }); // NW
        assert_eq!(exterior.0[1], Coord { x: 11.0, y: 2.0 }); // NE
        assert_eq!(exterior.0[2], Coord { x: 11.0, y: 1.0 }); // SE
        assert_eq!(exterior.0[3], Coord { x: 10.0, y: 1.0 }); // SW
        assert_eq!(exterior.0[0], exterior.0[4]);
    }

    #[test]
    fn wkt_input_parses() {
        let boundary = resolve(PlaceInput::Wkt(
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
        ))
        .unwrap();
        assert_eq!(boundary.0.len(), 1);
    }

    #[test]
    fn non_polygonal_geometry_is_rejected() {
        let err = resolve(PlaceInput::Geometry(Geometry::Point(geo::Point::new(0.0, 0.0))));
        assert!(err.is_err());
    }

    #[test]
    fn unresolved_name_is_an_error() {
        assert!(resolve(PlaceInput::Name("nowhere".into())).is_err());
    }

    #[test]
    fn polygon_passes_through() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let boundary = resolve(PlaceInput::Geometry(Geometry::Polygon(square))).unwrap();
        assert_eq!(boundary.0.len(), 1);
    }
}
