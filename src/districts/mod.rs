use anyhow::Result;
use geo::{Geometry, LineString, MultiPolygon};

use crate::types::{District, DistrictKey};

/// One edge of the road network: its `highway` class and geometry.
#[derive(Debug, Clone)]
pub struct RoadSegment {
    pub highway: String,
    pub line: LineString<f64>,
}

/// Source of the road network graph for a boundary (network type "all").
pub trait RoadNetworkSource {
    fn roads_in(&self, boundary: &MultiPolygon<f64>) -> Result<Vec<RoadSegment>>;
}

/// Road classes that bound transport districts.  Minor paths and footways
/// do not partition an area.
const DISTRICT_ROADS: [&str; 5] =
    ["primary", "secondary", "tertiary", "residential", "unclassified"];

/// Partition a boundary into transport districts bounded by major roads.
///
/// The kept road line-work is polygonized; every closed face becomes one
/// district with a sequential synthetic id.  The ids carry no stable
/// identity across re-runs: this is a derived partition, not a persistent
/// entity.  Roads that enclose nothing yield zero districts, a valid (if
/// degenerate) outcome.
pub fn decompose_transport_districts(
    source: &dyn RoadNetworkSource,
    boundary: &MultiPolygon<f64>,
    verbose: u8,
) -> Result<Vec<District>> {
    let roads = source.roads_in(boundary)?;

    let kept: Vec<LineString<f64>> = roads
        .into_iter()
        .filter(|segment| bounds_districts(&segment.highway))
        .map(|segment| segment.line)
        .collect();

    let faces = planegraph::polygonize(&kept);
    if verbose > 0 {
        eprintln!("[districts] {} road edges -> {} districts", kept.len(), faces.len());
    }

    Ok(faces
        .into_iter()
        .enumerate()
        .map(|(i, face)| District::new(DistrictKey::Transport(i as u32), Geometry::Polygon(face)))
        .collect())
}

/// A `highway` value bounds districts when any of its `;`-separated parts
/// is one of the district road classes.
fn bounds_districts(highway: &str) -> bool {
    highway
        .split(';')
        .any(|part| DISTRICT_ROADS.contains(&part.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRoads(Vec<RoadSegment>);
    impl RoadNetworkSource for FixedRoads {
        fn roads_in(&self, _boundary: &MultiPolygon<f64>) -> Result<Vec<RoadSegment>> {
            Ok(self.0.clone())
        }
    }

    fn segment(highway: &str, coords: &[(f64, f64)]) -> RoadSegment {
        RoadSegment {
            highway: highway.to_string(),
            line: LineString(coords.iter().map(|&(x, y)| geo::Coord { x, y }).collect()),
        }
    }

    fn boundary() -> MultiPolygon<f64> {
        use geo::polygon;
        MultiPolygon(vec![polygon![
            (x: -1.0, y: -1.0), (x: 3.0, y: -1.0), (x: 3.0, y: 3.0), (x: -1.0, y: 3.0)
        ]])
    }

    #[test]
    fn enclosed_block_becomes_one_district() {
        let roads = FixedRoads(vec![
            segment("residential", &[(0.0, 0.0), (1.0, 0.0)]),
            segment("residential", &[(1.0, 0.0), (1.0, 1.0)]),
            segment("tertiary", &[(1.0, 1.0), (0.0, 1.0)]),
            segment("tertiary", &[(0.0, 1.0), (0.0, 0.0)]),
        ]);
        let districts = decompose_transport_districts(&roads, &boundary(), 0).unwrap();
        assert_eq!(districts.len(), 1);
        assert_eq!(districts[0].key, DistrictKey::Transport(0));
    }

    #[test]
    fn footways_do_not_bound_districts() {
        let roads = FixedRoads(vec![
            segment("footway", &[(0.0, 0.0), (1.0, 0.0)]),
            segment("footway", &[(1.0, 0.0), (1.0, 1.0)]),
            segment("footway", &[(1.0, 1.0), (0.0, 1.0)]),
            segment("footway", &[(0.0, 1.0), (0.0, 0.0)]),
        ]);
        let districts = decompose_transport_districts(&roads, &boundary(), 0).unwrap();
        assert!(districts.is_empty());
    }

    #[test]
    fn sequential_ids_over_a_grid() {
        // A 2x1 block pair sharing a middle wall.
        let roads = FixedRoads(vec![
            segment("residential", &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            segment("residential", &[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]),
            segment("residential", &[(0.0, 0.0), (0.0, 1.0)]),
            segment("residential", &[(1.0, 0.0), (1.0, 1.0)]),
            segment("residential", &[(2.0, 0.0), (2.0, 1.0)]),
        ]);
        let districts = decompose_transport_districts(&roads, &boundary(), 0).unwrap();
        assert_eq!(districts.len(), 2);
        let ids: Vec<_> = districts.iter().map(|d| d.key).collect();
        assert_eq!(ids, vec![DistrictKey::Transport(0), DistrictKey::Transport(1)]);
    }

    #[test]
    fn multi_value_highway_tags_match() {
        assert!(bounds_districts("primary;footway"));
        assert!(!bounds_districts("footway;path"));
    }
}
