// End-to-end pipeline tests over in-memory fake sources: one place with a
// building, an amenity inside it, a land-use area and a road grid.

use ahash::AHashMap;
use anyhow::{bail, Result};
use geo::{polygon, Geometry, LineString, MultiPolygon, Point};

use urbanpop::acquire::FeatureSource;
use urbanpop::address::{parse_address, RegistryRecord};
use urbanpop::districts::{RoadNetworkSource, RoadSegment};
use urbanpop::io::write_buildings_csv_string;
use urbanpop::place::{FirstMatch, Gazetteer, PlaceCandidate};
use urbanpop::{
    enrich_place, ElementType, EnrichOptions, EnrichSources, Feature, FeatureId, PlaceInput,
    TagCategory,
};

struct NoGazetteer;
impl Gazetteer for NoGazetteer {
    fn search(&self, _query: &str) -> Result<Vec<PlaceCandidate>> {
        Ok(Vec::new())
    }
}

struct FakeFeatures {
    categories: AHashMap<TagCategory, Vec<Feature>>,
    failing: Vec<TagCategory>,
}

impl FeatureSource for FakeFeatures {
    fn features_in(
        &self,
        _boundary: &MultiPolygon<f64>,
        category: TagCategory,
    ) -> Result<Vec<Feature>> {
        if self.failing.contains(&category) {
            bail!("insufficient response");
        }
        Ok(self.categories.get(&category).cloned().unwrap_or_default())
    }
}

struct FakeRoads(Vec<RoadSegment>);
impl RoadNetworkSource for FakeRoads {
    fn roads_in(&self, _boundary: &MultiPolygon<f64>) -> Result<Vec<RoadSegment>> {
        Ok(self.0.clone())
    }
}

fn feature(ty: ElementType, id: i64, geometry: Geometry<f64>, tags: &[(&str, &str)]) -> Feature {
    let mut f = Feature::new(FeatureId::new(ty, id), geometry);
    for (k, v) in tags {
        f.tags.insert(k.to_string(), v.to_string());
    }
    f
}

/// Boundary: ~1.1 km square near Yekaterinburg.
fn boundary_input() -> PlaceInput {
    PlaceInput::Geometry(Geometry::Polygon(polygon![
        (x: 60.600, y: 56.800), (x: 60.610, y: 56.800),
        (x: 60.610, y: 56.810), (x: 60.600, y: 56.810)
    ]))
}

fn building_footprint() -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: 60.6020, y: 56.8020), (x: 60.6026, y: 56.8020),
        (x: 60.6026, y: 56.8024), (x: 60.6020, y: 56.8024)
    ])
}

fn scenario_features(failing: Vec<TagCategory>) -> FakeFeatures {
    let mut categories = AHashMap::new();

    categories.insert(
        TagCategory::Building,
        vec![feature(
            ElementType::Way,
            1,
            building_footprint(),
            &[
                ("building", "yes"),
                ("building:flats", "20"),
                ("addr:street", "ул Ленина"),
                ("addr:housenumber", "5"),
            ],
        )],
    );

    // School polygon contained in the building footprint.
    categories.insert(
        TagCategory::Amenity,
        vec![feature(
            ElementType::Way,
            2,
            Geometry::Polygon(polygon![
                (x: 60.6021, y: 56.8021), (x: 60.6024, y: 56.8021),
                (x: 60.6024, y: 56.8023), (x: 60.6021, y: 56.8023)
            ]),
            &[("amenity", "school")],
        )],
    );

    // Residential land-use covering the whole boundary.
    categories.insert(
        TagCategory::Landuse,
        vec![feature(
            ElementType::Way,
            3,
            Geometry::Polygon(polygon![
                (x: 60.600, y: 56.800), (x: 60.610, y: 56.800),
                (x: 60.610, y: 56.810), (x: 60.600, y: 56.810)
            ]),
            &[("landuse", "residential"), ("residential", "apartments")],
        )],
    );

    // A shop point inside the building: the only points_inside source.
    categories.insert(
        TagCategory::Shop,
        vec![feature(
            ElementType::Node,
            4,
            Geometry::Point(Point::new(60.6022, 56.8022)),
            &[("shop", "convenience")],
        )],
    );

    FakeFeatures { categories, failing }
}

/// Road ring enclosing the building block.
fn scenario_roads() -> FakeRoads {
    let ring = [
        [(60.601, 56.801), (60.605, 56.801)],
        [(60.605, 56.801), (60.605, 56.805)],
        [(60.605, 56.805), (60.601, 56.805)],
        [(60.601, 56.805), (60.601, 56.801)],
    ];
    FakeRoads(
        ring.iter()
            .map(|pair| RoadSegment {
                highway: String::from("residential"),
                line: LineString(
                    pair.iter().map(|&(x, y)| geo::Coord { x, y }).collect(),
                ),
            })
            .collect(),
    )
}

fn run(registry: Option<&[RegistryRecord]>, options: &EnrichOptions) -> urbanpop::EnrichContext {
    let features = scenario_features(vec![TagCategory::Tourism]);
    let roads = scenario_roads();
    let sources = EnrichSources {
        gazetteer: &NoGazetteer,
        selector: &FirstMatch::default(),
        features: &features,
        roads: &roads,
    };
    enrich_place(&boundary_input(), &sources, registry, options).unwrap()
}

#[test]
fn unit_count_override_wins_over_amenity() {
    let ctx = run(None, &EnrichOptions::default());

    assert_eq!(ctx.buildings.len(), 1);
    let building = &ctx.buildings[0];
    assert_eq!(building.id, FeatureId::new(ElementType::Way, 1));
    // Amenity overrides first, then the unit-count rule wins.
    assert_eq!(building.building, "apartments");
    assert_eq!(building.flats, 20);
    assert_eq!(building.amenity.as_deref(), Some("school"));
}

#[test]
fn school_reaches_the_building_via_the_amenity_join_only() {
    let ctx = run(None, &EnrichOptions::default());
    let building = &ctx.buildings[0];
    // The shop point is inside; the school is not a points_inside source.
    assert_eq!(building.points_inside.as_slice(), ["convenience"]);
}

#[test]
fn district_joins_attach_labels_and_ids() {
    let ctx = run(None, &EnrichOptions::default());
    let building = &ctx.buildings[0];

    assert_eq!(building.landuse.as_deref(), Some("residential"));
    assert_eq!(building.residential.as_deref(), Some("apartments"));
    assert_eq!(building.landuse_district, Some(FeatureId::new(ElementType::Way, 3)));
    assert_eq!(building.transport_district, Some(0));
    assert_eq!(ctx.transport_districts.len(), 1);
}

#[test]
fn areas_are_positive_and_projection_corrected() {
    let ctx = run(None, &EnrichOptions::default());
    let footprint = ctx.buildings[0].footprint_m2;
    // ~37m x ~44m footprint; the corrected area must be in that ballpark,
    // far from the ~3x mercator-inflated figure at 56.8°N.
    assert!(footprint > 500.0 && footprint < 4000.0, "footprint {footprint}");

    assert!(ctx.landuse_districts[0].area_km2 > 0.0);
    assert!(ctx.transport_districts[0].area_km2 > 0.0);
}

#[test]
fn district_aggregation_counts_the_school() {
    let ctx = run(None, &EnrichOptions::default());
    assert_eq!(ctx.landuse_districts[0].schools, 1);
    assert_eq!(ctx.landuse_districts[0].parkings, 0);
}

#[test]
fn failing_category_is_skipped_not_fatal() {
    // Tourism errors in every run; reaching here at all proves the
    // per-category failure stayed non-fatal.
    let ctx = run(None, &EnrichOptions::default());
    assert!(!ctx.buildings.is_empty());
}

#[test]
fn registry_merge_backfills_floor_count() {
    let registry = vec![RegistryRecord {
        address: parse_address(Some("улица Ленина"), Some("5")),
        floor_count: Some(9),
        living_quarters: None,
        area_residential: 4200.5,
    }];
    let ctx = run(Some(&registry), &EnrichOptions::default());
    let building = &ctx.buildings[0];
    assert_eq!(building.levels, 9);
    assert_eq!(building.flats, 20);
    assert!((building.area_residential - 4200.5).abs() < 1e-9);
}

#[test]
fn residential_filter_keeps_the_apartment_building() {
    let options = EnrichOptions { only_residential: true, verbose: 0 };
    let ctx = run(None, &options);
    assert_eq!(ctx.buildings.len(), 1);
    // The residential sub-label normalizes for the filtered set.
    assert_eq!(ctx.buildings[0].residential.as_deref(), Some("urban"));
    assert_eq!(ctx.buildings[0].landuse.as_deref(), Some("urban"));
}

#[test]
fn output_table_serializes_the_final_set() {
    let ctx = run(None, &EnrichOptions::default());
    let csv = write_buildings_csv_string(&ctx.buildings).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("element_type;element_id;building"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("way;1;apartments"));
    assert!(row.contains("POLYGON"));
}
