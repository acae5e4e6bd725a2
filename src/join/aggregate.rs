use geo::Intersects;

use crate::acquire::NormalizedSet;
use crate::types::{Building, District, DistrictKey, Feature};

use super::ShapeIndex;

/// Build land-use districts from the normalized land-use features, keeping
/// the identity of the underlying feature as the district key.
pub fn landuse_districts(landuse: &[Feature]) -> Vec<District> {
    landuse
        .iter()
        .map(|feature| {
            let mut district = District::new(DistrictKey::Landuse(feature.id), feature.geometry.clone());
            district.landuse = feature.tag("landuse").map(str::to_string);
            district.residential = feature.tag("residential").map(str::to_string);
            district
        })
        .collect()
}

/// Attach POI density inputs to a set of district polygons: parking,
/// playground, school and kindergarten counts.
///
/// Counts are distinct-match counts: each POI record increments a district
/// at most once however its geometry overlaps, never the inflated row count
/// a one-to-many join would produce.  Districts are pre-deduplicated, so
/// geometry and labels stay as built.
pub fn aggregate_district_pois(districts: &mut [District], set: &NormalizedSet) {
    let index = ShapeIndex::build(districts.iter().map(|d| &d.geometry));

    let schools: Vec<&Feature> = set
        .amenities
        .iter()
        .filter(|f| f.tag("amenity") == Some("school"))
        .collect();
    let kindergartens: Vec<&Feature> = set
        .amenities
        .iter()
        .filter(|f| f.tag("amenity") == Some("kindergarten"))
        .collect();

    count_into(districts, &index, set.parkings.iter(), |d| &mut d.parkings);
    count_into(districts, &index, set.playgrounds.iter(), |d| &mut d.playgrounds);
    count_into(districts, &index, schools.iter().copied(), |d| &mut d.schools);
    count_into(districts, &index, kindergartens.iter().copied(), |d| &mut d.kindergartens);
}

fn count_into<'a>(
    districts: &mut [District],
    index: &ShapeIndex,
    features: impl Iterator<Item = &'a Feature>,
    field: impl Fn(&mut District) -> &mut u32,
) {
    for feature in features {
        for idx in index.candidates(&feature.geometry) {
            if districts[idx].geometry.intersects(&feature.geometry) {
                *field(&mut districts[idx]) += 1;
            }
        }
    }
}

/// Left spatial join of buildings into a district set.
///
/// Every building keeps its identity; a building overlapping more than one
/// district polygon keeps the first match only (boundary ambiguity is an
/// accepted approximation).  Land-use districts contribute their labels and
/// key, transport districts their synthetic id.
pub fn join_buildings_to_districts(buildings: &mut [Building], districts: &[District]) {
    let index = ShapeIndex::build(districts.iter().map(|d| &d.geometry));

    for building in buildings.iter_mut() {
        let matched = index
            .candidates(&building.geometry)
            .into_iter()
            .filter(|&idx| districts[idx].geometry.intersects(&building.geometry))
            .min();
        let Some(idx) = matched else { continue };
        let district = &districts[idx];
        match district.key {
            DistrictKey::Landuse(id) => {
                building.landuse_district = Some(id);
                building.landuse = district.landuse.clone();
                building.residential = district.residential.clone();
            }
            DistrictKey::Transport(id) => {
                building.transport_district = Some(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, FeatureId};
    use geo::{polygon, Geometry, Point};

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size)
        ])
    }

    fn poi(id: i64, x: f64, y: f64, key: &str, value: &str) -> Feature {
        let mut f = Feature::new(
            FeatureId::new(ElementType::Node, id),
            Geometry::Point(Point::new(x, y)),
        );
        f.tags.insert(key.to_string(), value.to_string());
        f
    }

    #[test]
    fn poi_counts_are_distinct_matches() {
        let mut districts = vec![District::new(DistrictKey::Transport(0), square(0.0, 0.0, 10.0))];

        let mut set = NormalizedSet::default();
        // Two real playgrounds; a third duplicate of the first was collapsed
        // at normalization, so only distinct records arrive here.
        set.playgrounds = vec![
            poi(1, 2.0, 2.0, "leisure", "playground"),
            poi(2, 7.0, 7.0, "leisure", "playground"),
        ];
        set.amenities = vec![
            poi(3, 1.0, 1.0, "amenity", "school"),
            poi(4, 50.0, 50.0, "amenity", "kindergarten"),
        ];

        aggregate_district_pois(&mut districts, &set);

        assert_eq!(districts[0].playgrounds, 2);
        assert_eq!(districts[0].schools, 1);
        assert_eq!(districts[0].kindergartens, 0);
        assert_eq!(districts[0].parkings, 0);
    }

    #[test]
    fn buildings_join_first_district_and_keep_identity() {
        let mut landuse_feature = Feature::new(
            FeatureId::new(ElementType::Way, 100),
            square(0.0, 0.0, 10.0),
        );
        landuse_feature.tags.insert("landuse".into(), "residential".into());
        landuse_feature.tags.insert("residential".into(), "apartments".into());
        let districts = landuse_districts(&[landuse_feature]);

        let mut buildings = vec![Building::new(
            FeatureId::new(ElementType::Way, 1),
            square(1.0, 1.0, 2.0),
        )];
        join_buildings_to_districts(&mut buildings, &districts);

        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].id, FeatureId::new(ElementType::Way, 1));
        assert_eq!(buildings[0].landuse.as_deref(), Some("residential"));
        assert_eq!(buildings[0].residential.as_deref(), Some("apartments"));
        assert_eq!(
            buildings[0].landuse_district,
            Some(FeatureId::new(ElementType::Way, 100))
        );
    }

    #[test]
    fn overlapping_districts_keep_first_match_only() {
        let districts = vec![
            District::new(DistrictKey::Transport(0), square(0.0, 0.0, 5.0)),
            District::new(DistrictKey::Transport(1), square(4.0, 0.0, 5.0)),
        ];
        // Straddles the shared wall of both districts.
        let mut buildings = vec![Building::new(
            FeatureId::new(ElementType::Way, 1),
            square(3.5, 1.0, 1.0),
        )];
        join_buildings_to_districts(&mut buildings, &districts);
        assert_eq!(buildings[0].transport_district, Some(0));
    }
}
