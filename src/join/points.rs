use geo::Intersects;

use crate::types::{Building, ElementType, Feature, TagCategory};

use super::ShapeIndex;

/// Point-in-building enrichment.
///
/// Every feature of the point-source categories is related to the building
/// footprints containing it; matching tag values accumulate into each
/// building's unordered `points_inside` list.  Sentinel `"yes"` values carry
/// no classification signal and are skipped.  The building set itself is
/// never grown or shrunk: a building without matches simply keeps an empty
/// list.
pub fn attach_points_inside(
    buildings: &mut [Building],
    point_sources: &[(TagCategory, Vec<Feature>)],
) {
    let index = ShapeIndex::build(buildings.iter().map(|b| &b.geometry));

    for (category, features) in point_sources {
        for feature in features {
            let Some(label) = feature.tag(category.key()) else { continue };
            if label == "yes" {
                continue;
            }
            for idx in index.candidates(&feature.geometry) {
                if buildings[idx].geometry.intersects(&feature.geometry) {
                    buildings[idx].points_inside.push(label.to_string());
                }
            }
        }
    }
}

/// Left spatial join of buildings against areal amenity features: the first
/// matching amenity labels the building, later matches are dropped (the
/// accepted first-match approximation).  Point amenities stay out of this
/// join; they only feed the district aggregation.
pub fn attach_amenities(buildings: &mut [Building], amenities: &[Feature]) {
    let index = ShapeIndex::build(buildings.iter().map(|b| &b.geometry));

    for feature in amenities {
        if feature.id.element_type == ElementType::Node {
            continue;
        }
        let Some(label) = feature.tag("amenity") else { continue };
        for idx in index.candidates(&feature.geometry) {
            let building = &mut buildings[idx];
            if building.amenity.is_none() && building.geometry.intersects(&feature.geometry) {
                building.amenity = Some(label.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureId;
    use geo::{polygon, Geometry, Point};

    fn building(id: i64, x0: f64) -> Building {
        Building::new(
            FeatureId::new(ElementType::Way, id),
            Geometry::Polygon(polygon![
                (x: x0, y: 0.0), (x: x0 + 1.0, y: 0.0),
                (x: x0 + 1.0, y: 1.0), (x: x0, y: 1.0)
            ]),
        )
    }

    fn point_feature(id: i64, x: f64, y: f64, key: &str, value: &str) -> Feature {
        let mut f = Feature::new(
            FeatureId::new(ElementType::Node, id),
            Geometry::Point(Point::new(x, y)),
        );
        f.tags.insert(key.to_string(), value.to_string());
        f
    }

    #[test]
    fn labels_accumulate_per_containing_building() {
        let mut buildings = vec![building(1, 0.0), building(2, 5.0)];
        let sources = vec![(
            TagCategory::Shop,
            vec![
                point_feature(10, 0.5, 0.5, "shop", "convenience"),
                point_feature(11, 0.6, 0.6, "shop", "bakery"),
                point_feature(12, 9.0, 9.0, "shop", "farout"),
            ],
        )];

        attach_points_inside(&mut buildings, &sources);

        assert_eq!(buildings[0].points_inside.as_slice(), ["convenience", "bakery"]);
        assert!(buildings[1].points_inside.is_empty());
        assert_eq!(buildings.len(), 2);
    }

    #[test]
    fn sentinel_yes_is_filtered() {
        let mut buildings = vec![building(1, 0.0)];
        let sources = vec![(
            TagCategory::Tourism,
            vec![point_feature(10, 0.5, 0.5, "tourism", "yes")],
        )];
        attach_points_inside(&mut buildings, &sources);
        assert!(buildings[0].points_inside.is_empty());
    }

    #[test]
    fn first_amenity_wins_and_nodes_are_ignored() {
        let mut buildings = vec![building(1, 0.0)];

        let mut school = Feature::new(
            FeatureId::new(ElementType::Way, 20),
            Geometry::Polygon(polygon![
                (x: 0.2, y: 0.2), (x: 0.8, y: 0.2), (x: 0.8, y: 0.8), (x: 0.2, y: 0.8)
            ]),
        );
        school.tags.insert("amenity".into(), "school".into());

        let mut clinic = school.clone();
        clinic.id = FeatureId::new(ElementType::Way, 21);
        clinic.tags.insert("amenity".into(), "clinic".into());

        let node = point_feature(22, 0.5, 0.5, "amenity", "cafe");

        attach_amenities(&mut buildings, &[node, school, clinic]);
        assert_eq!(buildings[0].amenity.as_deref(), Some("school"));
    }
}
