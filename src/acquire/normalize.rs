use ahash::{AHashMap, AHashSet};

use crate::types::{Building, ElementType, Feature, TagCategory};

use super::normalize_count;

/// Output of the normalization stage: heterogeneous per-tag tables reduced
/// to a common shape, with the side tables split out of their categories.
///
/// Side tables feed the district aggregation and the dedicated amenity
/// join; they never flow into the per-category `points_inside` join.
#[derive(Debug, Default)]
pub struct NormalizedSet {
    /// One record per unique building feature (ways and relations only).
    pub buildings: Vec<Building>,
    /// Categories whose tag values accumulate into `points_inside`.
    pub point_sources: Vec<(TagCategory, Vec<Feature>)>,
    /// Amenity features with `amenity == "parking"`.
    pub parkings: Vec<Feature>,
    /// Leisure features with `leisure == "playground"`.
    pub playgrounds: Vec<Feature>,
    /// Every amenity feature, point or areal.
    pub amenities: Vec<Feature>,
    /// Land-use features reduced to id, geometry and the two labels.
    pub landuse: Vec<Feature>,
}

/// Normalize the acquired per-tag tables.
///
/// Deduplicates by `(element_type, element_id)` within each category, drops
/// point-only building features (a node tagged `building` has no footprint),
/// coerces numeric-like tag text, and extracts the side tables.
pub fn normalize_categories(
    mut categories: AHashMap<TagCategory, Vec<Feature>>,
) -> NormalizedSet {
    let mut set = NormalizedSet::default();

    for category in TagCategory::ALL {
        let Some(features) = categories.remove(&category) else { continue };
        let features = dedupe(features);

        match category {
            TagCategory::Building => {
                set.buildings = features.into_iter().filter_map(into_building).collect();
            }
            TagCategory::Amenity => {
                set.parkings = features
                    .iter()
                    .filter(|f| f.tag("amenity") == Some("parking"))
                    .cloned()
                    .collect();
                set.amenities = features;
            }
            TagCategory::Landuse => {
                set.landuse = features.into_iter().map(reduce_landuse).collect();
            }
            TagCategory::Leisure => {
                set.playgrounds = features
                    .iter()
                    .filter(|f| f.tag("leisure") == Some("playground"))
                    .cloned()
                    .collect();
                set.point_sources.push((category, features));
            }
            _ => set.point_sources.push((category, features)),
        }
    }

    set
}

/// Collapse duplicate `(element_type, element_id)` keys to the first record.
fn dedupe(features: Vec<Feature>) -> Vec<Feature> {
    let mut seen = AHashSet::with_capacity(features.len());
    features.into_iter().filter(|f| seen.insert(f.id)).collect()
}

/// A building must carry a footprint: ways and relations qualify, nodes do
/// not.
fn into_building(feature: Feature) -> Option<Building> {
    if feature.id.element_type == ElementType::Node {
        return None;
    }
    let mut building = Building::new(feature.id, feature.geometry);
    if let Some(label) = feature.tags.get("building") {
        building.building = label.clone();
    }
    building.levels = normalize_count(feature.tags.get("building:levels").map(String::as_str));
    building.flats = normalize_count(feature.tags.get("building:flats").map(String::as_str));
    building.street = feature.tags.get("addr:street").cloned();
    building.housenumber = feature.tags.get("addr:housenumber").cloned();
    Some(building)
}

/// Land-use records only contribute geometry and the two labels downstream.
fn reduce_landuse(feature: Feature) -> Feature {
    let mut reduced = Feature::new(feature.id, feature.geometry);
    for key in ["landuse", "residential"] {
        if let Some(value) = feature.tags.get(key) {
            reduced.tags.insert(key.to_string(), value.clone());
        }
    }
    reduced
}
