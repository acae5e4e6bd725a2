//! Rule-based building classification.
//!
//! A deterministic, ordered chain of per-record rules; each rule may
//! override the previous stage's output, never the reverse.  The order is
//! load-bearing: context evidence (amenity, land-use) must be applied
//! before the multi-unit override, otherwise a school building carrying a
//! stale "apartments" tag would be misclassified.

use crate::types::Building;

/// Final labels considered residential.
pub const RESIDENTIAL_LABELS: [&str; 6] =
    ["house", "detached", "apartments", "residential", "dormitory", "yes"];

/// Land-use labels too generic to override a building label.
const GENERIC_LANDUSE: [&str; 3] = ["non-residential", "residential", "allotments"];

/// Rule 1: surrounding context overrides the raw tag.  An amenity wins
/// outright; a specific (non-generic) land-use label wins otherwise.
pub fn override_by_context(building: &mut Building) {
    if let Some(amenity) = &building.amenity {
        building.building = amenity.clone();
    } else if let Some(landuse) = &building.landuse {
        if !GENERIC_LANDUSE.contains(&landuse.as_str()) {
            building.building = landuse.clone();
        }
    }
}

/// Rule 2: rural land-use or an explicit detached tag marks a private house.
pub fn detect_private_houses(building: &mut Building) {
    if building.landuse.as_deref() == Some("rural") || building.building == "detached" {
        building.building = String::from("house");
    }
}

/// Rule 3: multi-unit evidence always wins over geometry-derived hints.
pub fn detect_apartments(building: &mut Building) {
    if building.flats > 0 || building.area_residential > 0.0 {
        building.building = String::from("apartments");
    }
}

/// Run the full rule chain over one record, in its fixed order.
pub fn classify(building: &mut Building) {
    override_by_context(building);
    detect_private_houses(building);
    detect_apartments(building);
}

/// Optional residential filter: keep only buildings whose final label is
/// residential, normalize the `residential` sub-label, and backfill a
/// generic `landuse == "residential"` from it.
pub fn retain_residential(buildings: Vec<Building>) -> Vec<Building> {
    buildings
        .into_iter()
        .filter(|b| RESIDENTIAL_LABELS.contains(&b.building.as_str()))
        .map(|mut b| {
            b.residential = b.residential.map(|label| match label.as_str() {
                "apartments" => String::from("urban"),
                "gated" => String::from("rural"),
                _ => label,
            });
            if b.landuse.as_deref() == Some("residential") {
                if let Some(residential) = &b.residential {
                    b.landuse = Some(residential.clone());
                }
            }
            b
        })
        .collect()
}
