//! Per-district feature vectors for the external land-use predictor, and
//! the predictor interfaces themselves.  Models are black boxes: tabular
//! features in, a label or count out, no side effects visible here.

use ahash::AHashMap;
use anyhow::Result;

use crate::types::{Building, District, DistrictKey};

/// The fixed feature vector describing one district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictFeatures {
    pub key: DistrictKey,
    pub median_levels: f64,
    pub median_footprint_m2: f64,
    /// Share of buildings labelled apartments, rounded to 2 decimals.
    pub apartments_rate: f64,
    pub schools: u32,
    pub kindergartens: u32,
    pub playgrounds: u32,
    pub parkings: u32,
    /// Buildings per km², or -1 for a zero-area district.
    pub building_density: f64,
}

/// External land-use classifier: feature vector in, categorical label out.
pub trait LanduseModel {
    fn predict(&self, features: &DistrictFeatures) -> Result<String>;
}

/// External population regressor: one building record in, a count out.
pub trait PopulationModel {
    fn predict(&self, building: &Building) -> Result<f64>;
}

/// Aggregate the joined building set into one feature vector per district.
///
/// Membership follows the join keys attached to the buildings: land-use
/// districts collect by feature identity, transport districts by synthetic
/// id.  A district with no member buildings keeps zero medians and rate.
pub fn extract_district_features(
    districts: &[District],
    buildings: &[Building],
) -> Vec<DistrictFeatures> {
    districts
        .iter()
        .map(|district| {
            let members: Vec<&Building> = buildings
                .iter()
                .filter(|b| match district.key {
                    DistrictKey::Landuse(id) => b.landuse_district == Some(id),
                    DistrictKey::Transport(id) => b.transport_district == Some(id),
                })
                .collect();

            let total = members.len();
            let apartments = members
                .iter()
                .filter(|b| b.building.contains("apartments"))
                .count();

            DistrictFeatures {
                key: district.key,
                median_levels: median(members.iter().map(|b| b.levels as f64)),
                median_footprint_m2: median(members.iter().map(|b| b.footprint_m2)),
                apartments_rate: if total == 0 {
                    0.0
                } else {
                    round2(apartments as f64 / total as f64)
                },
                schools: district.schools,
                kindergartens: district.kindergartens,
                playgrounds: district.playgrounds,
                parkings: district.parkings,
                building_density: if district.area_km2 == 0.0 {
                    -1.0
                } else {
                    total as f64 / district.area_km2
                },
            }
        })
        .collect()
}

/// Fill missing building land-use labels from the predicted label of the
/// building's district.  Buildings that already carry a label keep it.
pub fn backfill_landuse(
    buildings: &mut [Building],
    features: &[DistrictFeatures],
    model: &dyn LanduseModel,
) -> Result<()> {
    let mut predicted: AHashMap<DistrictKey, String> = AHashMap::new();
    for feature in features {
        predicted.insert(feature.key, model.predict(feature)?);
    }

    for building in buildings.iter_mut() {
        if building.landuse.is_some() {
            continue;
        }
        let label = building
            .transport_district
            .and_then(|id| predicted.get(&DistrictKey::Transport(id)))
            .or_else(|| {
                building
                    .landuse_district
                    .and_then(|id| predicted.get(&DistrictKey::Landuse(id)))
            });
        if let Some(label) = label {
            building.landuse = Some(label.clone());
        }
    }
    Ok(())
}

/// Run the external population regressor over the final building set.
pub fn estimate_population(
    buildings: &[Building],
    model: &dyn PopulationModel,
) -> Result<Vec<f64>> {
    buildings.iter().map(|b| model.predict(b)).collect()
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
