use std::fmt;

use geo::Geometry;

use super::FeatureId;

/// Identity of a district polygon.
///
/// Land-use districts keep the identity of the underlying land-use feature;
/// transport districts are a derived partition with a synthetic sequential
/// id and no stable identity across re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistrictKey {
    Landuse(FeatureId),
    Transport(u32),
}

impl fmt::Display for DistrictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistrictKey::Landuse(id) => write!(f, "landuse:{id}"),
            DistrictKey::Transport(id) => write!(f, "district:{id}"),
        }
    }
}

/// A district polygon with its aggregated point-of-interest counts.
#[derive(Debug, Clone)]
pub struct District {
    pub key: DistrictKey,
    pub geometry: Geometry<f64>,
    pub landuse: Option<String>,
    pub residential: Option<String>,
    /// Distinct matching POI counts, not raw join-row counts.
    pub parkings: u32,
    pub playgrounds: u32,
    pub schools: u32,
    pub kindergartens: u32,
    pub area_km2: f64,
}

impl District {
    pub fn new(key: DistrictKey, geometry: Geometry<f64>) -> Self {
        Self {
            key,
            geometry,
            landuse: None,
            residential: None,
            parkings: 0,
            playgrounds: 0,
            schools: 0,
            kindergartens: 0,
            area_km2: 0.0,
        }
    }
}
