use geo::Geometry;
use smallvec::SmallVec;

use super::FeatureId;

/// The central record of the pipeline: one row per unique building feature,
/// created at normalization time and progressively enriched by every later
/// stage.  Exactly one component owns the building set at any time.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: FeatureId,
    /// Footprint in geographic coordinates (WGS84 lon/lat).
    pub geometry: Geometry<f64>,

    /// Current classification label; starts as the raw `building` tag value
    /// and is rewritten by the rule chain.
    pub building: String,
    /// Floor count after tolerant numeric coercion (0 when untagged).
    pub levels: u32,
    /// Unit count after tolerant numeric coercion (0 when untagged).
    pub flats: u32,

    pub street: Option<String>,
    pub housenumber: Option<String>,

    /// Footprint area in m², projection-corrected.
    pub footprint_m2: f64,

    /// First amenity feature whose shape intersects the footprint.
    pub amenity: Option<String>,
    /// Unordered labels of point features contained in the footprint.
    pub points_inside: SmallVec<[String; 4]>,

    /// Land-use label attached from the enclosing land-use district.
    pub landuse: Option<String>,
    /// Residential sub-label from the enclosing land-use district.
    pub residential: Option<String>,
    /// Key of the enclosing land-use district, when any.
    pub landuse_district: Option<FeatureId>,
    /// Synthetic id of the enclosing transport district, when any.
    pub transport_district: Option<u32>,

    /// Registry-sourced residential floor area in m² (0 when unknown).
    pub area_residential: f64,
}

impl Building {
    pub fn new(id: FeatureId, geometry: Geometry<f64>) -> Self {
        Self {
            id,
            geometry,
            building: String::from("yes"),
            levels: 0,
            flats: 0,
            street: None,
            housenumber: None,
            footprint_m2: 0.0,
            amenity: None,
            points_inside: SmallVec::new(),
            landuse: None,
            residential: None,
            landuse_district: None,
            transport_district: None,
            area_residential: 0.0,
        }
    }
}
