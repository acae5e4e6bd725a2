use ahash::AHashMap;
use geo::Geometry;

use super::FeatureId;

/// One tagged map feature: a point, way or relation with geometry and the
/// raw tag map it was fetched with.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry<f64>,
    pub tags: AHashMap<String, String>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry<f64>) -> Self {
        Self { id, geometry, tags: AHashMap::new() }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// True for polygonal geometry (footprints, district shapes).
    pub fn is_areal(&self) -> bool {
        matches!(self.geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }
}
