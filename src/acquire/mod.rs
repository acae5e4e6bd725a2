mod counts;
mod normalize;

pub use counts::normalize_count;
pub use normalize::{normalize_categories, NormalizedSet};

use ahash::AHashMap;
use anyhow::Result;
use geo::MultiPolygon;

use crate::types::{Feature, TagCategory};

/// Source of tagged map features for a boundary.
///
/// Implementations fetch every feature carrying the category's tag whose
/// geometry lies inside (or intersects) the boundary.  An error return is
/// treated as "category absent" by the acquisition loop; it never aborts
/// the pipeline.
pub trait FeatureSource {
    fn features_in(
        &self,
        boundary: &MultiPolygon<f64>,
        category: TagCategory,
    ) -> Result<Vec<Feature>>;
}

/// Fetch every tag category for the boundary, sequentially.
///
/// Per-category failures are logged and skipped; empty categories are
/// omitted from the result so downstream capability checks are simple
/// map-key tests.
pub fn acquire_categories(
    source: &dyn FeatureSource,
    boundary: &MultiPolygon<f64>,
    verbose: u8,
) -> AHashMap<TagCategory, Vec<Feature>> {
    let mut categories = AHashMap::new();
    for category in TagCategory::ALL {
        match source.features_in(boundary, category) {
            Ok(features) if !features.is_empty() => {
                if verbose > 0 {
                    eprintln!("[acquire] {category}: {} features", features.len());
                }
                categories.insert(category, features);
            }
            Ok(_) => {
                if verbose > 0 {
                    eprintln!("[acquire] {category}: no features");
                }
            }
            Err(err) => {
                if verbose > 0 {
                    eprintln!("[acquire] {category}: unavailable ({err:#})");
                }
            }
        }
    }
    categories
}
