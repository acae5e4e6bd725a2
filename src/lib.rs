#![doc = "Urbanpop public API"]
pub mod acquire;
pub mod address;
pub mod classify;
pub mod districts;
pub mod enrich;
pub mod features;
pub mod geometry;
pub mod io;
pub mod join;
pub mod place;
pub mod sources;
pub mod types;

#[doc(inline)]
pub use enrich::{enrich_place, EnrichContext, EnrichOptions, EnrichSources};

#[doc(inline)]
pub use types::{Building, District, DistrictKey, ElementType, Feature, FeatureId, TagCategory};

#[doc(inline)]
pub use place::PlaceInput;
