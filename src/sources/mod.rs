mod cache;
mod nominatim;
mod overpass;

pub use cache::FetchCache;
pub use nominatim::NominatimClient;
pub use overpass::OverpassClient;
