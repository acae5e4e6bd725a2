mod area;
mod repair;
mod wkt;

pub use area::corrected_areas;
pub use repair::make_valid;
pub use wkt::{parse_wkt, to_wkt};
