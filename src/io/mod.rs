//! IO module for format-specific writing operations.
//!
//! The pipeline's only persisted artifact is the per-place building table;
//! everything else crosses the boundary as records in memory.

mod csv;

pub use csv::{write_buildings_csv, write_buildings_csv_string};
