//! Loading the external building registry: a delimited table per region
//! with authoritative floor counts, unit counts and residential areas.

use std::{fs::File, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, DataType}};
use walkdir::WalkDir;

use crate::acquire::normalize_count;

use super::{parse_address, ParsedAddress};

/// One registry row, keyed by its normalized address.
#[derive(Debug, Clone)]
pub struct RegistryRecord {
    pub address: ParsedAddress,
    /// Reported floor count, when the row carries one.
    pub floor_count: Option<u32>,
    /// Reported living-quarters count, when the row carries one.
    pub living_quarters: Option<u32>,
    /// Reported residential area in m² (0 when unknown).
    pub area_residential: f64,
}

/// Load the registry for a place: pick the file in `dir` whose name
/// contains the region, read it, keep the rows for the formal city name,
/// and normalize their address keys with the same rules the OSM side uses.
///
/// No file matching the region is fatal for this place; batch callers skip
/// the place and continue.
pub fn load_registry(dir: &Path, city: &str, region: &str, verbose: u8) -> Result<Vec<RegistryRecord>> {
    let path = find_region_file(dir, region)?;
    if verbose > 0 {
        eprintln!("[address::registry] reading {}", path.display());
    }

    let file = File::open(&path)
        .with_context(|| format!("[address::registry] Failed to open {}", path.display()))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[address::registry] Failed to read {}", path.display()))?;

    let cities = text_column(&df, "formalname_city")?;
    let streets = text_column(&df, "formalname_street")?;
    let numbers = text_column(&df, "house_number")?;
    let floors = text_column(&df, "floor_count_max")?;
    let quarters = text_column(&df, "living_quarters_count")?;
    let areas = text_column(&df, "area_residential")?;
    // Block / building-index / letter columns are optional per source file.
    let blocks = optional_text_column(&df, "block");
    let indexes = optional_text_column(&df, "building");
    let letters = optional_text_column(&df, "letter");

    let mut records = Vec::new();
    for row in 0..df.height() {
        if cities[row].as_deref() != Some(city) {
            continue;
        }

        let mut address = parse_address(streets[row].as_deref(), numbers[row].as_deref());
        if let Some(block) = cell(&blocks, row) {
            address.block = block;
        }
        if let Some(index) = cell(&indexes, row) {
            address.building_index = index;
        }
        if let Some(letter) = cell(&letters, row) {
            address.letter = letter;
        }

        records.push(RegistryRecord {
            address,
            floor_count: floors[row].as_deref().map(|v| normalize_count(Some(v))),
            living_quarters: quarters[row].as_deref().map(|v| normalize_count(Some(v))),
            area_residential: parse_area(areas[row].as_deref()),
        });
    }

    if verbose > 0 {
        eprintln!("[address::registry] {} records for {city}", records.len());
    }
    Ok(records)
}

/// The registry file for a region is the first one in `dir` whose file
/// name contains the region name.
fn find_region_file(dir: &Path, region: &str) -> Result<PathBuf> {
    let mut entries: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    entries.sort();

    entries
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(region))
        })
        .ok_or_else(|| {
            anyhow!(
                "[address::registry] No registry file for region {region:?} in {}",
                dir.display()
            )
        })
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .with_context(|| format!("[address::registry] Missing column: {name}"))?
        .cast(&DataType::String)
        .with_context(|| format!("[address::registry] Column {name} is not text-convertible"))?;
    Ok(series
        .str()
        .with_context(|| format!("[address::registry] Column {name} is not a string column"))?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn optional_text_column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    text_column(df, name).unwrap_or_default()
}

fn cell(column: &[Option<String>], row: usize) -> Option<String> {
    column
        .get(row)
        .and_then(|value| value.clone())
        .filter(|value| !value.trim().is_empty())
}

/// Residential areas arrive with decimal commas and occasional blanks.
fn parse_area(value: Option<&str>) -> f64 {
    value
        .map(|v| v.trim().replace(',', "."))
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}
