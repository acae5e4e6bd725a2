//! CSV writing operations for the final per-building record set.

use std::path::Path;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};
use tempfile::NamedTempFile;

use crate::geometry::to_wkt;
use crate::types::Building;

/// Write one semicolon-separated row per building: identity, geometry as
/// WKT, classification and the joined district/registry attributes.
///
/// The write is atomic: a temp file in the target directory is renamed
/// over `path` only after the table is fully serialized.
pub fn write_buildings_csv(buildings: &[Building], path: &Path) -> Result<()> {
    let mut df = buildings_frame(buildings)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .context("[io::csv] Failed to create temp file")?;
    CsvWriter::new(&mut tmp)
        .with_separator(b';')
        .finish(&mut df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("[io::csv] Failed to persist {}", path.display()))?;
    Ok(())
}

/// Serialize the building table to a CSV string (for tests and callers
/// that stream elsewhere).
pub fn write_buildings_csv_string(buildings: &[Building]) -> Result<String> {
    let mut df = buildings_frame(buildings)?;
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .with_separator(b';')
        .finish(&mut df)
        .context("[io::csv] Failed to write CSV to string")?;
    String::from_utf8(buffer).context("[io::csv] CSV output is not valid UTF-8")
}

fn buildings_frame(buildings: &[Building]) -> Result<DataFrame> {
    let element_types: Vec<String> =
        buildings.iter().map(|b| b.id.element_type.to_string()).collect();
    let element_ids: Vec<i64> = buildings.iter().map(|b| b.id.element_id).collect();
    let labels: Vec<String> = buildings.iter().map(|b| b.building.clone()).collect();
    let levels: Vec<u32> = buildings.iter().map(|b| b.levels).collect();
    let flats: Vec<u32> = buildings.iter().map(|b| b.flats).collect();
    let streets: Vec<Option<String>> = buildings.iter().map(|b| b.street.clone()).collect();
    let numbers: Vec<Option<String>> = buildings.iter().map(|b| b.housenumber.clone()).collect();
    let footprints: Vec<f64> = buildings.iter().map(|b| b.footprint_m2).collect();
    let amenities: Vec<Option<String>> = buildings.iter().map(|b| b.amenity.clone()).collect();
    let points: Vec<String> = buildings.iter().map(|b| b.points_inside.join(",")).collect();
    let landuses: Vec<Option<String>> = buildings.iter().map(|b| b.landuse.clone()).collect();
    let residentials: Vec<Option<String>> =
        buildings.iter().map(|b| b.residential.clone()).collect();
    let districts: Vec<Option<u32>> = buildings.iter().map(|b| b.transport_district).collect();
    let areas: Vec<f64> = buildings.iter().map(|b| b.area_residential).collect();
    let geometries: Vec<String> = buildings
        .iter()
        .map(|b| to_wkt(&b.geometry))
        .collect::<Result<Vec<_>>>()?;

    DataFrame::new(vec![
        Series::new("element_type".into(), element_types).into(),
        Series::new("element_id".into(), element_ids).into(),
        Series::new("building".into(), labels).into(),
        Series::new("building:levels".into(), levels).into(),
        Series::new("building:flats".into(), flats).into(),
        Series::new("addr:street".into(), streets).into(),
        Series::new("addr:housenumber".into(), numbers).into(),
        Series::new("footprint_m2".into(), footprints).into(),
        Series::new("amenity".into(), amenities).into(),
        Series::new("points_inside".into(), points).into(),
        Series::new("landuse".into(), landuses).into(),
        Series::new("residential".into(), residentials).into(),
        Series::new("district_id".into(), districts).into(),
        Series::new("area_residential".into(), areas).into(),
        Series::new("geometry".into(), geometries).into(),
    ])
    .context("[io::csv] Failed to assemble building table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, FeatureId};
    use geo::{polygon, Geometry};

    fn building() -> Building {
        let mut b = Building::new(
            FeatureId::new(ElementType::Way, 42),
            Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)
            ]),
        );
        b.building = String::from("apartments");
        b.levels = 9;
        b.flats = 72;
        b.points_inside.push(String::from("convenience"));
        b.points_inside.push(String::from("hairdresser"));
        b.transport_district = Some(3);
        b
    }

    #[test]
    fn header_and_row_are_semicolon_separated() {
        let csv = write_buildings_csv_string(&[building()]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("element_type;element_id;building;"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("way;42;apartments;9;72;"));
        assert!(row.contains("convenience,hairdresser"));
        assert!(row.contains("POLYGON"));
    }

    #[test]
    fn atomic_write_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("place.csv");
        write_buildings_csv(&[building()], &path).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("way;42"));
    }
}
