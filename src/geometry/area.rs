use anyhow::{anyhow, Context, Result};
use geo::{Area, Centroid, Geometry, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use super::make_valid;

/// PROJ.4 string for the source geographic CRS (WGS84 lon/lat).
const GEOGRAPHIC: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// PROJ.4 string for EPSG:3857 web mercator, the fixed planar reference the
/// record set is measured in.
const MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 \
                        +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs +type=crs";

/// Compute a planar area in m² for every geometry of a record set.
///
/// Polygonal geometry is repaired, reprojected to web mercator and measured;
/// the raw planar area is corrected by cos²(φ) of the latitude of the first
/// polygonal member's centroid.  One correction factor serves the whole set:
/// all geometries are assumed to lie within a small local area where the
/// factor does not vary meaningfully, so this is an approximation, not a
/// geodetic area.  Non-polygonal geometry measures 0.
///
/// The input is never mutated; callers keep their geographic coordinates.
pub fn corrected_areas<'a>(
    geoms: impl IntoIterator<Item = &'a Geometry<f64>>,
) -> Result<Vec<f64>> {
    let geoms: Vec<&Geometry<f64>> = geoms.into_iter().collect();

    let Some(representative) = geoms.iter().find(|g| is_areal(g)) else {
        // No polygonal member: every area is zero by definition.
        return Ok(vec![0.0; geoms.len()]);
    };
    let latitude = representative
        .centroid()
        .ok_or_else(|| anyhow!("[geometry::area] Representative geometry has no centroid"))?
        .y();
    let correction = latitude.to_radians().cos().powi(2);

    let from = Proj4::from_proj_string(GEOGRAPHIC)
        .with_context(|| format!("[geometry::area] failed to build source PROJ.4: {GEOGRAPHIC}"))?;
    let to = Proj4::from_proj_string(MERCATOR)
        .with_context(|| format!("[geometry::area] failed to build target PROJ.4: {MERCATOR}"))?;

    Ok(geoms
        .iter()
        .map(|geometry| {
            if !is_areal(geometry) {
                return 0.0;
            }
            // Degrees → radians in, mercator meters out.
            let projected = make_valid(geometry).map_coords(|coord| {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
                transform(&from, &to, &mut point).expect("CRS transform failed");
                geo::Coord { x: point.0, y: point.1 }
            });
            projected.unsigned_area() * correction
        })
        .collect())
}

fn is_areal(geometry: &Geometry<f64>) -> bool {
    matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
}
