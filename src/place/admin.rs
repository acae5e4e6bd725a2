use anyhow::{anyhow, Result};
use geo::{Centroid, MultiPolygon};

/// One enclosing administrative or place area at a point.
#[derive(Debug, Clone)]
pub struct AdminArea {
    pub name: String,
    /// OSM `admin_level`, when the area carries one.
    pub admin_level: Option<u8>,
    /// True when the area is tagged as a populated place.
    pub is_place: bool,
}

/// Reverse lookup of the areas enclosing a coordinate.
pub trait AdminLookup {
    fn areas_at(&self, lon: f64, lat: f64) -> Result<Vec<AdminArea>>;
}

/// Derive `(city, region)` names for a boundary from the areas enclosing
/// its centroid.  The region is the `admin_level == 4` area, the city the
/// place-tagged area; either may be absent.
pub fn city_and_region(
    boundary: &MultiPolygon<f64>,
    lookup: &dyn AdminLookup,
) -> Result<(Option<String>, Option<String>)> {
    let centroid = boundary
        .centroid()
        .ok_or_else(|| anyhow!("[place::admin] Boundary has no centroid"))?;
    let areas = lookup.areas_at(centroid.x(), centroid.y())?;

    let mut city = None;
    let mut region = None;
    for area in areas {
        if area.admin_level == Some(4) {
            region = Some(area.name.clone());
        }
        if area.is_place {
            city = Some(area.name.clone());
        }
    }

    Ok((
        city.map(|name| clean_locality_name(&name, "Городской")),
        region.map(|name| clean_locality_name(&name, "Республика")),
    ))
}

/// Strip quote glyphs, lowercase words and the generic `drop` token from a
/// multi-word locality name, keeping the proper-noun core used in registry
/// file names ("Свердловская область" → "Свердловская").
fn clean_locality_name(name: &str, drop: &str) -> String {
    if !name.contains(' ') {
        return name.to_string();
    }
    name.split_whitespace()
        .map(|word| word.replace(['«', '»'], ""))
        .filter(|word| {
            word.chars().next().is_some_and(char::is_uppercase) && word != drop
        })
        .collect::<Vec<_>>()
        .join(" ")
}
