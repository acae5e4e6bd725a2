use std::time::Duration;

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use geo::{BoundingRect, Contains, Coord, Geometry, Intersects, LineString, MultiPolygon, Point, Polygon};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::acquire::FeatureSource;
use crate::districts::{RoadNetworkSource, RoadSegment};
use crate::place::{AdminArea, AdminLookup};
use crate::types::{ElementType, Feature, FeatureId, TagCategory};

use super::FetchCache;

const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
const USER_AGENT: &str = concat!("urbanpop/", env!("CARGO_PKG_VERSION"));

/// Blocking client for an Overpass-style map-feature service.
///
/// Queries select by the boundary's bounding box; callers post-filter by
/// intersection with the boundary itself, which keeps MultiPolygon
/// boundaries working (`poly:` accepts only a single ring).
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    cache: Option<FetchCache>,
}

impl OverpassClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(300))
            .build()
            .context("[sources::overpass] Failed to build HTTP client")?;
        Ok(Self { client, endpoint: endpoint.into(), cache: None })
    }

    /// Cache raw response bodies under `dir` (staleness accepted).
    pub fn with_cache(mut self, dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        self.cache = Some(FetchCache::new(dir)?);
        Ok(self)
    }

    fn fetch(&self, query: &str) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(query) {
                return Ok(body);
            }
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .context("[sources::overpass] Request failed")?;
        if response.status() != reqwest::StatusCode::OK {
            bail!("[sources::overpass] Service answered {}", response.status());
        }
        let body = response.text().context("[sources::overpass] Failed to read body")?;

        if let Some(cache) = &self.cache {
            let _ = cache.put(query, &body);
        }
        Ok(body)
    }
}

/// `(south, west, north, east)` of the boundary, the query window.
fn bbox(boundary: &MultiPolygon<f64>) -> Result<(f64, f64, f64, f64)> {
    let rect = boundary
        .bounding_rect()
        .context("[sources::overpass] Boundary has no extent")?;
    Ok((rect.min().y, rect.min().x, rect.max().y, rect.max().x))
}

impl FeatureSource for OverpassClient {
    fn features_in(
        &self,
        boundary: &MultiPolygon<f64>,
        category: TagCategory,
    ) -> Result<Vec<Feature>> {
        let (s, w, n, e) = bbox(boundary)?;
        let key = category.key();
        let query = format!(
            "[out:json][timeout:180];\
             (node[\"{key}\"]({s},{w},{n},{e});\
              way[\"{key}\"]({s},{w},{n},{e});\
              relation[\"{key}\"]({s},{w},{n},{e}););\
             out geom;"
        );
        let body = self.fetch(&query)?;
        let features = parse_elements(&body)?;
        Ok(features
            .into_iter()
            .filter(|f| f.geometry.intersects(boundary))
            .collect())
    }
}

impl RoadNetworkSource for OverpassClient {
    fn roads_in(&self, boundary: &MultiPolygon<f64>) -> Result<Vec<RoadSegment>> {
        let (s, w, n, e) = bbox(boundary)?;
        let query =
            format!("[out:json][timeout:180];way[\"highway\"]({s},{w},{n},{e});out geom;");
        let body = self.fetch(&query)?;

        let parsed: Value =
            serde_json::from_str(&body).context("[sources::overpass] Malformed road response")?;
        let mut segments = Vec::new();
        for element in elements(&parsed) {
            if element["type"].as_str() != Some("way") {
                continue;
            }
            let Some(highway) = element["tags"]["highway"].as_str() else { continue };
            let Some(line) = way_line(element) else { continue };
            if line.intersects(boundary) {
                segments.push(RoadSegment { highway: highway.to_string(), line });
            }
        }
        Ok(segments)
    }
}

impl AdminLookup for OverpassClient {
    fn areas_at(&self, lon: f64, lat: f64) -> Result<Vec<AdminArea>> {
        let query = format!("[out:json];is_in({lat},{lon});out;");
        let body = self.fetch(&query)?;

        let parsed: Value =
            serde_json::from_str(&body).context("[sources::overpass] Malformed is_in response")?;
        let mut areas = Vec::new();
        for element in elements(&parsed) {
            if element["type"].as_str() != Some("area") {
                continue;
            }
            let tags = &element["tags"];
            let Some(name) = tags["name"].as_str() else { continue };
            areas.push(AdminArea {
                name: name.to_string(),
                admin_level: tags["admin_level"].as_str().and_then(|v| v.parse().ok()),
                is_place: tags.get("place").is_some(),
            });
        }
        Ok(areas)
    }
}

fn elements(parsed: &Value) -> impl Iterator<Item = &Value> {
    parsed["elements"].as_array().map(|v| v.iter()).into_iter().flatten()
}

/// Parse an `out geom` element list into features.  Elements without a
/// usable geometry are skipped, not fatal: a clipped member at the window
/// edge must not sink the whole category.
pub(crate) fn parse_elements(body: &str) -> Result<Vec<Feature>> {
    let parsed: Value =
        serde_json::from_str(body).context("[sources::overpass] Malformed element response")?;

    let mut features = Vec::new();
    for element in elements(&parsed) {
        let Some(ty) = element["type"].as_str().and_then(|t| ElementType::parse(t).ok()) else {
            continue;
        };
        let Some(id) = element["id"].as_i64() else { continue };

        let geometry = match ty {
            ElementType::Node => node_point(element),
            ElementType::Way => way_geometry(element),
            ElementType::Relation => assemble_relation(element),
        };
        let Some(geometry) = geometry else { continue };

        let mut feature = Feature::new(FeatureId::new(ty, id), geometry);
        if let Some(tags) = element["tags"].as_object() {
            feature.tags = tags
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect::<AHashMap<_, _>>();
        }
        features.push(feature);
    }
    Ok(features)
}

fn node_point(element: &Value) -> Option<Geometry<f64>> {
    let lat = element["lat"].as_f64()?;
    let lon = element["lon"].as_f64()?;
    Some(Geometry::Point(Point::new(lon, lat)))
}

fn way_coords(element: &Value) -> Option<Vec<Coord<f64>>> {
    let points = element["geometry"].as_array()?;
    let coords: Vec<Coord<f64>> = points
        .iter()
        .filter_map(|p| {
            Some(Coord { x: p["lon"].as_f64()?, y: p["lat"].as_f64()? })
        })
        .collect();
    (coords.len() >= 2).then_some(coords)
}

fn way_line(element: &Value) -> Option<LineString<f64>> {
    way_coords(element).map(LineString)
}

/// A closed way is a footprint; an open one stays a line.
fn way_geometry(element: &Value) -> Option<Geometry<f64>> {
    let coords = way_coords(element)?;
    if coords.len() >= 4 && coords.first() == coords.last() {
        Some(Geometry::Polygon(Polygon::new(LineString(coords), Vec::new())))
    } else {
        Some(Geometry::LineString(LineString(coords)))
    }
}

/// Assemble a multipolygon relation from its member ways: outer segments
/// stitch into exterior rings, inner segments into holes, holes are
/// assigned to the outer ring containing them.
fn assemble_relation(element: &Value) -> Option<Geometry<f64>> {
    let members = element["members"].as_array()?;

    let mut outers: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut inners: Vec<Vec<Coord<f64>>> = Vec::new();
    for member in members {
        if member["type"].as_str() != Some("way") {
            continue;
        }
        let Some(coords) = way_coords(member) else { continue };
        match member["role"].as_str() {
            Some("inner") => inners.push(coords),
            // Outer is the default role for untagged members.
            Some("outer") | None | Some("") => outers.push(coords),
            _ => {}
        }
    }

    let outer_rings = stitch_rings(outers);
    if outer_rings.is_empty() {
        return None;
    }
    let inner_rings = stitch_rings(inners);

    let mut polygons: Vec<Polygon<f64>> = outer_rings
        .into_iter()
        .map(|ring| Polygon::new(ring, Vec::new()))
        .collect();
    for hole in inner_rings {
        let Some(anchor) = hole.0.first().copied() else { continue };
        if let Some(owner) = polygons.iter_mut().find(|p| p.contains(&Point(anchor))) {
            let (exterior, mut interiors) = owner.clone().into_inner();
            interiors.push(hole);
            *owner = Polygon::new(exterior, interiors);
        }
    }

    if polygons.len() == 1 {
        polygons.pop().map(Geometry::Polygon)
    } else {
        Some(Geometry::MultiPolygon(MultiPolygon(polygons)))
    }
}

/// Stitch way segments into closed rings by matching endpoints.  Segments
/// that cannot be closed are discarded.
fn stitch_rings(mut segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut rings = Vec::new();

    while let Some(mut current) = segments.pop() {
        loop {
            if current.len() >= 4 && current.first() == current.last() {
                rings.push(LineString(current));
                break;
            }
            let tail = current.last().copied();
            let position = segments.iter().position(|candidate| {
                candidate.first().copied() == tail || candidate.last().copied() == tail
            });
            let Some(position) = position else { break };
            let mut next = segments.remove(position);
            if next.last().copied() == tail {
                next.reverse();
            }
            current.extend(next.into_iter().skip(1));
        }
    }

    rings
}
