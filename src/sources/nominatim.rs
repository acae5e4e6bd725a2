use std::time::Duration;

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::place::{Gazetteer, PlaceCandidate};

use super::FetchCache;

const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = concat!("urbanpop/", env!("CARGO_PKG_VERSION"));

/// Blocking client for a Nominatim-style gazetteer.
pub struct NominatimClient {
    client: Client,
    endpoint: String,
    cache: Option<FetchCache>,
}

#[derive(Deserialize)]
struct SearchResult {
    display_name: String,
    geojson: Option<Value>,
}

impl NominatimClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .context("[sources::nominatim] Failed to build HTTP client")?;
        Ok(Self { client, endpoint: endpoint.into(), cache: None })
    }

    /// Cache raw response bodies under `dir` (staleness accepted).
    pub fn with_cache(mut self, dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        self.cache = Some(FetchCache::new(dir)?);
        Ok(self)
    }

    fn fetch(&self, query: &str) -> Result<String> {
        let request = format!("{}?q={query}&format=json&polygon_geojson=1", self.endpoint);
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&request) {
                return Ok(body);
            }
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("polygon_geojson", "1")])
            .send()
            .context("[sources::nominatim] Search request failed")?;
        if response.status() != reqwest::StatusCode::OK {
            // Non-200 yields no candidates, not an error.
            return Ok(String::from("[]"));
        }
        let body = response.text().context("[sources::nominatim] Failed to read body")?;

        if let Some(cache) = &self.cache {
            let _ = cache.put(&request, &body);
        }
        Ok(body)
    }
}

impl Gazetteer for NominatimClient {
    fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>> {
        let body = self.fetch(query)?;
        let results: Vec<SearchResult> =
            serde_json::from_str(&body).context("[sources::nominatim] Malformed search response")?;

        let mut candidates = Vec::new();
        for result in results {
            let Some(geojson) = result.geojson else { continue };
            let Ok(geometry) = parse_geojson(&geojson) else { continue };
            candidates.push(PlaceCandidate { display_name: result.display_name, geometry });
        }
        Ok(candidates)
    }
}

/// Parse a GeoJSON geometry object (type + coordinates) into a geometry.
pub(crate) fn parse_geojson(value: &Value) -> Result<Geometry<f64>> {
    let ty = value["type"].as_str().unwrap_or_default();
    let coordinates = &value["coordinates"];
    match ty {
        "Point" => {
            let position = parse_position(coordinates)?;
            Ok(Geometry::Point(Point(position)))
        }
        "LineString" => Ok(Geometry::LineString(parse_ring(coordinates)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coordinates)?)),
        "MultiPolygon" => {
            let parts = coordinates
                .as_array()
                .context("[sources::nominatim] MultiPolygon coordinates must be an array")?;
            let polygons = parts.iter().map(parse_polygon).collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        other => bail!("[sources::nominatim] Unsupported GeoJSON type: {other}"),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .context("[sources::nominatim] Polygon coordinates must be an array")?;
    let mut parsed = rings.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        bail!("[sources::nominatim] Polygon without rings");
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .context("[sources::nominatim] Ring coordinates must be an array")?;
    let coords = positions.iter().map(parse_position).collect::<Result<Vec<_>>>()?;
    Ok(LineString(coords))
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = value
        .as_array()
        .filter(|pair| pair.len() >= 2)
        .context("[sources::nominatim] Position must be a [lon, lat] pair")?;
    let x = pair[0].as_f64().context("[sources::nominatim] Bad longitude")?;
    let y = pair[1].as_f64().context("[sources::nominatim] Bad latitude")?;
    Ok(Coord { x, y })
}
