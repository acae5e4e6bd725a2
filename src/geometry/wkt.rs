//! Minimal WKT support: just the shapes this pipeline exchanges (points,
//! lines, polygons, multi-polygons).  Writing feeds the persisted per-place
//! table; parsing accepts boundary input as WKT text.

use anyhow::{bail, ensure, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};

/// Render a geometry as WKT.
pub fn to_wkt(geometry: &Geometry<f64>) -> Result<String> {
    match geometry {
        Geometry::Point(p) => Ok(format!("POINT ({} {})", p.x(), p.y())),
        Geometry::LineString(ls) => Ok(format!("LINESTRING {}", ring(ls))),
        Geometry::Polygon(p) => Ok(format!("POLYGON {}", polygon(p))),
        Geometry::MultiPolygon(mp) => {
            let parts: Vec<String> = mp.0.iter().map(polygon).collect();
            Ok(format!("MULTIPOLYGON ({})", parts.join(", ")))
        }
        other => bail!("[geometry::wkt] Unsupported geometry type: {other:?}"),
    }
}

fn ring(ls: &LineString<f64>) -> String {
    let coords: Vec<String> = ls.0.iter().map(|c| format!("{} {}", c.x, c.y)).collect();
    format!("({})", coords.join(", "))
}

fn polygon(p: &Polygon<f64>) -> String {
    let mut rings = vec![ring(p.exterior())];
    rings.extend(p.interiors().iter().map(ring));
    format!("({})", rings.join(", "))
}

/// Parse POLYGON and MULTIPOLYGON WKT text into a geometry.
///
/// Only polygonal types are accepted: the sole WKT entry point is boundary
/// input, which must be areal.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("MULTIPOLYGON") {
        let body = &trimmed[trimmed.len() - rest.len()..];
        let polygons = split_groups(strip_parens(body)?)?
            .into_iter()
            .map(parse_polygon_body)
            .collect::<Result<Vec<_>>>()?;
        Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
    } else if let Some(rest) = upper.strip_prefix("POLYGON") {
        let body = &trimmed[trimmed.len() - rest.len()..];
        Ok(Geometry::Polygon(parse_polygon_body(strip_parens(body)?)?))
    } else {
        bail!("[geometry::wkt] Expected POLYGON or MULTIPOLYGON, got: {trimmed:.32}");
    }
}

/// Strip one level of outer parentheses.
fn strip_parens(s: &str) -> Result<&str> {
    let s = s.trim();
    ensure!(
        s.starts_with('(') && s.ends_with(')'),
        "[geometry::wkt] Malformed WKT group: {s:.32}"
    );
    Ok(&s[1..s.len() - 1])
}

/// Split a comma-separated list of parenthesized groups at depth zero.
fn split_groups(s: &str) -> Result<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                ensure!(depth > 0, "[geometry::wkt] Unbalanced parentheses");
                depth -= 1;
            }
            ',' if depth == 0 => {
                groups.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    ensure!(depth == 0, "[geometry::wkt] Unbalanced parentheses");
    groups.push(&s[start..]);
    Ok(groups)
}

/// Parse the ring list of one polygon: `(x y, ...), (x y, ...)`.
fn parse_polygon_body(s: &str) -> Result<Polygon<f64>> {
    let mut rings = split_groups(s)?
        .into_iter()
        .map(|group| parse_ring(strip_parens(group)?))
        .collect::<Result<Vec<_>>>()?;
    ensure!(!rings.is_empty(), "[geometry::wkt] Polygon without rings");
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn parse_ring(s: &str) -> Result<LineString<f64>> {
    let coords = s
        .split(',')
        .map(|pair| {
            let mut parts = pair.split_whitespace();
            let x: f64 = parts
                .next()
                .context("[geometry::wkt] Missing x coordinate")?
                .parse()
                .context("[geometry::wkt] Bad x coordinate")?;
            let y: f64 = parts
                .next()
                .context("[geometry::wkt] Missing y coordinate")?
                .parse()
                .context("[geometry::wkt] Bad y coordinate")?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString(coords))
}
