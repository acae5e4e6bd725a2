use anyhow::Result;
use geo::Geometry;

/// One boundary candidate returned by a gazetteer lookup.
#[derive(Debug, Clone)]
pub struct PlaceCandidate {
    pub display_name: String,
    pub geometry: Geometry<f64>,
}

impl PlaceCandidate {
    pub fn is_polygonal(&self) -> bool {
        matches!(self.geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }
}

/// Free-text place search.  HTTP status other than 200 yields an empty
/// candidate list, not an error.
pub trait Gazetteer {
    fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>>;
}

/// Strategy for picking one candidate when a lookup is ambiguous.
///
/// Interactive selection can be injected here; unattended deployments use
/// a deterministic strategy such as [`FirstMatch`].
pub trait CandidateSelector {
    fn choose<'a>(&self, candidates: &'a [PlaceCandidate]) -> Option<&'a PlaceCandidate>;
}

/// Deterministic default selector: the first polygonal candidate whose
/// display name contains the configured country token, falling back to the
/// first polygonal candidate when no name matches (or no token is set).
#[derive(Debug, Default)]
pub struct FirstMatch {
    pub country_token: Option<String>,
}

impl FirstMatch {
    pub fn for_country(token: impl Into<String>) -> Self {
        Self { country_token: Some(token.into()) }
    }
}

impl CandidateSelector for FirstMatch {
    fn choose<'a>(&self, candidates: &'a [PlaceCandidate]) -> Option<&'a PlaceCandidate> {
        let polygonal = || candidates.iter().filter(|c| c.is_polygonal());
        if let Some(token) = &self.country_token {
            if let Some(hit) = polygonal().find(|c| c.display_name.contains(token.as_str())) {
                return Some(hit);
            }
        }
        polygonal().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Point};

    fn candidate(name: &str, polygonal: bool) -> PlaceCandidate {
        PlaceCandidate {
            display_name: name.to_string(),
            geometry: if polygonal {
                Geometry::Polygon(polygon![
                    (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)
                ])
            } else {
                Geometry::Point(Point::new(0.0, 0.0))
            },
        }
    }

    #[test]
    fn prefers_country_token_match() {
        let candidates = vec![
            candidate("Springfield, United States", true),
            candidate("Springfield, Canada", true),
        ];
        let selector = FirstMatch::for_country("Canada");
        let chosen = selector.choose(&candidates).unwrap();
        assert!(chosen.display_name.contains("Canada"));
    }

    #[test]
    fn skips_non_polygonal_candidates() {
        let candidates = vec![candidate("A point", false), candidate("An area", true)];
        let chosen = FirstMatch::default().choose(&candidates).unwrap();
        assert_eq!(chosen.display_name, "An area");
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(FirstMatch::default().choose(&[]).is_none());
    }
}
