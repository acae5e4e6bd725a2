use std::fmt;

use anyhow::{bail, Result};

/// Kind of OSM element a feature was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "node" => Ok(ElementType::Node),
            "way" => Ok(ElementType::Way),
            "relation" => Ok(ElementType::Relation),
            other => bail!("Unknown element type: {other}"),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable key for any map feature across its lifecycle.
///
/// `(element_type, element_id)` is unique within a tag category; duplicate
/// keys are collapsed to one record at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId {
    pub element_type: ElementType,
    pub element_id: i64,
}

impl FeatureId {
    pub fn new(element_type: ElementType, element_id: i64) -> Self {
        Self { element_type, element_id }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type, self.element_id)
    }
}
