//! The staged enrichment pipeline.
//!
//! Every stage fully materializes its output before the next stage begins;
//! the evolving record sets live in one [`EnrichContext`] passed by
//! exclusive ownership from stage to stage, so there is exactly one writer
//! at any time and no hidden coupling between stages.

use anyhow::{Context, Result};
use geo::MultiPolygon;

use crate::acquire::{acquire_categories, normalize_categories, FeatureSource, NormalizedSet};
use crate::address::{merge_registry, RegistryRecord};
use crate::classify::{classify, retain_residential, RESIDENTIAL_LABELS};
use crate::districts::{decompose_transport_districts, RoadNetworkSource};
use crate::geometry::corrected_areas;
use crate::join::{
    aggregate_district_pois, attach_amenities, attach_points_inside, join_buildings_to_districts,
    landuse_districts,
};
use crate::place::{resolve_place, CandidateSelector, Gazetteer, PlaceInput};
use crate::types::{Building, District};

/// Pipeline switches, passed down every stage.
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    /// Keep only residential buildings (pre-filter plus the classifier's
    /// final residential filter).
    pub only_residential: bool,
    /// Diagnostic verbosity (0 = silent).
    pub verbose: u8,
}

/// External collaborators of one enrichment run.
pub struct EnrichSources<'a> {
    pub gazetteer: &'a dyn Gazetteer,
    pub selector: &'a dyn CandidateSelector,
    pub features: &'a dyn FeatureSource,
    pub roads: &'a dyn RoadNetworkSource,
}

/// The evolving record sets of one place, owned by the pipeline.
#[derive(Debug)]
pub struct EnrichContext {
    pub boundary: MultiPolygon<f64>,
    /// Normalized per-category tables and side tables.
    pub set: NormalizedSet,
    /// The authoritative building record set.
    pub buildings: Vec<Building>,
    pub landuse_districts: Vec<District>,
    pub transport_districts: Vec<District>,
}

/// Run the full enrichment pipeline for one place.
///
/// Resolve the boundary, acquire and normalize the tagged features, derive
/// both district sets, enrich and join the buildings, reconcile with the
/// registry when one is supplied, and classify.  The returned context owns
/// the final record sets.
pub fn enrich_place(
    input: &PlaceInput,
    sources: &EnrichSources<'_>,
    registry: Option<&[RegistryRecord]>,
    options: &EnrichOptions,
) -> Result<EnrichContext> {
    let verbose = options.verbose;

    let boundary = resolve_place(input, sources.gazetteer, sources.selector, verbose)?;

    let categories = acquire_categories(sources.features, &boundary, verbose);
    let mut set = normalize_categories(categories);
    if verbose > 0 {
        eprintln!("[enrich] {} buildings after normalization", set.buildings.len());
    }

    let mut landuse = landuse_districts(&set.landuse);
    aggregate_district_pois(&mut landuse, &set);
    attach_district_areas(&mut landuse)?;

    let mut transport = decompose_transport_districts(sources.roads, &boundary, verbose)?;
    aggregate_district_pois(&mut transport, &set);
    attach_district_areas(&mut transport)?;

    let mut buildings = std::mem::take(&mut set.buildings);
    let footprints = corrected_areas(buildings.iter().map(|b| &b.geometry))
        .context("[enrich] Footprint area computation failed")?;
    for (building, area) in buildings.iter_mut().zip(footprints) {
        building.footprint_m2 = area;
    }

    attach_amenities(&mut buildings, &set.amenities);
    attach_points_inside(&mut buildings, &set.point_sources);

    if options.only_residential {
        buildings.retain(|b| RESIDENTIAL_LABELS.contains(&b.building.as_str()));
        if verbose > 0 {
            eprintln!("[enrich] {} buildings after residential pre-filter", buildings.len());
        }
    }

    join_buildings_to_districts(&mut buildings, &landuse);
    join_buildings_to_districts(&mut buildings, &transport);

    if let Some(records) = registry {
        merge_registry(&mut buildings, records);
        if verbose > 0 {
            eprintln!("[enrich] merged {} registry records", records.len());
        }
    }

    for building in buildings.iter_mut() {
        classify(building);
    }
    if options.only_residential {
        buildings = retain_residential(buildings);
    }
    if verbose > 0 {
        eprintln!(
            "[enrich] {} buildings, {} land-use districts, {} transport districts",
            buildings.len(),
            landuse.len(),
            transport.len()
        );
    }

    Ok(EnrichContext {
        boundary,
        set,
        buildings,
        landuse_districts: landuse,
        transport_districts: transport,
    })
}

/// District areas in km², rounded to two decimals.
fn attach_district_areas(districts: &mut [District]) -> Result<()> {
    let areas = corrected_areas(districts.iter().map(|d| &d.geometry))
        .context("[enrich] District area computation failed")?;
    for (district, area_m2) in districts.iter_mut().zip(areas) {
        district.area_km2 = (area_m2 / 1e6 * 100.0).round() / 100.0;
    }
    Ok(())
}
