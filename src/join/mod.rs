mod aggregate;
mod points;

pub use aggregate::{aggregate_district_pois, join_buildings_to_districts, landuse_districts};
pub use points::{attach_amenities, attach_points_inside};

use geo::{BoundingRect, Geometry, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// R-tree entry: the bounding box of one geometry in a record set.
#[derive(Debug, Clone)]
struct IndexedShape {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for IndexedShape {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Bounding-box index over a record set's geometries, used to cut the
/// candidate set of every containment test before the exact predicate runs.
#[derive(Debug)]
pub(crate) struct ShapeIndex {
    rtree: RTree<IndexedShape>,
}

impl ShapeIndex {
    pub(crate) fn build<'a>(geoms: impl IntoIterator<Item = &'a Geometry<f64>>) -> Self {
        let entries = geoms
            .into_iter()
            .enumerate()
            .filter_map(|(idx, geom)| {
                geom.bounding_rect().map(|bbox| IndexedShape { idx, bbox })
            })
            .collect();
        Self { rtree: RTree::bulk_load(entries) }
    }

    /// Indices whose bounding box intersects `geometry`'s bounding box.
    pub(crate) fn candidates(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else { return Vec::new() };
        let search = AABB::from_corners(rect.min().into(), rect.max().into());
        self.rtree
            .locate_in_envelope_intersecting(&search)
            .map(|entry| entry.idx)
            .collect()
    }
}
