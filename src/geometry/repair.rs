use geo::{BooleanOps, Geometry, MultiPolygon, Validation};

/// Repair self-intersecting or otherwise topologically invalid areal
/// geometry to the nearest valid shape.
///
/// Valid input passes through untouched.  Invalid polygons are rebuilt by a
/// boolean self-union, which re-nodes crossing rings and re-assembles the
/// result as a valid multi-polygon.  Non-areal geometry is returned as-is:
/// only shapes that participate in area or containment computations need
/// validity.
pub fn make_valid(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(p) => {
            if p.is_valid() {
                geometry.clone()
            } else {
                Geometry::MultiPolygon(rebuild(&MultiPolygon(vec![p.clone()])))
            }
        }
        Geometry::MultiPolygon(mp) => {
            if mp.is_valid() {
                geometry.clone()
            } else {
                Geometry::MultiPolygon(rebuild(mp))
            }
        }
        other => other.clone(),
    }
}

fn rebuild(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    mp.union(&MultiPolygon::new(Vec::new()))
}
