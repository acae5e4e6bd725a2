use geo::{Coord, LineString, Polygon};

use crate::graph::PlanarGraph;

/// Faces whose shoelace area falls below this are walk artefacts
/// (back-and-forth traversals of collinear spikes), not real enclosures.
const MIN_FACE_AREA: f64 = 1e-14;

/// Extract every bounded face enclosed by `lines` as a polygon.
///
/// Lines must be noded: two lines that cross share a vertex at the crossing.
/// Dangling chains and duplicate segments are ignored.  An input whose lines
/// enclose nothing yields an empty vector.
pub fn polygonize<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>) -> Vec<Polygon<f64>> {
    let mut graph = PlanarGraph::new();
    for line in lines {
        graph.add_line(line);
    }
    graph.faces()
}

/// A directed half-edge: `origin → target`, with `twin(e) == e ^ 1`.
struct Half {
    origin: u32,
    target: u32,
}

impl PlanarGraph {
    /// Trace the bounded faces of the arrangement.
    ///
    /// Every surviving undirected edge becomes a twin pair of half-edges.
    /// Around each vertex the outgoing half-edges are sorted by angle; the
    /// successor of `e` in its face is the clockwise neighbour of `twin(e)`
    /// around `e`'s head.  Cycles with positive signed area are the bounded
    /// faces (traced counter-clockwise); the unbounded face traces clockwise
    /// and is dropped.
    pub fn faces(&self) -> Vec<Polygon<f64>> {
        let edges = self.prune_dangles();
        if edges.is_empty() {
            return Vec::new();
        }

        let mut halves = Vec::with_capacity(edges.len() * 2);
        for &(u, v) in &edges {
            halves.push(Half { origin: u, target: v });
            halves.push(Half { origin: v, target: u });
        }

        // Outgoing half-edges per vertex, sorted counter-clockwise by angle.
        let mut star: Vec<Vec<u32>> = vec![Vec::new(); self.coords.len()];
        for (e, half) in halves.iter().enumerate() {
            star[half.origin as usize].push(e as u32);
        }
        for (v, out) in star.iter_mut().enumerate() {
            let origin = self.coords[v];
            out.sort_by(|&a, &b| {
                let pa = angle_from(origin, self.coords[halves[a as usize].target as usize]);
                let pb = angle_from(origin, self.coords[halves[b as usize].target as usize]);
                pa.total_cmp(&pb)
            });
        }

        // Position of each half-edge within its origin's star.
        let mut star_pos = vec![0u32; halves.len()];
        for out in &star {
            for (i, &e) in out.iter().enumerate() {
                star_pos[e as usize] = i as u32;
            }
        }

        let next = |e: u32| -> u32 {
            let twin = e ^ 1;
            let head = halves[twin as usize].origin as usize;
            let out = &star[head];
            let i = star_pos[twin as usize] as usize;
            out[(i + out.len() - 1) % out.len()]
        };

        let mut visited = vec![false; halves.len()];
        let mut faces = Vec::new();

        for start in 0..halves.len() as u32 {
            if visited[start as usize] {
                continue;
            }
            let mut ring: Vec<Coord<f64>> = Vec::new();
            let mut e = start;
            loop {
                visited[e as usize] = true;
                ring.push(self.coords[halves[e as usize].origin as usize]);
                e = next(e);
                if e == start {
                    break;
                }
            }
            if ring.len() < 3 || signed_area(&ring) <= MIN_FACE_AREA {
                continue;
            }
            ring.push(ring[0]);
            faces.push(Polygon::new(LineString(ring), Vec::new()));
        }

        faces
    }
}

fn angle_from(origin: Coord<f64>, target: Coord<f64>) -> f64 {
    (target.y - origin.y).atan2(target.x - origin.x)
}

/// Shoelace area of an open ring; positive for counter-clockwise winding.
fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}
