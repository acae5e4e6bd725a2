use ahash::{AHashMap, AHashSet};
use geo::{Coord, LineString};

/// Coordinate quantum for vertex identification: 1e-7 degrees (~1 cm).
/// Vertices closer than this collapse into one graph node, repairing the
/// floating-point drift common in exported geodata.
const QUANTUM: f64 = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey(i64, i64);

fn quantize(c: Coord<f64>) -> VertexKey {
    VertexKey((c.x * QUANTUM).round() as i64, (c.y * QUANTUM).round() as i64)
}

/// An undirected planar graph built incrementally from line strings.
///
/// Consecutive coordinates of each input line become edges; vertices are
/// deduplicated on a quantized grid, and repeated segments collapse into a
/// single edge.  Call [`PlanarGraph::faces`] (or the [`crate::polygonize`]
/// convenience wrapper) to extract the bounded faces.
#[derive(Debug, Default)]
pub struct PlanarGraph {
    pub(crate) coords: Vec<Coord<f64>>,
    pub(crate) edges: Vec<(u32, u32)>,
    index: AHashMap<VertexKey, u32>,
    seen: AHashSet<(u32, u32)>,
}

impl PlanarGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add every segment of `line` to the graph.
    ///
    /// Zero-length segments (after quantization) are skipped, as are
    /// segments already present, in either direction.
    pub fn add_line(&mut self, line: &LineString<f64>) {
        for pair in line.0.windows(2) {
            let u = self.vertex(pair[0]);
            let v = self.vertex(pair[1]);
            if u == v {
                continue;
            }
            let key = (u.min(v), u.max(v));
            if self.seen.insert(key) {
                self.edges.push((u, v));
            }
        }
    }

    fn vertex(&mut self, c: Coord<f64>) -> u32 {
        let key = quantize(c);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.coords.len() as u32;
        self.coords.push(c);
        self.index.insert(key, id);
        id
    }

    /// Drop every edge that cannot lie on a face boundary: dangling chains
    /// are peeled off iteratively from their degree-1 endpoints, the way a
    /// polygonizer discards dangles before tracing rings.
    ///
    /// Returns the surviving edges.
    pub(crate) fn prune_dangles(&self) -> Vec<(u32, u32)> {
        let mut degree = vec![0u32; self.coords.len()];
        for &(u, v) in &self.edges {
            degree[u as usize] += 1;
            degree[v as usize] += 1;
        }

        let mut alive = vec![true; self.edges.len()];
        let mut incident: Vec<Vec<u32>> = vec![Vec::new(); self.coords.len()];
        for (i, &(u, v)) in self.edges.iter().enumerate() {
            incident[u as usize].push(i as u32);
            incident[v as usize].push(i as u32);
        }

        let mut stack: Vec<u32> = (0..self.coords.len() as u32)
            .filter(|&v| degree[v as usize] == 1)
            .collect();

        while let Some(v) = stack.pop() {
            if degree[v as usize] != 1 {
                continue;
            }
            let Some(&e) = incident[v as usize].iter().find(|&&e| alive[e as usize]) else {
                continue;
            };
            alive[e as usize] = false;
            let (a, b) = self.edges[e as usize];
            for end in [a, b] {
                degree[end as usize] -= 1;
                if degree[end as usize] == 1 {
                    stack.push(end);
                }
            }
        }

        self.edges
            .iter()
            .zip(&alive)
            .filter_map(|(&e, &keep)| keep.then_some(e))
            .collect()
    }
}
