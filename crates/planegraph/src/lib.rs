//! Planar face extraction from noded line-work.
//!
//! Feed a set of line strings whose crossings coincide with shared vertices
//! (as in a road graph, where intersecting ways meet at common nodes) into a
//! [`PlanarGraph`], and read back every closed face enclosed by the lines as
//! a polygon.  Lines that cross without sharing a vertex (bridges, tunnels)
//! stay topologically disconnected, which is exactly what a ground-level
//! partition wants.
//!
//! The structure is a half-edge arrangement: every undirected edge is a pair
//! of directed **half-edges** (twins) stored at adjacent indices, so
//! `twin(e) == e ^ 1`.  Faces are traced by the classic rule
//! `next(e) = clockwise neighbour of twin(e)` in the angular order around the
//! head vertex; bounded faces come out counter-clockwise with positive
//! signed area, the unbounded face comes out negative and is discarded.

mod faces;
mod graph;

pub use faces::polygonize;
pub use graph::PlanarGraph;
