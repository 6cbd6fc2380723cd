//! Sector layout generator: recursive rectangular partitioning, a randomized
//! spanning tree over the sector adjacency graph, and tile rasterization.
//!
//! # Invariants
//! - A sector is listed on side S of a neighbour iff the neighbour is listed
//!   on the opposite side of it, and the two overlap along that edge.
//! - Retired (split) sectors are unreachable through any neighbour list.
//! - A layout with N sectors has exactly N - 1 connections.
//! - Generation is a pure function of its parameters and the random source.

pub mod connect;
pub mod error;
pub mod generator;
pub mod grid;
pub mod interval;
pub mod sector;

pub use connect::{Connection, build_spanning_tree, place_gate};
pub use error::LayoutError;
pub use generator::{GenerationStats, GeneratorConfig, Layout, WorldGenerator, generate};
pub use grid::{TileGrid, rasterize};
pub use interval::Interval;
pub use sector::{Axis, Sector, SectorId, SectorMap, Side};

pub fn crate_info() -> &'static str {
    "sectorgen-layout v0.1.0"
}
