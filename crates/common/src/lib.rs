//! Shared value types for the sector layout generator.
//!
//! # Invariants
//! - Types here carry no behavior beyond the tile flag itself; rendering
//!   and collision policy belong to consumers.

mod types;

pub use types::{GridPos, Tile};
