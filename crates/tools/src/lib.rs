//! Developer tooling: read-only inspection of generated layouts.
//!
//! # Invariants
//! - Tools never mutate a layout.

mod inspector;

pub use inspector::{LayoutInspector, LayoutSummary};

pub fn crate_info() -> &'static str {
    "sectorgen-tools v0.1.0"
}
