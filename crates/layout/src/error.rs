use crate::interval::Interval;
use crate::sector::SectorId;

/// Errors raised while generating a layout.
///
/// Every variant except the two input checks points at a broken internal
/// invariant. None of them are retried; a generation run is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid dimensions: {width}x{height} (both must exceed 2)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("invalid minimum sector size: {min_width}x{min_height} (both must be at least 1)")]
    InvalidMinimumSize { min_width: u32, min_height: u32 },
    #[error("intervals disjoint: {a} and {b}")]
    DisjointIntervals { a: Interval, b: Interval },
    #[error("sector graph disconnected: visited {visited} of {total} sectors")]
    DisconnectedGraph { visited: usize, total: usize },
    #[error("sectors {first} and {second} share no border")]
    NotAdjacent { first: SectorId, second: SectorId },
    #[error("unknown sector {0}")]
    UnknownSector(SectorId),
    #[error("broken adjacency at sector {sector}: {reason}")]
    BrokenAdjacency { sector: SectorId, reason: String },
}
