use std::collections::VecDeque;

use sectorgen_common::{GridPos, Tile};
use sectorgen_layout::{Connection, Layout, LayoutError, SectorId, SectorMap, TileGrid};

/// Layout inspector for developer tooling.
///
/// Provides read-only queries against a generated layout for debugging,
/// regression checks and the CLI.
pub struct LayoutInspector;

impl LayoutInspector {
    /// Produce a summary of the layout.
    pub fn summary(layout: &Layout) -> LayoutSummary {
        let grid = layout.grid();
        let areas: Vec<i64> = layout.sectors().iter().map(|(_, s)| s.area()).collect();
        LayoutSummary {
            width: grid.width(),
            height: grid.height(),
            sector_count: layout.sector_count(),
            connection_count: layout.connections().len(),
            open_tiles: grid.count(Tile::Open),
            gate_tiles: grid.count(Tile::Gate),
            wall_tiles: grid.count(Tile::Wall),
            smallest_sector: areas.iter().copied().min().unwrap_or(0),
            largest_sector: areas.iter().copied().max().unwrap_or(0),
            successful_splits: layout.stats().successful_splits,
            split_attempts: layout.stats().split_attempts,
        }
    }

    /// One line per row: `#` wall, `.` open, `+` gate.
    pub fn render_ascii(grid: &TileGrid) -> String {
        let mut out = String::with_capacity((grid.width() as usize + 1) * grid.height() as usize);
        for row in grid.rows() {
            out.extend(row.iter().map(|tile| tile.glyph()));
            out.push('\n');
        }
        out
    }

    /// Number of walkable cells reachable from `start` in four directions.
    /// Zero if `start` itself is not walkable.
    pub fn reachable_from(grid: &TileGrid, start: GridPos) -> usize {
        let width = grid.width() as usize;
        let mut seen = vec![false; width * grid.height() as usize];
        let mut queue = VecDeque::from([start]);
        let mut count = 0;

        while let Some(pos) = queue.pop_front() {
            if !grid.tile(pos).is_walkable() {
                continue;
            }
            let index = pos.y as usize * width + pos.x as usize;
            if seen[index] {
                continue;
            }
            seen[index] = true;
            count += 1;
            for step in [GridPos::X, GridPos::NEG_X, GridPos::Y, GridPos::NEG_Y] {
                queue.push_back(pos + step);
            }
        }
        count
    }

    /// Whether every walkable cell can reach every other one.
    pub fn is_fully_connected(grid: &TileGrid) -> bool {
        let walkable = grid.count(Tile::Open) + grid.count(Tile::Gate);
        match grid.cells().find(|(_, tile)| tile.is_walkable()) {
            Some((start, _)) => Self::reachable_from(grid, start) == walkable,
            None => true,
        }
    }

    /// Check the structural invariants of a finished layout: sector
    /// adjacency, one connection per sector past the first, and every gate
    /// joining two neighbours through a wall cell marked as a gate.
    pub fn verify(layout: &Layout) -> Result<(), LayoutError> {
        Self::verify_parts(layout.sectors(), layout.connections(), layout.grid())
    }

    fn verify_parts(
        sectors: &SectorMap,
        connections: &[Connection],
        grid: &TileGrid,
    ) -> Result<(), LayoutError> {
        sectors.verify_adjacency()?;

        let expected = sectors.len().saturating_sub(1);
        if connections.len() != expected {
            return Err(LayoutError::BrokenAdjacency {
                sector: sectors.ids().first().copied().unwrap_or(SectorId(0)),
                reason: format!(
                    "expected {expected} connections for {} sectors, found {}",
                    sectors.len(),
                    connections.len()
                ),
            });
        }

        for connection in connections {
            if !sectors.is_neighbour(connection.first, connection.second) {
                return Err(LayoutError::NotAdjacent {
                    first: connection.first,
                    second: connection.second,
                });
            }
            let gate = connection.gate;
            let inside = [connection.first, connection.second]
                .into_iter()
                .filter_map(|id| sectors.get(id))
                .any(|sector| sector.contains(gate));
            let tile = grid.tile(gate);
            if inside || tile != Tile::Gate {
                tracing::warn!(gate.x = gate.x, gate.y = gate.y, %tile, "bad gate cell");
                let problem = if inside {
                    "lies inside a sector".to_string()
                } else {
                    format!("is rasterized as {tile:?}")
                };
                return Err(LayoutError::BrokenAdjacency {
                    sector: connection.first,
                    reason: format!(
                        "gate ({}, {}) between {} and {} {problem}",
                        gate.x, gate.y, connection.first, connection.second
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Summary of a layout for the inspector.
#[derive(Debug, Clone)]
pub struct LayoutSummary {
    pub width: u32,
    pub height: u32,
    pub sector_count: usize,
    pub connection_count: usize,
    pub open_tiles: usize,
    pub gate_tiles: usize,
    pub wall_tiles: usize,
    pub smallest_sector: i64,
    pub largest_sector: i64,
    pub successful_splits: u32,
    pub split_attempts: u32,
}

impl std::fmt::Display for LayoutSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Layout: {}x{} sectors={} connections={} open={} gates={} walls={} area=[{}..{}] splits={}/{}",
            self.width,
            self.height,
            self.sector_count,
            self.connection_count,
            self.open_tiles,
            self.gate_tiles,
            self.wall_tiles,
            self.smallest_sector,
            self.largest_sector,
            self.successful_splits,
            self.split_attempts
        )
    }
}
