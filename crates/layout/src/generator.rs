use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::connect::{Connection, build_spanning_tree};
use crate::error::LayoutError;
use crate::grid::{TileGrid, rasterize};
use crate::interval::Interval;
use crate::sector::{Sector, SectorMap};

/// Generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Grid width in tiles, including the one-tile outer wall.
    pub width: u32,
    /// Grid height in tiles, including the one-tile outer wall.
    pub height: u32,
    pub min_sector_width: u32,
    pub min_sector_height: u32,
    /// Number of random split attempts. Attempts that land on an
    /// unsplittable sector are spent without effect.
    pub split_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 30,
            min_sector_width: 2,
            min_sector_height: 2,
            split_attempts: 100,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let invalid_dimensions = LayoutError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };
        if self.width <= 2 || self.height <= 2 {
            return Err(invalid_dimensions);
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(invalid_dimensions);
        }
        if self.min_sector_width < 1
            || self.min_sector_height < 1
            || i32::try_from(self.min_sector_width).is_err()
            || i32::try_from(self.min_sector_height).is_err()
        {
            return Err(LayoutError::InvalidMinimumSize {
                min_width: self.min_sector_width,
                min_height: self.min_sector_height,
            });
        }
        Ok(())
    }
}

/// Counters recorded for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationStats {
    pub split_attempts: u32,
    pub successful_splits: u32,
    pub sector_count: usize,
    pub connection_count: usize,
    pub elapsed: Duration,
}

/// Result of a generation run: the tile grid plus the sector graph behind it.
#[derive(Debug, Clone)]
pub struct Layout {
    grid: TileGrid,
    sectors: SectorMap,
    connections: Vec<Connection>,
    stats: GenerationStats,
}

impl Layout {
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn sectors(&self) -> &SectorMap {
        &self.sectors
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Hand the grid to a consumer, dropping the sector graph.
    pub fn into_grid(self) -> TileGrid {
        self.grid
    }
}

/// Partitions the playable area, connects the sectors and rasterizes them.
///
/// All randomness comes from the caller's generator, consumed in call
/// order, so a seeded source reproduces a layout exactly.
#[derive(Debug, Clone, Default)]
pub struct WorldGenerator {
    config: GeneratorConfig,
}

impl WorldGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Layout, LayoutError> {
        let config = &self.config;
        let _span = tracing::info_span!(
            "generate",
            width = config.width,
            height = config.height,
            attempts = config.split_attempts
        )
        .entered();
        config.validate()?;
        let start = Instant::now();

        let (mut sectors, successful_splits) = self.partition(rng)?;
        let connections = build_spanning_tree(&mut sectors, rng)?;
        let grid = rasterize(config.width, config.height, &sectors, &connections);

        let stats = GenerationStats {
            split_attempts: config.split_attempts,
            successful_splits,
            sector_count: sectors.len(),
            connection_count: connections.len(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            sectors = stats.sector_count,
            connections = stats.connection_count,
            splits = stats.successful_splits,
            elapsed = ?stats.elapsed,
            "layout generated"
        );

        Ok(Layout {
            grid,
            sectors,
            connections,
            stats,
        })
    }

    /// Run the split attempts over a single sector covering the area inside
    /// the outer wall. Returns the sectors and the number of splits made.
    ///
    /// The result is not guaranteed to be fully subdivided: a sector that is
    /// never picked stays whole.
    pub fn partition<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(SectorMap, u32), LayoutError> {
        let config = &self.config;
        config.validate()?;
        let (min_width, min_height) = (
            config.min_sector_width as i32,
            config.min_sector_height as i32,
        );

        let mut sectors = SectorMap::new(Sector::new(
            Interval::new(1, config.width as i32 - 2),
            Interval::new(1, config.height as i32 - 2),
        ));
        let mut splits = 0;

        for attempt in 0..config.split_attempts {
            let index = rng.random_range(0..sectors.len());
            let id = sectors.ids()[index];
            let splittable = sectors
                .get(id)
                .is_some_and(|sector| sector.can_split(min_width, min_height));
            if !splittable {
                tracing::trace!(attempt, sector = %id, "attempt landed on unsplittable sector");
                continue;
            }
            let children = sectors.split(id, min_width, min_height, rng)?;
            splits += 1;
            tracing::debug!(attempt, parent = %id, ?children, "split sector");
        }

        Ok((sectors, splits))
    }
}

/// Generate a layout for a `width` x `height` grid.
pub fn generate<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    min_sector_width: u32,
    min_sector_height: u32,
    split_attempts: u32,
    rng: &mut R,
) -> Result<Layout, LayoutError> {
    WorldGenerator::new(GeneratorConfig {
        width,
        height,
        min_sector_width,
        min_sector_height,
        split_attempts,
    })
    .generate(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sectorgen_common::{GridPos, Tile};
    use std::collections::VecDeque;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Walkable cells reachable from `start` moving in four directions.
    fn flood(grid: &TileGrid, start: GridPos) -> usize {
        let mut seen = vec![false; (grid.width() * grid.height()) as usize];
        let mut queue = VecDeque::from([start]);
        let mut count = 0;
        while let Some(p) = queue.pop_front() {
            if !grid.tile(p).is_walkable() {
                continue;
            }
            let i = (p.y as u32 * grid.width() + p.x as u32) as usize;
            if seen[i] {
                continue;
            }
            seen[i] = true;
            count += 1;
            for d in [GridPos::X, GridPos::NEG_X, GridPos::Y, GridPos::NEG_Y] {
                queue.push_back(p + d);
            }
        }
        count
    }

    #[test]
    fn config_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.width, 30);
        assert_eq!(config.height, 30);
        assert_eq!(config.min_sector_width, 2);
        assert_eq!(config.min_sector_height, 2);
        assert_eq!(config.split_attempts, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_from_partial_json() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "width": 40, "split_attempts": 7 }"#).unwrap();
        assert_eq!(config.width, 40);
        assert_eq!(config.height, 30);
        assert_eq!(config.split_attempts, 7);
    }

    #[test]
    fn rejects_small_dimensions() {
        let err = generate(2, 10, 1, 1, 10, &mut seeded(0)).unwrap_err();
        assert_eq!(err, LayoutError::InvalidDimensions { width: 2, height: 10 });
        let err = generate(10, 0, 1, 1, 10, &mut seeded(0)).unwrap_err();
        assert_eq!(err, LayoutError::InvalidDimensions { width: 10, height: 0 });
    }

    #[test]
    fn rejects_zero_minimum() {
        let err = generate(10, 10, 0, 1, 10, &mut seeded(0)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidMinimumSize { min_width: 0, .. }));
    }

    #[test]
    fn oversized_minimum_width_only_splits_vertically() {
        let layout = generate(10, 10, 2_000_000_000, 1, 5, &mut seeded(0)).unwrap();
        for (_, sector) in layout.sectors().iter() {
            assert_eq!(sector.horizontal(), Interval::new(1, 8));
        }
        assert_eq!(layout.connections().len(), layout.sector_count() - 1);

        let layout = generate(10, 10, u32::MAX / 2, i32::MAX as u32, 5, &mut seeded(1)).unwrap();
        assert_eq!(layout.sector_count(), 1);
        assert!(layout.connections().is_empty());
        assert_eq!(layout.stats().successful_splits, 0);
        assert_eq!(layout.grid().count(Tile::Open), 8 * 8);
    }

    #[test]
    fn zero_attempts_yield_single_interior_sector() {
        let layout = generate(3, 3, 1, 1, 0, &mut seeded(5)).unwrap();
        assert_eq!(layout.sector_count(), 1);
        assert!(layout.connections().is_empty());

        let grid = layout.grid();
        assert_eq!(grid.count(Tile::Gate), 0);
        assert_eq!(grid.count(Tile::Open), 1);
        assert_eq!(grid.at(1, 1), Tile::Open);
        assert_eq!(grid.count(Tile::Wall), 8);
        assert_eq!(layout.stats().successful_splits, 0);
    }

    #[test]
    fn ten_by_ten_seed_42() {
        let layout = generate(10, 10, 2, 2, 100, &mut seeded(42)).unwrap();
        let grid = layout.grid();
        assert_eq!((grid.width(), grid.height()), (10, 10));
        assert!(layout.sector_count() >= 1);
        assert_eq!(layout.connections().len(), layout.sector_count() - 1);
        layout.sectors().verify_adjacency().unwrap();

        let walkable = grid.count(Tile::Open) + grid.count(Tile::Gate);
        let (start, _) = grid.cells().find(|(_, t)| *t == Tile::Open).unwrap();
        assert_eq!(flood(grid, start), walkable);

        let again = generate(10, 10, 2, 2, 100, &mut seeded(42)).unwrap();
        assert_eq!(again.grid(), grid);
        assert_eq!(again.connections(), layout.connections());
    }

    #[test]
    fn grid_matches_sectors_and_gates() {
        for seed in 0..20 {
            let layout = generate(41, 27, 2, 3, 150, &mut seeded(seed)).unwrap();
            let grid = layout.grid();
            for (pos, tile) in grid.cells() {
                let in_sector = layout.sectors().iter().any(|(_, s)| s.contains(pos));
                let is_gate = layout.connections().iter().any(|c| c.gate == pos);
                let expected = if is_gate {
                    Tile::Gate
                } else if in_sector {
                    Tile::Open
                } else {
                    Tile::Wall
                };
                assert_eq!(tile, expected, "seed {seed} at {pos}");
                assert!(!(is_gate && in_sector), "gate inside a sector at {pos}");
            }
        }
    }

    #[test]
    fn outer_border_stays_wall() {
        let layout = generate(20, 15, 1, 1, 200, &mut seeded(8)).unwrap();
        let grid = layout.grid();
        for x in 0..20 {
            assert_eq!(grid.at(x, 0), Tile::Wall);
            assert_eq!(grid.at(x, 14), Tile::Wall);
        }
        for y in 0..15 {
            assert_eq!(grid.at(0, y), Tile::Wall);
            assert_eq!(grid.at(19, y), Tile::Wall);
        }
    }

    #[test]
    fn sectors_respect_minimum_size() {
        for seed in 0..20 {
            let layout = generate(50, 40, 3, 4, 300, &mut seeded(seed)).unwrap();
            for (_, sector) in layout.sectors().iter() {
                assert!(sector.width() >= 3);
                assert!(sector.height() >= 4);
            }
        }
    }

    #[test]
    fn partition_stops_after_attempt_budget() {
        let generator = WorldGenerator::new(GeneratorConfig {
            width: 60,
            height: 60,
            min_sector_width: 1,
            min_sector_height: 1,
            split_attempts: 5,
        });
        let (sectors, splits) = generator.partition(&mut seeded(3)).unwrap();
        assert!(splits <= 5);
        assert_eq!(sectors.len(), splits as usize + 1);
    }

    #[test]
    fn stats_track_the_run() {
        let layout = generate(30, 30, 2, 2, 100, &mut seeded(1)).unwrap();
        let stats = layout.stats();
        assert_eq!(stats.split_attempts, 100);
        assert_eq!(stats.sector_count, layout.sector_count());
        assert_eq!(stats.connection_count, layout.connections().len());
        assert_eq!(stats.sector_count, stats.successful_splits as usize + 1);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generate(40, 40, 2, 2, 100, &mut seeded(1)).unwrap();
        let b = generate(40, 40, 2, 2, 100, &mut seeded(2)).unwrap();
        assert_ne!(a.grid(), b.grid());
    }
}
