use sectorgen_common::{GridPos, Tile};

use crate::connect::Connection;
use crate::interval::Interval;
use crate::sector::SectorMap;

/// Row-major grid of tiles covering `[0, width) x [0, height)`.
///
/// Built once by the generator and read-only for consumers afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// A grid filled with walls.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Wall; width as usize * height as usize],
        }
    }

    /// A single open room: walls on the border, open floor inside.
    pub fn bordered(width: u32, height: u32) -> Self {
        let mut grid = Self::new(width, height);
        if width > 2 && height > 2 {
            grid.fill(
                Interval::new(1, width as i32 - 2),
                Interval::new(1, height as i32 - 2),
                Tile::Open,
            );
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Tile at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// Tile at `(x, y)`. Everything outside the grid reads as solid wall.
    pub fn at(&self, x: i32, y: i32) -> Tile {
        self.get(x, y).unwrap_or(Tile::Wall)
    }

    pub fn tile(&self, pos: GridPos) -> Tile {
        self.at(pos.x, pos.y)
    }

    pub(crate) fn set(&mut self, pos: GridPos, tile: Tile) -> bool {
        match self.index(pos.x, pos.y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Set every in-bounds cell of `horizontal` x `vertical` to `tile`.
    pub(crate) fn fill(&mut self, horizontal: Interval, vertical: Interval, tile: Tile) {
        for y in vertical.iter() {
            for x in horizontal.iter() {
                if let Some(i) = self.index(x, y) {
                    self.tiles[i] = tile;
                }
            }
        }
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        self.tiles.chunks(self.width.max(1) as usize)
    }

    /// Every cell with its position, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, Tile)> + '_ {
        let width = self.width.max(1) as usize;
        self.tiles.iter().enumerate().map(move |(i, &tile)| {
            (GridPos::new((i % width) as i32, (i / width) as i32), tile)
        })
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

/// Carve sectors and gates into a wall-filled grid.
pub fn rasterize(
    width: u32,
    height: u32,
    sectors: &SectorMap,
    connections: &[Connection],
) -> TileGrid {
    let mut grid = TileGrid::new(width, height);
    for (_, sector) in sectors.iter() {
        grid.fill(sector.horizontal(), sector.vertical(), Tile::Open);
    }
    for connection in connections {
        if !grid.set(connection.gate, Tile::Gate) {
            tracing::warn!(
                x = connection.gate.x,
                y = connection.gate.y,
                "gate outside grid"
            );
        }
    }
    grid
}
