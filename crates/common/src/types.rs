use serde::{Deserialize, Serialize};

/// Integer coordinate of a single grid cell (`x` is the column, `y` the row).
pub type GridPos = glam::IVec2;

/// Kind of a single cell in a generated tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Solid rock. The grid starts out entirely filled with walls.
    #[default]
    Wall,
    /// Floor carved out of a sector's footprint.
    Open,
    /// Passable connector punched through the wall between two sectors.
    Gate,
}

impl Tile {
    /// Whether an actor can stand on this tile.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Tile::Wall)
    }

    /// Single-character glyph used by text dumps.
    pub fn glyph(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Open => '.',
            Tile::Gate => '+',
        }
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
