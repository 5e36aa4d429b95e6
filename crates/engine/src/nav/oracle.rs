use std::collections::HashSet;

use thiserror::Error;

use super::tile::TileCoord;

/// Read-only view answering whether a tile may currently be entered.
pub trait PassabilityOracle {
    fn is_passable(&self, tile: TileCoord) -> bool;
}

impl<T: PassabilityOracle + ?Sized> PassabilityOracle for &T {
    fn is_passable(&self, tile: TileCoord) -> bool {
        (**self).is_passable(tile)
    }
}

/// Obstacle occupying a `width` x `height` rectangle whose top-left corner is
/// `anchor`. Queries for any covered tile report blocked, not only the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleCluster {
    pub anchor: TileCoord,
    pub width: u32,
    pub height: u32,
}

impl ObstacleCluster {
    pub fn covers(&self, tile: TileCoord) -> bool {
        let dx = i64::from(tile.x) - i64::from(self.anchor.x);
        let dy = i64::from(tile.y) - i64::from(self.anchor.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("terrain cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown grid glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("cluster at {anchor} has an empty footprint")]
    EmptyCluster { anchor: TileCoord },
}

/// Concrete passability snapshot: bounded terrain grid plus point obstacles
/// and multi-tile clusters. Tile `(0, 0)` is the top-left cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSnapshot {
    width: u32,
    height: u32,
    terrain_blocked: Vec<bool>,
    point_obstacles: HashSet<TileCoord>,
    clusters: Vec<ObstacleCluster>,
}

impl GridSnapshot {
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            terrain_blocked: vec![false; width as usize * height as usize],
            point_obstacles: HashSet::new(),
            clusters: Vec::new(),
        }
    }

    pub fn from_terrain(width: u32, height: u32, blocked: Vec<bool>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = blocked.len();
        if expected != actual {
            return Err(GridError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            terrain_blocked: blocked,
            point_obstacles: HashSet::new(),
            clusters: Vec::new(),
        })
    }

    /// Glyphs: `.` open, `#` blocked terrain, `o` point obstacle.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        let mut grid = Self::open(width as u32, height as u32);
        for (y, row) in rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: width,
                    actual: row_width,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let tile = TileCoord::new(x as i32, y as i32);
                match glyph {
                    '.' => {}
                    '#' => grid.set_terrain_blocked(tile, true),
                    'o' => grid.add_point_obstacle(tile),
                    _ => return Err(GridError::UnknownGlyph { glyph, x, y }),
                }
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        self.index_of(tile).is_some()
    }

    pub fn set_terrain_blocked(&mut self, tile: TileCoord, blocked: bool) {
        if let Some(index) = self.index_of(tile) {
            self.terrain_blocked[index] = blocked;
        }
    }

    pub fn add_point_obstacle(&mut self, tile: TileCoord) {
        self.point_obstacles.insert(tile);
    }

    pub fn has_point_obstacle(&self, tile: TileCoord) -> bool {
        self.point_obstacles.contains(&tile)
    }

    pub fn add_cluster(&mut self, cluster: ObstacleCluster) -> Result<(), GridError> {
        if cluster.width == 0 || cluster.height == 0 {
            return Err(GridError::EmptyCluster {
                anchor: cluster.anchor,
            });
        }
        self.clusters.push(cluster);
        Ok(())
    }

    fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 {
            return None;
        }
        let (x, y) = (tile.x as u32, tile.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl PassabilityOracle for GridSnapshot {
    fn is_passable(&self, tile: TileCoord) -> bool {
        let Some(index) = self.index_of(tile) else {
            return false;
        };
        if self.terrain_blocked[index] || self.point_obstacles.contains(&tile) {
            return false;
        }
        !self.clusters.iter().any(|cluster| cluster.covers(tile))
    }
}
