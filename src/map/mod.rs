//! Map and grid model plus the collaborator interfaces the generator consumes.
//!
//! Storage, naming and tile definitions belong to the host. This module only
//! fixes the narrow read/write surface; [`memory::InMemoryWorld`] implements
//! it for tests and the demo binary.

pub mod memory;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::JobError;
use crate::log::Logger;

pub use memory::InMemoryWorld;

/// Opaque handle for stations, maps and grids alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Integer grid position of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Internal numeric id of a registered tile kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub type_id: TileId,
    pub variant: u8,
}

impl Tile {
    pub const fn new(type_id: TileId) -> Self {
        Self {
            type_id,
            variant: 0,
        }
    }
}

/// Catalog entry for a tile kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDef {
    pub id: TileId,
    pub name: String,
    /// Number of visual variants; always at least 1.
    pub variants: u8,
}

/// One (coordinate, tile) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRecord {
    pub coord: TileCoord,
    pub tile: Tile,
}

/// Map and grid creation, enumeration and batch writes.
pub trait MapRegistry: Send + Sync {
    /// Create a new map. With `deferred_init` no map-init logic runs yet.
    fn create_map(&self, deferred_init: bool) -> EntityId;

    fn create_grid(&self, map: EntityId) -> Result<EntityId, JobError>;

    /// All tiles of `grid` in the grid's natural enumeration order.
    fn tiles(&self, grid: EntityId) -> Result<Vec<TileRecord>, JobError>;

    fn set_tiles(&self, grid: EntityId, tiles: Vec<TileRecord>) -> Result<(), JobError>;

    /// Discard a map and every grid on it. Unknown maps are ignored.
    fn delete_map(&self, map: EntityId);
}

pub trait MetadataStore: Send + Sync {
    fn entity_name(&self, entity: EntityId) -> Option<String>;
    fn set_entity_name(&self, entity: EntityId, name: String);
}

pub trait TileCatalog: Send + Sync {
    /// Look up a tile kind by name, failing with [`JobError::UnknownTileKind`].
    fn resolve(&self, kind: &str) -> Result<TileDef, JobError>;
}

pub trait StationResolver: Send + Sync {
    /// The largest grid owned by `station`, if it has any.
    fn largest_grid(&self, station: EntityId) -> Option<EntityId>;
}

/// Capability bundle handed to jobs at construction.
#[derive(Clone)]
pub struct Collaborators {
    pub maps: Arc<dyn MapRegistry>,
    pub metadata: Arc<dyn MetadataStore>,
    pub tiles: Arc<dyn TileCatalog>,
    pub stations: Arc<dyn StationResolver>,
    pub clock: Arc<dyn Clock>,
    pub logger: Arc<dyn Logger>,
}

impl Collaborators {
    /// Bundle where a single world object serves every map-side capability.
    pub fn from_world<W>(world: Arc<W>, clock: Arc<dyn Clock>, logger: Arc<dyn Logger>) -> Self
    where
        W: MapRegistry + MetadataStore + TileCatalog + StationResolver + 'static,
    {
        Self {
            maps: world.clone(),
            metadata: world.clone(),
            tiles: world.clone(),
            stations: world,
            clock,
            logger,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_order_by_x_then_y() {
        let c = TileCoord::new;
        let mut coords = vec![c(1, 0), c(0, 1), c(0, 0)];
        coords.sort();
        assert_eq!(coords, vec![c(0, 0), c(0, 1), c(1, 0)]);
    }

    #[test]
    fn display_formats() {
        assert_eq!(EntityId(3).to_string(), "e3");
        assert_eq!(TileCoord::new(-2, 5).to_string(), "(-2, 5)");
    }

    #[test]
    fn tile_record_serialization_roundtrip() {
        let record = TileRecord {
            coord: TileCoord::new(4, -1),
            tile: Tile::new(TileId(9)),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: TileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
