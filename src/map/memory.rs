//! In-memory world implementing every collaborator trait.
//!
//! Grids keep their tiles in a `BTreeMap`, so enumeration order is the
//! coordinate order and identical across runs.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use super::{
    EntityId, MapRegistry, MetadataStore, StationResolver, Tile, TileCatalog, TileCoord, TileDef,
    TileId, TileRecord,
};
use crate::error::JobError;

const DEFAULT_TILES: [(&str, u8); 4] = [
    ("Space", 1),
    ("Plating", 1),
    ("Steel", 4),
    ("FloorChromite", 4),
];

#[derive(Debug, Default)]
struct MapEntry {
    deferred_init: bool,
    grids: Vec<EntityId>,
}

#[derive(Debug, Default)]
struct GridEntry {
    tiles: BTreeMap<TileCoord, Tile>,
}

impl GridEntry {
    fn bounding_area(&self) -> i64 {
        let mut coords = self.tiles.keys();
        let Some(first) = coords.next() else {
            return 0;
        };
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for c in coords {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }
        (i64::from(max_x) - i64::from(min_x) + 1) * (i64::from(max_y) - i64::from(min_y) + 1)
    }
}

#[derive(Debug, Default)]
struct WorldState {
    next_id: u64,
    names: HashMap<EntityId, String>,
    maps: BTreeMap<EntityId, MapEntry>,
    grids: BTreeMap<EntityId, GridEntry>,
    stations: BTreeMap<EntityId, Vec<EntityId>>,
    catalog: BTreeMap<String, TileDef>,
}

impl WorldState {
    fn spawn(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }
}

/// Thread-safe world used by tests and the demo host.
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    state: Mutex<WorldState>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A world with a small station-flavored tile catalog.
    pub fn with_default_tiles() -> Self {
        let world = Self::new();
        for (name, variants) in DEFAULT_TILES {
            // Four kinds in an empty catalog stay far below the id limit.
            let _ = world.register_tile(name, variants);
        }
        world
    }

    /// Register a tile kind; re-registering a name returns the existing id.
    ///
    /// Fails once every [`TileId`] is taken.
    pub fn register_tile(&self, name: &str, variants: u8) -> Result<TileId, JobError> {
        let mut state = self.state.lock();
        if let Some(def) = state.catalog.get(name) {
            return Ok(def.id);
        }
        let Ok(raw) = u16::try_from(state.catalog.len()) else {
            let msg = format!("tile catalog is full, cannot register {name}");
            return Err(JobError::Registry(msg));
        };
        let id = TileId(raw);
        state.catalog.insert(
            name.to_string(),
            TileDef {
                id,
                name: name.to_string(),
                variants: variants.max(1),
            },
        );
        Ok(id)
    }

    pub fn tile_name(&self, id: TileId) -> Option<String> {
        self.state
            .lock()
            .catalog
            .values()
            .find(|def| def.id == id)
            .map(|def| def.name.clone())
    }

    pub fn spawn_station(&self, name: &str) -> EntityId {
        let mut state = self.state.lock();
        let station = state.spawn();
        state.names.insert(station, name.to_string());
        state.stations.insert(station, Vec::new());
        station
    }

    /// Attach a new grid to `station`, filled with the named tiles.
    pub fn add_station_grid<'a>(
        &self,
        station: EntityId,
        tiles: impl IntoIterator<Item = (TileCoord, &'a str)>,
    ) -> Result<EntityId, JobError> {
        let mut resolved = BTreeMap::new();
        for (coord, kind) in tiles {
            let def = self.resolve(kind)?;
            resolved.insert(coord, Tile::new(def.id));
        }

        let mut state = self.state.lock();
        if !state.stations.contains_key(&station) {
            return Err(JobError::Registry(format!("{station} is not a station")));
        }
        let grid = state.spawn();
        state.grids.insert(grid, GridEntry { tiles: resolved });
        if let Some(grids) = state.stations.get_mut(&station) {
            grids.push(grid);
        }
        Ok(grid)
    }

    pub fn map_exists(&self, map: EntityId) -> bool {
        self.state.lock().maps.contains_key(&map)
    }

    pub fn map_count(&self) -> usize {
        self.state.lock().maps.len()
    }

    pub fn is_deferred(&self, map: EntityId) -> Option<bool> {
        self.state.lock().maps.get(&map).map(|m| m.deferred_init)
    }

    pub fn grids_on(&self, map: EntityId) -> Vec<EntityId> {
        self.state
            .lock()
            .maps
            .get(&map)
            .map(|m| m.grids.clone())
            .unwrap_or_default()
    }

    /// Grid contents rendered as tile-kind names, for assertions and display.
    pub fn named_tiles(&self, grid: EntityId) -> Result<BTreeMap<TileCoord, String>, JobError> {
        let tiles = self.tiles(grid)?;
        Ok(tiles
            .into_iter()
            .map(|r| {
                let name = self
                    .tile_name(r.tile.type_id)
                    .unwrap_or_else(|| format!("#{}", r.tile.type_id.0));
                (r.coord, name)
            })
            .collect())
    }
}

impl MapRegistry for InMemoryWorld {
    fn create_map(&self, deferred_init: bool) -> EntityId {
        let mut state = self.state.lock();
        let map = state.spawn();
        state.maps.insert(
            map,
            MapEntry {
                deferred_init,
                grids: Vec::new(),
            },
        );
        map
    }

    fn create_grid(&self, map: EntityId) -> Result<EntityId, JobError> {
        let mut state = self.state.lock();
        if !state.maps.contains_key(&map) {
            return Err(JobError::Registry(format!("map {map} does not exist")));
        }
        let grid = state.spawn();
        state.grids.insert(grid, GridEntry::default());
        if let Some(entry) = state.maps.get_mut(&map) {
            entry.grids.push(grid);
        }
        Ok(grid)
    }

    fn tiles(&self, grid: EntityId) -> Result<Vec<TileRecord>, JobError> {
        let state = self.state.lock();
        let entry = state
            .grids
            .get(&grid)
            .ok_or_else(|| JobError::Registry(format!("grid {grid} does not exist")))?;
        Ok(entry
            .tiles
            .iter()
            .map(|(coord, tile)| TileRecord {
                coord: *coord,
                tile: *tile,
            })
            .collect())
    }

    fn set_tiles(&self, grid: EntityId, tiles: Vec<TileRecord>) -> Result<(), JobError> {
        let mut state = self.state.lock();
        let entry = state
            .grids
            .get_mut(&grid)
            .ok_or_else(|| JobError::Registry(format!("grid {grid} does not exist")))?;
        entry
            .tiles
            .extend(tiles.into_iter().map(|r| (r.coord, r.tile)));
        Ok(())
    }

    fn delete_map(&self, map: EntityId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.maps.remove(&map) {
            for grid in entry.grids {
                state.grids.remove(&grid);
                state.names.remove(&grid);
            }
            state.names.remove(&map);
        }
    }
}

impl MetadataStore for InMemoryWorld {
    fn entity_name(&self, entity: EntityId) -> Option<String> {
        self.state.lock().names.get(&entity).cloned()
    }

    fn set_entity_name(&self, entity: EntityId, name: String) {
        self.state.lock().names.insert(entity, name);
    }
}

impl TileCatalog for InMemoryWorld {
    fn resolve(&self, kind: &str) -> Result<TileDef, JobError> {
        self.state
            .lock()
            .catalog
            .get(kind)
            .cloned()
            .ok_or_else(|| JobError::UnknownTileKind(kind.to_string()))
    }
}

impl StationResolver for InMemoryWorld {
    fn largest_grid(&self, station: EntityId) -> Option<EntityId> {
        let state = self.state.lock();
        let grids = state.stations.get(&station)?;
        let mut best: Option<(i64, EntityId)> = None;
        for &grid in grids {
            let Some(entry) = state.grids.get(&grid) else {
                continue;
            };
            let area = entry.bounding_area();
            // Strictly greater keeps the lowest id on ties, grids are in id order.
            if best.is_none_or(|(best_area, _)| area > best_area) {
                best = Some((area, grid));
            }
        }
        best.map(|(_, grid)| grid)
    }
}
