use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::params::ShadowMapParams;
use crate::error::JobError;
use crate::job::{Job, Step};
use crate::log_debug;
use crate::map::{Collaborators, EntityId, Tile, TileDef, TileRecord};

pub const SHADOW_NAME_PREFIX: &str = "Shadow side of ";

/// Source tiles converted per step unless configured otherwise.
pub const DEFAULT_TILES_PER_STEP: usize = 64;

/// Where the generator is in its work list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Look up the source grid and the target tile kind.
    Resolve,
    /// Create the target map and grid, seed the RNG.
    CreateMap,
    /// Convert source tiles starting at `cursor`.
    Mirror { cursor: usize },
    /// Write all records to the target grid in one batch.
    Apply,
    Done,
}

/// Handle to a finished shadow map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowMap {
    pub map: EntityId,
    pub grid: EntityId,
    pub name: String,
    pub tile_count: usize,
}

/// Mirrors a station's largest grid onto a fresh map, replacing every tile
/// with a single target kind.
///
/// Side effects are not rolled back on failure or cancellation: once
/// [`created_map`](Self::created_map) is `Some`, discarding it is up to the
/// caller.
pub struct ShadowMapJob {
    station: EntityId,
    params: ShadowMapParams,
    services: Collaborators,
    tiles_per_step: usize,
    stage: Stage,
    target: Option<TileDef>,
    station_name: String,
    source: Vec<TileRecord>,
    records: Vec<TileRecord>,
    rng: Option<StdRng>,
    map: Option<EntityId>,
    grid: Option<EntityId>,
    started: Duration,
}

impl ShadowMapJob {
    pub fn new(station: EntityId, params: ShadowMapParams, services: &Collaborators) -> Self {
        Self {
            station,
            params,
            services: services.clone(),
            tiles_per_step: DEFAULT_TILES_PER_STEP,
            stage: Stage::Resolve,
            target: None,
            station_name: String::new(),
            source: Vec::new(),
            records: Vec::new(),
            rng: None,
            map: None,
            grid: None,
            started: Duration::ZERO,
        }
    }

    /// Granularity of the mirror stage; clamped to at least one tile.
    pub fn with_tiles_per_step(mut self, tiles: usize) -> Self {
        self.tiles_per_step = tiles.max(1);
        self
    }

    pub fn station(&self) -> EntityId {
        self.station
    }

    pub fn params(&self) -> &ShadowMapParams {
        &self.params
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The target map, once created. Survives failure and cancellation.
    pub fn created_map(&self) -> Option<EntityId> {
        self.map
    }

    pub fn created_grid(&self) -> Option<EntityId> {
        self.grid
    }

    fn resolve(&mut self) -> Result<(), JobError> {
        self.started = self.services.clock.elapsed();
        let station = self.station;
        let Some(source_grid) = self.services.stations.largest_grid(station) else {
            return Err(JobError::MissingGrid { station });
        };
        let target = self.services.tiles.resolve(&self.params.tile_kind)?;

        self.source = self.services.maps.tiles(source_grid)?;
        self.records = Vec::with_capacity(self.source.len());
        let name = self.services.metadata.entity_name(station);
        self.station_name = name.unwrap_or_default();
        self.target = Some(target);
        self.stage = Stage::CreateMap;
        Ok(())
    }

    fn create_map(&mut self) -> Result<(), JobError> {
        let map = self.services.maps.create_map(true);
        self.map = Some(map);
        let name = format!("{SHADOW_NAME_PREFIX}{}", self.station_name);
        self.services.metadata.set_entity_name(map, name);

        log_debug!(
            self.services.logger,
            "Spawning station {} shadow side with seed {}",
            self.station_name,
            self.params.seed
        );
        // Seeded exactly once, before any tile is processed.
        self.rng = Some(StdRng::seed_from_u64(self.params.seed));

        self.grid = Some(self.services.maps.create_grid(map)?);
        self.stage = Stage::Mirror { cursor: 0 };
        Ok(())
    }

    fn mirror(&mut self, cursor: usize) -> Result<(), JobError> {
        let Some(target) = self.target.as_ref() else {
            return Err(JobError::Registry("tile kind not resolved".into()));
        };
        let Some(rng) = self.rng.as_mut() else {
            return Err(JobError::Registry("generator not seeded".into()));
        };

        let end = cursor.saturating_add(self.tiles_per_step);
        let end = end.min(self.source.len());
        for source in &self.source[cursor..end] {
            let variant = if self.params.tile_variation && target.variants > 1 {
                rng.gen_range(0..target.variants)
            } else {
                0
            };
            let tile = Tile {
                type_id: target.id,
                variant,
            };
            self.records.push(TileRecord {
                coord: source.coord,
                tile,
            });
        }

        self.stage = if end >= self.source.len() {
            Stage::Apply
        } else {
            Stage::Mirror { cursor: end }
        };
        Ok(())
    }

    fn apply(&mut self) -> Result<ShadowMap, JobError> {
        let (Some(map), Some(grid)) = (self.map, self.grid) else {
            return Err(JobError::Registry("target map was never created".into()));
        };
        let records = std::mem::take(&mut self.records);
        let tile_count = records.len();
        self.services.maps.set_tiles(grid, records)?;
        self.stage = Stage::Done;

        let took = self.services.clock.elapsed().saturating_sub(self.started);
        log_debug!(
            self.services.logger,
            "Applied {tile_count} tiles to {grid} in {took:?}"
        );

        Ok(ShadowMap {
            map,
            grid,
            name: format!("{SHADOW_NAME_PREFIX}{}", self.station_name),
            tile_count,
        })
    }
}

impl Job for ShadowMapJob {
    type Output = ShadowMap;

    fn name(&self) -> &str {
        "shadow_map"
    }

    fn step(&mut self) -> Result<Step<ShadowMap>, JobError> {
        match self.stage {
            Stage::Resolve => self.resolve().map(|_| Step::Continue),
            Stage::CreateMap => self.create_map().map(|_| Step::Continue),
            Stage::Mirror { cursor } => self.mirror(cursor).map(|_| Step::Continue),
            Stage::Apply => self.apply().map(Step::Done),
            Stage::Done => Err(JobError::Registry("shadow map already applied".into())),
        }
    }

    fn progress(&self) -> Option<(usize, usize)> {
        match self.stage {
            Stage::Resolve => None,
            Stage::Done => Some((self.source.len(), self.source.len())),
            _ => Some((self.records.len(), self.source.len())),
        }
    }
}

impl std::fmt::Debug for ShadowMapJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowMapJob")
            .field("station", &self.station)
            .field("params", &self.params)
            .field("stage", &self.stage)
            .field("map", &self.map)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}
