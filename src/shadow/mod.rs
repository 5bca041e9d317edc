//! Shadow-map generation: a station's footprint mirrored onto a new map.
//!
//! [`ShadowMapJob`] is a [`Job`](crate::job::Job); wrap it in a
//! [`ResumableJob`](crate::job::ResumableJob) and hand it to a runner or
//! queue.

mod generator;
mod params;

pub use generator::{DEFAULT_TILES_PER_STEP, SHADOW_NAME_PREFIX, ShadowMap, ShadowMapJob, Stage};
pub use params::{DEFAULT_TILE_KIND, ShadowMapParams};
