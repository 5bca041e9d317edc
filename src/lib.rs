//! Time-sliced cooperative job engine with a deterministic shadow-map
//! generator.
//!
//! Long procedural work is split into atomic steps and resumed across host
//! ticks, each resume bounded by a time budget measured on a caller-supplied
//! [`Clock`](clock::Clock). Jobs are cancellable and finish in a typed
//! [`Phase`](job::Phase).
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use shadowmap::clock::ManualClock;
//! use shadowmap::job::{JobRunner, Phase, ResumableJob, Unbounded};
//! use shadowmap::log::NoOpLogger;
//! use shadowmap::map::{Collaborators, InMemoryWorld, TileCoord};
//! use shadowmap::shadow::{ShadowMapJob, ShadowMapParams};
//! use tokio_util::sync::CancellationToken;
//!
//! let world = Arc::new(InMemoryWorld::with_default_tiles());
//! let station = world.spawn_station("Aurora");
//! world
//!     .add_station_grid(station, [(TileCoord::new(0, 0), "Steel")])
//!     .unwrap();
//!
//! let clock = Arc::new(ManualClock::new());
//! let services = Collaborators::from_world(world.clone(), clock.clone(), Arc::new(NoOpLogger));
//! let mut job = ResumableJob::new(
//!     ShadowMapJob::new(station, ShadowMapParams::new(42), &services),
//!     Duration::from_millis(2),
//!     CancellationToken::new(),
//! );
//!
//! let runner = JobRunner::new(clock, Arc::new(NoOpLogger));
//! let Phase::Completed(shadow) = runner.run_to_completion(&mut job, &mut Unbounded) else {
//!     panic!("generation failed");
//! };
//! assert_eq!(shadow.name, "Shadow side of Aurora");
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod job;
pub mod log;
pub mod map;
pub mod shadow;
