mod cli;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::Style;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use shadowmap::clock::{Clock, MonotonicClock};
use shadowmap::config::EngineConfig;
use shadowmap::job::{JobQueue, JobReport, JobRunner, Phase, ResumableJob, SleepTicks};
use shadowmap::log::TracingLogger;
use shadowmap::map::{
    Collaborators, EntityId, InMemoryWorld, MapRegistry, MetadataStore, TileCoord,
};
use shadowmap::shadow::{ShadowMapJob, ShadowMapParams};
use ui::JobProgress;

struct DemoArgs {
    seed: u64,
    width: i32,
    height: i32,
    budget_ms: Option<u64>,
    tiles_per_step: Option<usize>,
    tile_kind: Option<String>,
    variation: bool,
    cancel_after: Option<u32>,
    run_async: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = EngineConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Demo {
            seed,
            width,
            height,
            budget_ms,
            tiles_per_step,
            tile_kind,
            variation,
            cancel_after,
            run_async,
        } => demo(
            &config,
            DemoArgs {
                seed,
                width,
                height,
                budget_ms,
                tiles_per_step,
                tile_kind,
                variation,
                cancel_after,
                run_async,
            },
        ),
        Command::Batch { stations, seed } => batch(&config, stations, seed),
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A `width` x `height` station with a few holes punched in it.
fn build_station(world: &InMemoryWorld, name: &str, width: i32, height: i32) -> Result<EntityId> {
    let station = world.spawn_station(name);
    let tiles = (0..width)
        .flat_map(|x| (0..height).map(move |y| (x, y)))
        .filter(|&(x, y)| (x * 7 + y * 3) % 11 != 0)
        .map(|(x, y)| {
            let plating = (x + y) % 3 == 0;
            let kind = if plating { "Plating" } else { "Steel" };
            (TileCoord::new(x, y), kind)
        });
    world.add_station_grid(station, tiles)?;
    Ok(station)
}

fn demo(config: &EngineConfig, args: DemoArgs) -> Result<()> {
    if args.width <= 0 || args.height <= 0 {
        bail!(
            "station dimensions must be positive, got {}x{}",
            args.width,
            args.height
        );
    }

    let world = Arc::new(InMemoryWorld::with_default_tiles());
    let station = build_station(&world, "Outpost Kestrel", args.width, args.height)?;

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let services = Collaborators::from_world(
        world.clone(),
        clock.clone(),
        Arc::new(TracingLogger::new("shadow_map_job")),
    );

    let params = ShadowMapParams::new(args.seed)
        .with_tile_kind(args.tile_kind.unwrap_or_else(|| config.tile_kind.clone()))
        .with_tile_variation(args.variation || config.tile_variation);
    let budget = args
        .budget_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.budget());
    let token = CancellationToken::new();
    let mut job = ResumableJob::new(
        ShadowMapJob::new(station, params, &services)
            .with_tiles_per_step(args.tiles_per_step.unwrap_or(config.tiles_per_step)),
        budget,
        token.clone(),
    );

    let runner = JobRunner::new(clock, Arc::new(TracingLogger::new("job_runner")));
    let progress = JobProgress::start(job.name());

    if args.run_async {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(async {
            if let Some(resumes) = args.cancel_after {
                let token = token.clone();
                let delay = config.tick_interval() * resumes;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    token.cancel();
                });
            }
            runner.run_async(&mut job, config.tick_interval()).await;
        });
        progress.update(&job);
    } else {
        let mut ticks = SleepTicks::new(config.tick_interval());
        runner.run_observed(&mut job, &mut ticks, |j| {
            progress.update(j);
            if args.cancel_after.is_some_and(|n| j.resumes() >= n) {
                token.cancel();
            }
        });
    }

    progress.complete(job.phase());
    let report = JobReport::from_job(&job);

    match job.phase() {
        Phase::Completed(shadow) => {
            println!(
                "  {} -> {} ({} tiles on grid {})",
                world.entity_name(station).unwrap_or_default(),
                shadow.name,
                shadow.tile_count,
                shadow.grid
            );
        }
        _ => {
            if let Some(map) = job.job().created_map() {
                world.delete_map(map);
                progress.note(&format!("discarded partial map {map}"));
            }
        }
    }

    progress.print_report(&report)?;
    Ok(())
}

fn batch(config: &EngineConfig, stations: u32, seed: u64) -> Result<()> {
    let world = Arc::new(InMemoryWorld::with_default_tiles());
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let services = Collaborators::from_world(
        world.clone(),
        clock.clone(),
        Arc::new(TracingLogger::new("shadow_map_job")),
    );
    let mut queue = JobQueue::new(
        clock,
        config.queue_budget(),
        Arc::new(TracingLogger::new("job_queue")),
    );

    let mut pending = Vec::new();
    for i in 0..stations {
        let name = format!("Station {}", i + 1);
        let side = 16 + 8 * (i % 8) as i32;
        let station = build_station(&world, &name, side, side)?;
        let params = ShadowMapParams::new(seed.wrapping_add(u64::from(i)))
            .with_tile_kind(config.tile_kind.clone())
            .with_tile_variation(config.tile_variation);
        let generator = ShadowMapJob::new(station, params, &services)
            .with_tiles_per_step(config.tiles_per_step);
        let token = CancellationToken::new();
        let job = ResumableJob::new(generator, config.budget(), token);
        pending.push((name, queue.enqueue(job)));
    }

    let mut ticks = 0u64;
    while !queue.is_empty() {
        if ticks > 0 {
            std::thread::sleep(config.tick_interval());
        }
        queue.process();
        ticks += 1;
    }
    println!("  processed {stations} jobs in {ticks} ticks");

    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    for (name, mut rx) in pending {
        match rx.try_recv() {
            Ok(Ok(shadow)) => println!(
                "  {} {name}: {} ({} tiles)",
                green.apply_to("✓"),
                shadow.name,
                shadow.tile_count
            ),
            Ok(Err(cause)) => println!("  {} {name}: {cause}", red.apply_to("✗")),
            Err(_) => println!("  {} {name}: no result delivered", red.apply_to("?")),
        }
    }
    Ok(())
}
