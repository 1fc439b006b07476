//! Headless world runner
//!
//! Boots a flat in-memory world, scatters wandering monsters, and drives
//! the simulation for a fixed number of ticks. Useful for soak runs and
//! watching the coordinator loops under load.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;

use duskhollow::combat::CombatProcessor;
use duskhollow::core::config::SimulationConfig;
use duskhollow::notify::{NullNotifier, NullScripts};
use duskhollow::scheduler::EventScheduler;
use duskhollow::simulation::{CombatCoordinator, SimulationClock, WalkCoordinator};
use duskhollow::world::map::{InMemoryLoader, Map};
use duskhollow::world::placement::scatter_monsters;
use duskhollow::world::WorldContext;

#[derive(Parser, Debug)]
#[command(name = "duskhollow")]
#[command(about = "Headless world simulation runner")]
struct Args {
    /// Number of simulation ticks to run (0 runs until interrupted)
    #[arg(long, default_value_t = 240)]
    ticks: u64,

    /// Number of wandering monsters to scatter
    #[arg(long, default_value_t = 50)]
    monsters: usize,

    /// World width and height in tiles
    #[arg(long, default_value_t = 256)]
    world_size: i32,

    /// Random seed for deterministic monster placement
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = SimulationConfig::default();
    if let Err(reason) = config.validate() {
        tracing::error!(%reason, "invalid configuration");
        std::process::exit(1);
    }

    tracing::info!(
        ticks = args.ticks,
        monsters = args.monsters,
        "starting duskhollow"
    );

    let floor = 7;
    let map = Map::new(Arc::new(InMemoryLoader::flat(
        args.world_size,
        args.world_size,
        floor,
    )));
    let (ctx, combat_rx) = WorldContext::new(
        config,
        map,
        Arc::new(NullNotifier),
        Arc::new(NullScripts),
    );

    scatter_monsters(
        &ctx,
        args.monsters,
        args.world_size,
        args.world_size,
        floor,
        args.seed,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Arc::new(EventScheduler::new());
    let walk = Arc::new(WalkCoordinator::new());
    let combat = Arc::new(CombatCoordinator::new());

    let scheduler_task = tokio::spawn(
        Arc::clone(&scheduler).run(Arc::clone(&ctx), shutdown_rx.clone()),
    );
    let walk_task = tokio::spawn(Arc::clone(&walk).run(
        Arc::clone(&ctx),
        Arc::clone(&scheduler),
        shutdown_rx.clone(),
    ));
    let combat_task = tokio::spawn(
        Arc::clone(&combat).run(Arc::clone(&ctx), shutdown_rx.clone()),
    );
    let processor_task = tokio::spawn(CombatProcessor::new().run(
        Arc::clone(&ctx),
        combat_rx,
        shutdown_rx.clone(),
    ));

    let tick_limit = (args.ticks > 0).then_some(args.ticks);
    let clock = SimulationClock::new(tick_limit);
    let ticks = tokio::select! {
        ticks = clock.run(
            Arc::clone(&ctx),
            Arc::clone(&scheduler),
            Arc::clone(&walk),
            Arc::clone(&combat),
            shutdown_rx,
        ) => ticks,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            0
        }
    };

    shutdown_tx.send(true).ok();
    let _ = tokio::join!(scheduler_task, walk_task, combat_task, processor_task);

    tracing::info!(
        ticks,
        creatures = ctx.registry.len(),
        sectors = ctx.map.loaded_sector_count(),
        "simulation finished"
    );
}
