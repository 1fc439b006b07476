//! Integration tests for pathfinding plus the walk pipeline: plan, pace,
//! submit, execute

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use duskhollow::core::config::SimulationConfig;
use duskhollow::core::types::Location;
use duskhollow::notify::{NullScripts, RecordingNotifier, SpectatorNotifier};
use duskhollow::pathfind;
use duskhollow::scheduler::EventScheduler;
use duskhollow::simulation::WalkCoordinator;
use duskhollow::world::creature::{BloodKind, Creature};
use duskhollow::world::item::Item;
use duskhollow::world::map::{InMemoryLoader, Map, TileAccessor};
use duskhollow::world::WorldContext;

fn world() -> (Arc<WorldContext>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let map = Map::new(Arc::new(InMemoryLoader::flat(64, 64, 7)));
    let (ctx, _rx) = WorldContext::new(
        SimulationConfig::default(),
        map,
        Arc::clone(&notifier) as Arc<dyn SpectatorNotifier>,
        Arc::new(NullScripts),
    );
    (ctx, notifier)
}

fn spawn(ctx: &WorldContext, at: Location) -> Arc<Creature> {
    let creature = Arc::new(Creature::new("wanderer", at, BloodKind::Blood));
    ctx.place_creature(Arc::clone(&creature)).unwrap();
    creature
}

#[tokio::test(start_paused = true)]
async fn test_found_path_is_walkable_end_to_end() {
    let (ctx, _) = world();
    let start = Location::new(5, 5, 7);
    let target = Location::new(12, 9, 7);

    // Wall segment between start and target with a gap at the south end.
    for y in 3..=10 {
        let wall = ctx.map.get_tile_at(Location::new(9, y, 7)).unwrap();
        wall.add_item(Item::stone_wall());
    }

    let path = pathfind::find_between(&ctx.map, start, target, 512);
    assert!(path.reached(target));

    let creature = spawn(&ctx, start);
    creature.start_walk(path.directions.clone());

    let scheduler = Arc::new(EventScheduler::new());
    let coordinator = Arc::new(WalkCoordinator::new());
    let (tx, rx) = watch::channel(false);
    let walk_task = tokio::spawn(Arc::clone(&coordinator).run(
        Arc::clone(&ctx),
        Arc::clone(&scheduler),
        rx.clone(),
    ));
    let sched_task = tokio::spawn(Arc::clone(&scheduler).run(Arc::clone(&ctx), rx));
    coordinator.signal_walk_available();

    // Generous budget: every step could be diagonal.
    let steps = path.directions.len() as u64;
    tokio::time::sleep(Duration::from_millis(1200 * steps + 100)).await;

    assert_eq!(creature.position(), target);
    tx.send(true).unwrap();
    walk_task.await.unwrap();
    sched_task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_blocked_target_walks_best_effort_then_cancels_nothing() {
    let (ctx, notifier) = world();
    let start = Location::new(5, 5, 7);
    let target = Location::new(10, 5, 7);

    // Box the target in completely.
    for dx in -1..=1 {
        for dy in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let tile = ctx
                .map
                .get_tile_at(Location::new(10 + dx, 5 + dy, 7))
                .unwrap();
            tile.add_item(Item::stone_wall());
        }
    }

    let path = pathfind::find_between(&ctx.map, start, target, 512);
    assert!(!path.reached(target));
    assert_ne!(path.end_location, start);

    let creature = spawn(&ctx, start);
    creature.start_walk(path.directions.clone());

    let scheduler = Arc::new(EventScheduler::new());
    let coordinator = Arc::new(WalkCoordinator::new());
    let (tx, rx) = watch::channel(false);
    let walk_task = tokio::spawn(Arc::clone(&coordinator).run(
        Arc::clone(&ctx),
        Arc::clone(&scheduler),
        rx.clone(),
    ));
    let sched_task = tokio::spawn(Arc::clone(&scheduler).run(Arc::clone(&ctx), rx));
    coordinator.signal_walk_available();

    let steps = path.directions.len() as u64;
    tokio::time::sleep(Duration::from_millis(1200 * steps + 100)).await;

    // Every step of the best-effort path was valid; no cancellation.
    assert_eq!(creature.position(), path.end_location);
    assert!(notifier.cancellations_for(creature.id).is_empty());
    tx.send(true).unwrap();
    walk_task.await.unwrap();
    sched_task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tile_blocked_mid_walk_cancels_remaining_plan() {
    let (ctx, notifier) = world();
    let creature = spawn(&ctx, Location::new(5, 5, 7));
    let path = pathfind::find_between(
        &ctx.map,
        Location::new(5, 5, 7),
        Location::new(9, 5, 7),
        512,
    );
    creature.start_walk(path.directions.clone());

    // Block a tile on the route after planning.
    let blocked = ctx.map.get_tile_at(Location::new(7, 5, 7)).unwrap();
    blocked.add_item(Item::stone_wall());

    let scheduler = Arc::new(EventScheduler::new());
    let coordinator = Arc::new(WalkCoordinator::new());
    let (tx, rx) = watch::channel(false);
    let walk_task = tokio::spawn(Arc::clone(&coordinator).run(
        Arc::clone(&ctx),
        Arc::clone(&scheduler),
        rx.clone(),
    ));
    let sched_task = tokio::spawn(Arc::clone(&scheduler).run(Arc::clone(&ctx), rx));
    coordinator.signal_walk_available();

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(creature.position(), Location::new(6, 5, 7));
    assert!(!creature.has_queued_steps());
    assert_eq!(notifier.cancellations_for(creature.id).len(), 1);
    tx.send(true).unwrap();
    walk_task.await.unwrap();
    sched_task.await.unwrap();
}

#[test]
fn test_search_budget_bounds_path_length() {
    let map = Map::new(Arc::new(InMemoryLoader::flat(64, 64, 7)));
    let path = pathfind::find_between(
        &map,
        Location::new(0, 0, 7),
        Location::new(60, 0, 7),
        8,
    );
    assert!(!path.reached(Location::new(60, 0, 7)));
    assert!(path.directions.len() <= 8);
}
