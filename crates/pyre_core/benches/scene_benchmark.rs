//! # Scene Core Benchmark
//!
//! Exercises the hot paths: arena churn, transform propagation through a
//! deep hierarchy, and tick dispatch over a populated world.
//!
//! Run with: `cargo bench --package pyre_core`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyre_core::{
    ActorSpawnDesc, AttachMode, BlockArena, Component, World, WorldConfig,
};
use pyre_shared::{Transform, Vec3};

struct Spinner;
impl Component for Spinner {
    fn on_tick_update(&mut self, delta_time: f32) {
        black_box(delta_time);
    }
}

fn bench_world(max_actors: usize) -> World {
    World::new(WorldConfig {
        name: "Bench".to_owned(),
        actor_arena_bytes: 16 * 1024 * 1024,
        max_actors,
        max_nodes: max_actors * 2,
        event_capacity: 65_536,
        ..WorldConfig::default()
    })
}


fn spawn_resident(world: &mut World, name: &str, desc: ActorSpawnDesc) -> pyre_core::ActorId {
    let id = world.spawn_actor(name, desc);
    world.add_actor_to_level(id, World::PERSISTENT_LEVEL);
    id
}

/// Benchmark: allocate/free churn through the block arena.
fn bench_arena_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_churn");

    for count in [64_usize, 512, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut arena = BlockArena::new("bench", 8 * 1024 * 1024, 16);
                let mut handles = Vec::with_capacity(count);
                for i in 0..count {
                    handles.push(arena.allocate(64 + (i % 8) * 32));
                }
                // Free every other block, then refill the holes.
                for handle in handles.iter().step_by(2) {
                    let _ = arena.deallocate(*handle);
                }
                for _ in 0..count / 2 {
                    black_box(arena.allocate(64));
                }
                arena.allocated_bytes()
            });
        });
    }

    group.finish();
}

/// Benchmark: one root write propagating through a deep chain.
fn bench_deep_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_propagation_depth");

    for depth in [16_usize, 64, 256] {
        let mut world = bench_world(depth + 1);
        let mut ids = Vec::with_capacity(depth);
        let root = spawn_resident(&mut world, "root", ActorSpawnDesc::default());
        ids.push(root);
        for i in 1..depth {
            let id = spawn_resident(&mut world, "link", ActorSpawnDesc::default());
            world.attach_actor(id, ids[i - 1], AttachMode::ResetTransform);
            ids.push(id);
        }
        let receiver = world.events();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut x = 0.0_f32;
            b.iter(|| {
                x += 0.1;
                world.set_actor_world_transform(
                    root,
                    Transform::from_position(Vec3::new(x, 0.0, 0.0)),
                );
                // Keep the channel from filling up mid-benchmark.
                receiver.drain().len()
            });
        });
    }

    group.finish();
}

/// Benchmark: tick dispatch over a wide, flat world.
fn bench_tick_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_dispatch");

    for count in [256_usize, 1024, 4096] {
        let mut world = bench_world(count);
        for _ in 0..count {
            let id = spawn_resident(&mut world, "ticker",
                ActorSpawnDesc {
                    wants_tick: true,
                    wants_start_stop_play: false,
                    ..ActorSpawnDesc::default()
                },
            );
            world.add_component(id, "spinner", Box::new(Spinner));
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                world.dispatch_tick_update(black_box(0.016));
            });
        });
    }

    group.finish();
}

/// Benchmark: spawn and reap a batch of actors end to end.
fn bench_spawn_destroy_cycle(c: &mut Criterion) {
    c.bench_function("spawn_destroy_256", |b| {
        let mut world = bench_world(512);
        let receiver = world.events();
        b.iter(|| {
            let mut ids = Vec::with_capacity(256);
            for _ in 0..256 {
                ids.push(spawn_resident(&mut world, "ephemeral",
                    ActorSpawnDesc::default(),
                ));
            }
            for id in &ids {
                world.destroy_actor(*id);
            }
            let reaped = world.cleanup_pending_destroy();
            receiver.drain();
            reaped
        });
    });
}

criterion_group!(
    benches,
    bench_arena_churn,
    bench_deep_propagation,
    bench_tick_dispatch,
    bench_spawn_destroy_cycle
);
criterion_main!(benches);
