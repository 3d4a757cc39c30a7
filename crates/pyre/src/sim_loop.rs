//! # Simulation Loop
//!
//! Owns the [`World`] and drives it one frame at a time. The phase order is
//! fixed: tick dispatch, then the caller's post-tick hook, then the
//! destruction reap. Destruction requested during tick or post-tick is
//! therefore always visible as "marked" for the remainder of the frame and
//! gone at the start of the next.

use std::time::{Duration, Instant};

use pyre_core::{World, WorldConfig};
use tracing::{info, warn};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Maximum allowed frame time before warning.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Delta time ceiling in seconds. A frame after a long stall (debugger,
/// suspend) steps the simulation by at most this much.
pub const MAX_DELTA_TIME: f32 = 0.1;

/// Configuration for the simulation loop.
#[derive(Clone, Debug)]
pub struct SimLoopConfig {
    /// World configuration.
    pub world: WorldConfig,
    /// Target frames per second.
    pub target_fps: u32,
    /// Enable per-frame budget warnings.
    pub enable_timing_logs: bool,
}

impl Default for SimLoopConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            target_fps: 60,
            enable_timing_logs: false,
        }
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Tick dispatch time in microseconds.
    pub tick_us: u64,
    /// Post-tick hook time in microseconds.
    pub post_tick_us: u64,
    /// Destruction reap time in microseconds.
    pub cleanup_us: u64,
    /// Frame number.
    pub frame: u64,
    /// Actors reaped this frame.
    pub actors_reaped: u64,
    /// Delta time fed to tick, in seconds, after clamping.
    pub delta_time: f32,
}

/// The frame orchestrator.
pub struct SimLoop {
    world: World,
    config: SimLoopConfig,
    frame_count: u64,
    last_frame_time: Instant,
    stats_accumulator: FrameStatsAccumulator,
}

impl SimLoop {
    /// Creates a simulation loop and its world.
    #[must_use]
    pub fn new(config: SimLoopConfig) -> Self {
        let world = World::new(config.world.clone());
        Self {
            world,
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Starts play across the world.
    pub fn start_play(&mut self) {
        info!(frame = self.frame_count, "Play started");
        self.world.dispatch_start_play();
    }

    /// Stops play across the world.
    pub fn stop_play(&mut self) {
        info!(frame = self.frame_count, "Play stopped");
        self.world.dispatch_stop_play();
    }

    /// Runs one frame with no post-tick hook.
    pub fn run_frame(&mut self) -> FrameStats {
        self.run_frame_with(|_, _| {})
    }

    /// Runs one frame: measures delta, dispatches tick, runs the caller's
    /// post-tick hook (physics sync, gameplay systems), then reaps marked
    /// actors and levels.
    ///
    /// Delta time since the previous frame is clamped to [`MAX_DELTA_TIME`]
    /// so a stall cannot step the simulation by seconds at once.
    pub fn run_frame_with<F>(&mut self, mut post_tick: F) -> FrameStats
    where
        F: FnMut(&mut World, f32),
    {
        let frame_start = Instant::now();
        let delta_time = frame_start
            .duration_since(self.last_frame_time)
            .as_secs_f32()
            .min(MAX_DELTA_TIME);
        self.last_frame_time = frame_start;

        let tick_start = Instant::now();
        self.world.dispatch_tick_update(delta_time);
        let tick_us = elapsed_us(tick_start);

        let post_start = Instant::now();
        post_tick(&mut self.world, delta_time);
        let post_tick_us = elapsed_us(post_start);

        let cleanup_start = Instant::now();
        let actors_reaped = self.world.cleanup_pending_destroy() as u64;
        let cleanup_us = elapsed_us(cleanup_start);

        let stats = FrameStats {
            total_us: elapsed_us(frame_start),
            tick_us,
            post_tick_us,
            cleanup_us,
            frame: self.frame_count,
            actors_reaped,
            delta_time,
        };
        self.end_frame(stats);
        stats
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        if self.config.enable_timing_logs && stats.total_us > MAX_FRAME_TIME.as_micros() as u64 {
            warn!(
                frame = stats.frame,
                frame_ms = stats.total_us as f64 / 1000.0,
                target_ms = TARGET_FRAME_TIME.as_micros() as f64 / 1000.0,
                "Frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Read access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Write access to the world, for spawning and scene mutation between
    /// frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }

    /// Logs a one-shot summary of accumulated frame timing.
    pub fn log_summary(&self) {
        let acc = &self.stats_accumulator;
        info!(
            frames = acc.frames_recorded,
            avg_ms = acc.avg_frame_ms(),
            avg_fps = acc.avg_fps(),
            max_ms = acc.max_frame_us as f64 / 1000.0,
            over_budget_pct = acc.over_budget_ratio() * 100.0,
            "Frame statistics"
        );
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_us(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of tick dispatch times.
    pub tick_us_sum: u64,
    /// Sum of cleanup times.
    pub cleanup_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Total actors reaped.
    pub actors_reaped: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            tick_us_sum: 0,
            cleanup_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            actors_reaped: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.tick_us_sum += stats.tick_us;
        self.cleanup_us_sum += stats.cleanup_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.actors_reaped += stats.actors_reaped;

        if stats.total_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyre_core::{ActorSpawnDesc, World};

    fn test_config() -> SimLoopConfig {
        SimLoopConfig {
            world: WorldConfig {
                name: "LoopTest".to_owned(),
                actor_arena_bytes: 64 * 1024,
                max_actors: 64,
                max_nodes: 128,
                event_capacity: 256,
                ..WorldConfig::default()
            },
            ..SimLoopConfig::default()
        }
    }

    #[test]
    fn test_loop_creation() {
        let sim = SimLoop::new(SimLoopConfig::default());
        assert_eq!(sim.frame_count(), 0);
        assert_eq!(sim.world().actor_count(), 0);
    }

    #[test]
    fn test_frame_cycle_records_stats() {
        let mut sim = SimLoop::new(test_config());

        let stats = sim.run_frame();
        assert_eq!(stats.frame, 0);
        assert_eq!(sim.frame_count(), 1);
        assert_eq!(sim.stats().frames_recorded, 1);

        sim.run_frame();
        assert_eq!(sim.frame_count(), 2);
    }

    #[test]
    fn test_destruction_reaped_at_frame_end() {
        let mut sim = SimLoop::new(test_config());
        let actor = sim.world_mut().spawn_actor("Doomed", ActorSpawnDesc::default());
        sim.world_mut().add_actor_to_level(actor, World::PERSISTENT_LEVEL);

        let stats = sim.run_frame_with(|world, _| {
            world.destroy_actor(actor);
        });

        assert_eq!(stats.actors_reaped, 1);
        assert!(sim.world().actor(actor).is_none());
    }

    #[test]
    fn test_delta_time_is_clamped() {
        let mut sim = SimLoop::new(test_config());
        // Simulate a long stall before the first frame.
        sim.last_frame_time = Instant::now() - Duration::from_secs(5);

        let stats = sim.run_frame();
        assert!(stats.delta_time <= MAX_DELTA_TIME);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new();
        for i in 0..100 {
            acc.record(FrameStats {
                total_us: 10_000 + (i * 100),
                tick_us: 5000,
                post_tick_us: 1000,
                cleanup_us: 2000,
                frame: i,
                actors_reaped: 1,
                delta_time: 0.016,
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert_eq!(acc.actors_reaped, 100);
        assert!(acc.avg_fps() > 50.0);
        assert!(acc.avg_fps() < 100.0);
    }
}
