#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population control for the enemy horde.
//!
//! The spawner tracks the live enemy population from world events, emits an
//! initial wave when a session opens, periodic waves while under the cap, and
//! reactive bursts just outside the camera when the dashing player runs out
//! of nearby enemies.

use std::{collections::BTreeSet, f32::consts::TAU, time::Duration};

use horde_dash_core::{
    CameraRect, Command, EnemyId, Event, PlayerSnapshot, ProximityQuery, SpawnerTuning, Vec2,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    tuning: SpawnerTuning,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from spawner tuning and a seed for spawn placement.
    #[must_use]
    pub const fn new(tuning: SpawnerTuning, rng_seed: u64) -> Self {
        Self { tuning, rng_seed }
    }
}

/// Live enemy population derived from spawn and removal notifications.
///
/// Tracking identities rather than a bare integer makes repeated or unknown
/// removals harmless, so the count never double-decrements or drops below zero.
#[derive(Clone, Debug, Default)]
pub struct PopulationCounter {
    live: BTreeSet<EnemyId>,
}

impl PopulationCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a confirmed spawn. Returns `false` if the enemy was already counted.
    pub fn record_spawn(&mut self, enemy: EnemyId) -> bool {
        self.live.insert(enemy)
    }

    /// Records a removal. Returns `false` if the enemy was not counted.
    pub fn record_removal(&mut self, enemy: EnemyId) -> bool {
        self.live.remove(&enemy)
    }

    /// Number of enemies currently alive.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.len()
    }
}

/// Pure system that emits enemy spawn commands.
#[derive(Debug)]
pub struct Spawning {
    tuning: SpawnerTuning,
    rng: ChaCha8Rng,
    population: PopulationCounter,
    wave_timer: Duration,
    burst_timer: Duration,
    active: bool,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            tuning: config.tuning,
            population: PopulationCounter::new(),
            wave_timer: Duration::ZERO,
            burst_timer: Duration::ZERO,
            active: false,
        }
    }

    /// Population counter maintained from world events.
    #[must_use]
    pub fn population(&self) -> &PopulationCounter {
        &self.population
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// Spawn commands emitted by earlier calls must have been applied before
    /// the next call, so that their confirmations arrive in `events`.
    pub fn handle<Q: ProximityQuery>(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        camera: CameraRect,
        proximity: &Q,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        let mut opened = false;
        for event in events {
            match event {
                Event::EnemySpawned { enemy, .. } => {
                    let _ = self.population.record_spawn(*enemy);
                }
                Event::EnemyRemoved { enemy, .. } => {
                    if !self.population.record_removal(*enemy) {
                        debug!(enemy = enemy.get(), "removal of uncounted enemy ignored");
                    }
                }
                Event::SessionOpened { .. } => opened = true,
                Event::GameOver { .. } => self.active = false,
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                _ => {}
            }
        }

        let mut budget = self.capacity();

        if opened && !self.active {
            self.active = true;
            self.wave_timer = Duration::ZERO;
            self.burst_timer = Duration::ZERO;
            let count =
                self.spawn_around(player.position, self.tuning.initial_count, &mut budget, out);
            info!(count, "initial wave spawned");
        }

        if !self.active || elapsed.is_zero() {
            return;
        }

        self.wave_timer = self.wave_timer.saturating_add(elapsed);
        if self.wave_timer >= self.tuning.wave_interval() && budget > 0 {
            self.wave_timer = Duration::ZERO;
            let count =
                self.spawn_around(player.position, self.tuning.wave_size, &mut budget, out);
            debug!(count, live = self.population.live(), "wave spawned");
        }

        if player.dashing {
            self.burst_timer = self.burst_timer.saturating_add(elapsed);
            if self.burst_timer >= self.tuning.burst_check_interval() {
                self.burst_timer = Duration::ZERO;
                self.check_burst(player.position, camera, proximity, &mut budget, out);
            }
        }
    }

    fn capacity(&self) -> usize {
        usize::try_from(self.tuning.max_active)
            .unwrap_or(usize::MAX)
            .saturating_sub(self.population.live())
    }

    fn check_burst<Q: ProximityQuery>(
        &mut self,
        centre: Vec2,
        camera: CameraRect,
        proximity: &Q,
        budget: &mut usize,
        out: &mut Vec<Command>,
    ) {
        if *budget == 0 {
            return;
        }

        let nearby = proximity.count_within(centre, self.tuning.density_radius);
        if nearby >= self.tuning.min_density as usize {
            return;
        }

        let count = clamp_count(self.tuning.burst_size, budget);
        for _ in 0..count {
            let position = self.outside_camera(camera);
            out.push(Command::SpawnEnemy { position });
        }
        debug!(count, nearby, "burst spawned outside the camera");
    }

    fn spawn_around(
        &mut self,
        centre: Vec2,
        requested: u32,
        budget: &mut usize,
        out: &mut Vec<Command>,
    ) -> usize {
        let count = clamp_count(requested, budget);
        for _ in 0..count {
            let position = centre + self.annulus_offset();
            out.push(Command::SpawnEnemy { position });
        }
        count
    }

    fn annulus_offset(&mut self) -> Vec2 {
        let angle = self.rng.gen_range(0.0..TAU);
        let distance = self
            .rng
            .gen_range(self.tuning.min_spawn_distance..=self.tuning.max_spawn_distance);
        Vec2::from_angle(angle) * distance
    }

    /// Picks a point on one of the four camera edges, pushed outward by the buffer.
    fn outside_camera(&mut self, camera: CameraRect) -> Vec2 {
        let min = camera.min();
        let max = camera.max();
        let buffer = self.tuning.offscreen_buffer;
        match self.rng.gen_range(0..4u8) {
            0 => Vec2::new(self.rng.gen_range(min.x..=max.x), max.y + buffer),
            1 => Vec2::new(self.rng.gen_range(min.x..=max.x), min.y - buffer),
            2 => Vec2::new(min.x - buffer, self.rng.gen_range(min.y..=max.y)),
            _ => Vec2::new(max.x + buffer, self.rng.gen_range(min.y..=max.y)),
        }
    }
}

fn clamp_count(requested: u32, budget: &mut usize) -> usize {
    let count = usize::try_from(requested).unwrap_or(usize::MAX).min(*budget);
    *budget -= count;
    count
}
