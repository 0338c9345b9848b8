#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Horde Dash.
//!
//! The world owns the spatial grid, the enemy registry, the player and the
//! session clock. Adapters and systems never mutate it directly: every change
//! goes through [`apply`], and the [`query`] module exposes read-only views.

mod enemies;
mod launch;
mod player;
mod session;
pub mod spatial;

use std::{collections::BTreeMap, time::Duration};

use horde_dash_core::{
    Command, EnemyId, Event, GameOverReason, LaunchTrigger, RemovalCause, Tuning, Vec2,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use enemies::{Enemy, Scratch, Step};
use launch::LaunchSequence;
use player::Player;
use session::Session;
use spatial::SpatialGrid;

/// Represents the authoritative Horde Dash world state.
#[derive(Debug)]
pub struct World {
    tuning: Tuning,
    rng: ChaCha8Rng,
    grid: SpatialGrid,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy: u32,
    player: Player,
    session: Session,
    tick_index: u64,
    scratch: Scratch,
}

impl World {
    /// Creates a world for the provided tuning with no session opened yet.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(tuning.seed),
            grid: SpatialGrid::new(&tuning.grid),
            enemies: BTreeMap::new(),
            next_enemy: 0,
            player: Player::new(&tuning.player),
            session: Session::new(&tuning.session),
            tick_index: 0,
            scratch: Scratch::default(),
            tuning,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.session.is_over() {
            trace!("tick ignored after game over");
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.session.advance(dt, out_events);
        if self.session.is_over() {
            return;
        }

        self.player.advance(
            dt,
            self.session.accepts_input(),
            &self.tuning.player,
            out_events,
        );

        enemies::advance_all(
            &mut self.enemies,
            &mut self.grid,
            &mut self.rng,
            Step {
                enemy: &self.tuning.enemy,
                launch: &self.tuning.launch,
                target: self.player.position(),
                tick_index: self.tick_index,
                dt,
            },
            &mut self.scratch,
            out_events,
        );

        trace!(
            tick = self.tick_index,
            enemies = self.enemies.len(),
            registered = self.grid.len(),
            "tick processed"
        );
    }

    fn spawn_enemy(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        if self.session.is_over() || !position.is_finite() {
            debug!(?position, "spawn request rejected");
            return;
        }

        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);
        let enemy = Enemy::spawn(id, position, &self.tuning.enemy, &mut self.rng);
        let variant = enemy.variant;
        let cell = self.grid.register(id, position);
        let _ = self.enemies.insert(id, enemy);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            position,
            variant,
            cell,
        });
    }

    fn launch_enemy(
        &mut self,
        id: EnemyId,
        origin: Vec2,
        trigger: LaunchTrigger,
        out_events: &mut Vec<Event>,
    ) {
        if self.session.is_over() {
            debug!(enemy = id.get(), "launch rejected after game over");
            return;
        }
        let Some(enemy) = self.enemies.get_mut(&id) else {
            debug!(enemy = id.get(), "launch target no longer exists");
            return;
        };
        if !enemy.is_launchable() {
            debug!(
                enemy = id.get(),
                culled = enemy.culled,
                "launch target is not in play"
            );
            return;
        }

        let sequence =
            LaunchSequence::begin(enemy.position, origin, &self.tuning.launch, &mut self.rng);
        out_events.push(Event::EnemyLaunched {
            enemy: id,
            velocity: sequence.velocity(),
            spin: sequence.spin(),
        });
        enemy.launch(sequence);
        let _ = self.grid.unregister(id);

        self.session.add_score(1, out_events);
        out_events.push(Event::EnemyRemoved {
            enemy: id,
            cause: RemovalCause::Launched(trigger),
        });
    }

    fn damage_enemy(&mut self, id: EnemyId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            debug!(enemy = id.get(), "damage target no longer exists");
            return;
        };
        if enemy.is_launched() {
            return;
        }

        enemy.health = enemy.health.saturating_sub(amount);
        if enemy.health > 0 {
            return;
        }

        let _ = self.enemies.remove(&id);
        let _ = self.grid.unregister(id);
        out_events.push(Event::EnemyRemoved {
            enemy: id,
            cause: RemovalCause::Killed,
        });
        out_events.push(Event::EnemyDestroyed { enemy: id });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::OpenSession => world.session.open(out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SetPlayerInput { movement, aim } => world.player.set_input(movement, aim),
        Command::TriggerDash => {
            if world.session.accepts_input() {
                world.player.trigger_dash(&world.tuning.player, out_events);
            } else {
                debug!(phase = ?world.session.phase(), "dash ignored outside the round");
            }
        }
        Command::SpawnEnemy { position } => world.spawn_enemy(position, out_events),
        Command::LaunchEnemy {
            enemy,
            origin,
            trigger,
        } => world.launch_enemy(enemy, origin, trigger, out_events),
        Command::ReportDashContact { enemy } => {
            let launchable = world
                .enemies
                .get(&enemy)
                .is_some_and(|record| record.is_launchable());
            if world.player.is_dashing() && launchable {
                out_events.push(Event::DashContact {
                    enemy,
                    origin: world.player.position(),
                });
            } else {
                debug!(enemy = enemy.get(), "contact ignored");
            }
        }
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
        Command::KnockbackEnemy { enemy, force } => {
            let accepted = world
                .enemies
                .get_mut(&enemy)
                .is_some_and(|record| record.apply_knockback(force, &world.tuning.enemy));
            if !accepted {
                debug!(enemy = enemy.get(), "knockback refused");
            }
        }
        Command::DamagePlayer {
            enemy,
            amount,
            direction,
        } => {
            if world.session.is_over() {
                return;
            }
            let defeated = world.player.take_damage(
                enemy,
                amount,
                direction,
                &world.tuning.player,
                out_events,
            );
            if defeated {
                world
                    .session
                    .end(GameOverReason::PlayerDefeated, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use horde_dash_core::{
        CameraRect, EnemyId, EnemySnapshot, EnemyView, PlayerSnapshot, ProximityQuery,
        SessionSnapshot, Tuning, Vec2,
    };

    use super::{spatial::SpatialGrid, World};

    /// Captures a read-only view of every enemy record, launched ones included.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let range = world.tuning.enemy.attack_range;
        EnemyView::from_snapshots(
            world
                .enemies
                .values()
                .map(|enemy| enemy.snapshot(world.grid.cell_of(enemy.id), range))
                .collect(),
        )
    }

    /// Captures the snapshot of a single enemy.
    #[must_use]
    pub fn enemy(world: &World, enemy: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(&enemy).map(|record| {
            record.snapshot(world.grid.cell_of(enemy), world.tuning.enemy.attack_range)
        })
    }

    /// Number of enemies still in play, excluding launched ones that are fading out.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world
            .enemies
            .values()
            .filter(|enemy| !enemy.is_launched())
            .count()
    }

    /// Captures the player's state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures the session phase and score.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            phase: world.session.phase(),
            score: world.session.score(),
            tick_index: world.tick_index,
        }
    }

    /// Visible rectangle of the camera following the player.
    #[must_use]
    pub fn camera(world: &World) -> CameraRect {
        CameraRect::orthographic(
            world.player.position(),
            world.tuning.camera.orthographic_size,
            world.tuning.camera.aspect,
        )
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Read-only access to the spatial grid.
    #[must_use]
    pub fn grid(world: &World) -> &SpatialGrid {
        &world.grid
    }

    /// Exposes radius queries over the spatial grid.
    #[must_use]
    pub fn proximity(world: &World) -> ProximityView<'_> {
        ProximityView { world }
    }

    /// Radius queries resolved through the spatial grid against current positions.
    #[derive(Clone, Copy, Debug)]
    pub struct ProximityView<'a> {
        world: &'a World,
    }

    impl ProximityQuery for ProximityView<'_> {
        fn enemies_within(&self, point: Vec2, radius: f32, out: &mut Vec<EnemyId>) {
            let enemies = &self.world.enemies;
            self.world.grid.query_radius_into(
                point,
                radius,
                |enemy| enemies.get(&enemy).map(|record| record.position),
                out,
            );
        }

        fn is_launchable(&self, enemy: EnemyId) -> bool {
            self.world
                .enemies
                .get(&enemy)
                .is_some_and(|record| record.is_launchable())
        }
    }
}
