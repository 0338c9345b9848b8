//! Enemy records and their throttled per-tick behaviour.

use std::{collections::BTreeMap, time::Duration};

use horde_dash_core::{
    CellId, EnemyId, EnemySnapshot, EnemyState, EnemyTuning, EnemyVariant, Event, LaunchTuning,
    Vec2,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::{launch::LaunchSequence, spatial::SpatialGrid};

/// Neighbours closer than this are treated as overlapping and ignored by separation.
const SEPARATION_OVERLAP_SQUARED: f32 = 0.01;

#[derive(Clone, Debug)]
pub(crate) enum Mode {
    Active,
    KnockedBack { remaining: Duration },
    Launched(LaunchSequence),
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) health: u32,
    pub(crate) variant: EnemyVariant,
    pub(crate) culled: bool,
    pub(crate) mode: Mode,
    frame_offset: u32,
    direction: Vec2,
    distance_squared: f32,
    separation: Vec2,
    perception_timer: Duration,
    separation_timer: Duration,
    cull_timer: Duration,
    attack_timer: Duration,
    displacement: Vec2,
    rebucket_due: bool,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        position: Vec2,
        tuning: &EnemyTuning,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let frame_offset = rng.gen_range(0..tuning.stagger_frames.max(1));
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            health: tuning.health,
            variant: roll_variant(tuning.holo_foil_chance, rng),
            culled: false,
            mode: Mode::Active,
            frame_offset,
            direction: Vec2::ZERO,
            distance_squared: f32::MAX,
            separation: Vec2::ZERO,
            perception_timer: random_phase(tuning.perception_interval(), rng),
            separation_timer: random_phase(tuning.separation_interval(), rng),
            cull_timer: random_phase(tuning.cull_interval(), rng),
            attack_timer: Duration::ZERO,
            displacement: Vec2::ZERO,
            rebucket_due: false,
        }
    }

    pub(crate) fn is_launched(&self) -> bool {
        matches!(self.mode, Mode::Launched(_))
    }

    /// Launch and knockback only affect enemies that are simulated and still in play.
    pub(crate) fn is_launchable(&self) -> bool {
        !self.culled && !self.is_launched()
    }

    pub(crate) fn state(&self, attack_range: f32) -> EnemyState {
        match self.mode {
            Mode::Launched(_) => EnemyState::Launched,
            Mode::KnockedBack { .. } => EnemyState::KnockedBack,
            Mode::Active if self.distance_squared <= attack_range * attack_range => {
                EnemyState::Attacking
            }
            Mode::Active => EnemyState::Chasing,
        }
    }

    pub(crate) fn snapshot(&self, cell: Option<CellId>, attack_range: f32) -> EnemySnapshot {
        let (alpha, scale) = match &self.mode {
            Mode::Launched(sequence) => (sequence.alpha(), sequence.scale()),
            _ => (1.0, 1.0),
        };
        EnemySnapshot {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
            cell,
            state: self.state(attack_range),
            culled: self.culled,
            health: self.health,
            variant: self.variant,
            alpha,
            scale,
        }
    }

    /// Starts a knockback; weak impulses are scaled up to the configured minimum.
    pub(crate) fn apply_knockback(&mut self, force: Vec2, tuning: &EnemyTuning) -> bool {
        if !self.is_launchable() {
            return false;
        }

        let velocity = if force.length() < tuning.min_knockback_force {
            force.normalize_or_zero() * tuning.min_knockback_force
        } else {
            force
        };
        self.velocity = velocity;
        self.mode = Mode::KnockedBack {
            remaining: tuning.knockback_duration(),
        };
        true
    }

    pub(crate) fn launch(&mut self, sequence: LaunchSequence) {
        self.velocity = sequence.velocity();
        self.mode = Mode::Launched(sequence);
    }
}

/// Per-tick inputs shared by every enemy update.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Step<'a> {
    pub(crate) enemy: &'a EnemyTuning,
    pub(crate) launch: &'a LaunchTuning,
    pub(crate) target: Vec2,
    pub(crate) tick_index: u64,
    pub(crate) dt: Duration,
}

/// Reusable buffers for the enemy update pass.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    order: Vec<EnemyId>,
    neighbours: Vec<EnemyId>,
    finished: Vec<EnemyId>,
}

/// Advances every enemy by one tick in id order.
///
/// Decisions are taken against the positions at the start of the tick; the
/// resulting displacements and re-buckets are applied in a second pass.
pub(crate) fn advance_all(
    enemies: &mut BTreeMap<EnemyId, Enemy>,
    grid: &mut SpatialGrid,
    rng: &mut ChaCha8Rng,
    step: Step<'_>,
    scratch: &mut Scratch,
    out_events: &mut Vec<Event>,
) {
    scratch.order.clear();
    scratch.order.extend(enemies.keys().copied());
    scratch.finished.clear();

    for index in 0..scratch.order.len() {
        let id = scratch.order[index];
        decide(id, enemies, grid, rng, step, scratch, out_events);
    }

    for index in 0..scratch.order.len() {
        let id = scratch.order[index];
        let Some(enemy) = enemies.get_mut(&id) else {
            continue;
        };
        enemy.position += std::mem::take(&mut enemy.displacement);
        if std::mem::take(&mut enemy.rebucket_due) {
            if let Some((from, to)) = grid.rebucket(id, enemy.position) {
                out_events.push(Event::EnemyRebucketed { enemy: id, from, to });
            }
        }
    }

    for index in 0..scratch.finished.len() {
        let id = scratch.finished[index];
        if enemies.remove(&id).is_some() {
            let _ = grid.unregister(id);
            trace!(enemy = id.get(), "launched enemy destroyed");
            out_events.push(Event::EnemyDestroyed { enemy: id });
        }
    }
}

/// Chooses one enemy's velocity for this tick without moving it.
fn decide(
    id: EnemyId,
    enemies: &mut BTreeMap<EnemyId, Enemy>,
    grid: &SpatialGrid,
    rng: &mut ChaCha8Rng,
    step: Step<'_>,
    scratch: &mut Scratch,
    out_events: &mut Vec<Event>,
) {
    let seconds = step.dt.as_secs_f32();
    let frames = step.enemy.stagger_frames.max(1);
    let separation_frames = (frames / 2).max(1);

    let Some(enemy) = enemies.get_mut(&id) else {
        return;
    };

    if let Mode::Launched(sequence) = &mut enemy.mode {
        let (displacement, finished) = sequence.advance(step.dt, step.launch);
        enemy.velocity = sequence.velocity();
        enemy.displacement = displacement;
        if finished {
            scratch.finished.push(id);
        }
        return;
    }

    if let Mode::KnockedBack { remaining } = &mut enemy.mode {
        *remaining = remaining.saturating_sub(step.dt);
        let expired = remaining.is_zero();
        let damping = (step.enemy.knockback_drag * seconds).clamp(0.0, 1.0);
        enemy.velocity = enemy.velocity.lerp(Vec2::ZERO, damping);
        enemy.displacement = enemy.velocity * seconds;
        enemy.rebucket_due = true;
        if expired {
            enemy.mode = Mode::Active;
            enemy.velocity = Vec2::ZERO;
        }
        return;
    }

    if step.tick_index % u64::from(frames) == u64::from(enemy.frame_offset) {
        enemy.cull_timer = enemy.cull_timer.saturating_add(step.dt * frames);
        if enemy.cull_timer >= step.enemy.cull_interval() {
            enemy.cull_timer = Duration::ZERO;
            check_culling(enemy, step, rng, out_events);
        }
    }

    if enemy.culled {
        return;
    }

    enemy.perception_timer = enemy.perception_timer.saturating_add(step.dt);
    if enemy.perception_timer >= step.enemy.perception_interval() {
        enemy.perception_timer = Duration::ZERO;
        let offset = step.target - enemy.position;
        enemy.distance_squared = offset.length_squared();
        enemy.direction = offset.normalize_or_zero();
        enemy.rebucket_due = true;
    }

    let mut separation_due = false;
    if step.tick_index % u64::from(separation_frames)
        == u64::from(enemy.frame_offset % separation_frames)
    {
        enemy.separation_timer = enemy
            .separation_timer
            .saturating_add(step.dt * separation_frames);
        if enemy.separation_timer >= step.enemy.separation_interval() {
            enemy.separation_timer = Duration::ZERO;
            separation_due = true;
        }
    }

    if separation_due {
        let position = enemy.position;
        let separation = separation_from_neighbours(
            id,
            position,
            enemies,
            grid,
            step.enemy,
            &mut scratch.neighbours,
        );
        let Some(enemy) = enemies.get_mut(&id) else {
            return;
        };
        enemy.separation = separation;
    }

    let Some(enemy) = enemies.get_mut(&id) else {
        return;
    };
    let push = enemy.separation * step.enemy.separation_force;
    let range = step.enemy.attack_range;
    if enemy.distance_squared <= range * range {
        enemy.velocity = push;
        enemy.attack_timer = enemy.attack_timer.saturating_add(step.dt);
        if enemy.attack_timer >= step.enemy.attack_cooldown() {
            enemy.attack_timer = Duration::ZERO;
            out_events.push(Event::EnemyAttackReady {
                enemy: id,
                direction: enemy.direction,
                damage: step.enemy.damage,
            });
        }
    } else {
        enemy.velocity = enemy.direction * step.enemy.move_speed + push;
    }
    enemy.displacement = enemy.velocity * seconds;
}

fn check_culling(
    enemy: &mut Enemy,
    step: Step<'_>,
    rng: &mut ChaCha8Rng,
    out_events: &mut Vec<Event>,
) {
    let cull_distance = step.enemy.cull_distance;
    let far = enemy.position.distance_squared(step.target) > cull_distance * cull_distance;
    if far && !enemy.culled {
        enemy.culled = true;
        enemy.velocity = Vec2::ZERO;
        out_events.push(Event::EnemyCulled { enemy: enemy.id });
    } else if !far && enemy.culled {
        enemy.culled = false;
        enemy.variant = roll_variant(step.enemy.holo_foil_chance, rng);
        out_events.push(Event::EnemyRevealed {
            enemy: enemy.id,
            variant: enemy.variant,
        });
    }
}

/// Averages the repulsion from a bounded sample of close neighbours.
fn separation_from_neighbours(
    id: EnemyId,
    position: Vec2,
    enemies: &BTreeMap<EnemyId, Enemy>,
    grid: &SpatialGrid,
    tuning: &EnemyTuning,
    neighbours: &mut Vec<EnemyId>,
) -> Vec2 {
    grid.query_radius_into(
        position,
        tuning.separation_radius,
        |other| enemies.get(&other).map(|enemy| enemy.position),
        neighbours,
    );

    let radius_squared = tuning.separation_radius * tuning.separation_radius;
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for other in neighbours
        .iter()
        .filter(|other| **other != id)
        .take(tuning.separation_sample)
    {
        let Some(neighbour) = enemies.get(other) else {
            continue;
        };
        let away = position - neighbour.position;
        let distance_squared = away.length_squared();
        if distance_squared > SEPARATION_OVERLAP_SQUARED && distance_squared < radius_squared {
            sum += away.normalize_or_zero();
            count += 1;
        }
    }

    if count == 0 {
        Vec2::ZERO
    } else {
        sum / count as f32
    }
}

pub(crate) fn roll_variant(holo_foil_chance: f32, rng: &mut ChaCha8Rng) -> EnemyVariant {
    if rng.gen::<f32>() < holo_foil_chance {
        EnemyVariant::HoloFoil
    } else {
        EnemyVariant::Normal
    }
}

fn random_phase(interval: Duration, rng: &mut ChaCha8Rng) -> Duration {
    if interval.is_zero() {
        Duration::ZERO
    } else {
        interval.mul_f32(rng.gen::<f32>())
    }
}
