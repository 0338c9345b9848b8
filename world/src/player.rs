use std::time::Duration;

use horde_dash_core::{EnemyId, Event, PlayerSnapshot, PlayerTuning, Vec2};
use tracing::debug;

#[derive(Clone, Debug)]
struct Dash {
    direction: Vec2,
    remaining: Duration,
    check_timer: Duration,
}

/// Player avatar: walking, dashing and taking hits.
#[derive(Clone, Debug)]
pub(crate) struct Player {
    position: Vec2,
    velocity: Vec2,
    health: u32,
    max_health: u32,
    movement: Vec2,
    aim: Vec2,
    dash: Option<Dash>,
    invincibility: Duration,
    push: Vec2,
}

impl Player {
    pub(crate) fn new(tuning: &PlayerTuning) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            health: tuning.max_health,
            max_health: tuning.max_health,
            movement: Vec2::ZERO,
            aim: Vec2::ZERO,
            dash: None,
            invincibility: Duration::ZERO,
            push: Vec2::ZERO,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            velocity: self.velocity,
            health: self.health,
            max_health: self.max_health,
            dashing: self.is_dashing(),
            invincible: !self.invincibility.is_zero(),
        }
    }

    pub(crate) fn set_input(&mut self, movement: Vec2, aim: Vec2) {
        self.movement = if movement.is_finite() {
            movement.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
        if aim.is_finite() {
            self.aim = aim;
        }
    }

    /// Starts a dash toward the aim point unless one is running or the player is down.
    ///
    /// Aiming at the player yields a stationary dash that still sweeps.
    pub(crate) fn trigger_dash(&mut self, tuning: &PlayerTuning, out_events: &mut Vec<Event>) {
        if self.is_dashing() || self.health == 0 {
            debug!(dashing = self.is_dashing(), health = self.health, "dash request ignored");
            return;
        }

        let direction = (self.aim - self.position).normalize_or_zero();
        self.dash = Some(Dash {
            direction,
            remaining: tuning.dash_duration(),
            check_timer: Duration::ZERO,
        });
        out_events.push(Event::DashStarted {
            origin: self.position,
            direction,
        });
    }

    /// Moves the player, emitting dash sweeps and the dash end.
    ///
    /// Movement input only applies while `accepts_input` is set.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        accepts_input: bool,
        tuning: &PlayerTuning,
        out_events: &mut Vec<Event>,
    ) {
        let seconds = dt.as_secs_f32();
        self.invincibility = self.invincibility.saturating_sub(dt);

        let Some(dash) = self.dash.as_mut() else {
            let walk = if accepts_input {
                self.movement * tuning.move_speed
            } else {
                Vec2::ZERO
            };
            self.velocity = walk + self.push;
            self.push = Vec2::ZERO;
            self.position += self.velocity * seconds;
            return;
        };

        self.velocity = dash.direction * tuning.dash_speed;
        self.position += self.velocity * seconds;
        dash.remaining = dash.remaining.saturating_sub(dt);
        dash.check_timer = dash.check_timer.saturating_add(dt);

        let radius = tuning.dash_sweep_radius();
        if dash.check_timer >= tuning.dash_check_interval() {
            dash.check_timer = Duration::ZERO;
            out_events.push(Event::DashSweepDue {
                origin: self.position,
                radius,
                final_sweep: false,
            });
        }

        if dash.remaining.is_zero() {
            self.dash = None;
            self.velocity = Vec2::ZERO;
            out_events.push(Event::DashSweepDue {
                origin: self.position,
                radius,
                final_sweep: true,
            });
            out_events.push(Event::DashEnded {
                position: self.position,
            });
        }
    }

    /// Applies an admitted hit. Returns `true` when the hit defeated the player.
    pub(crate) fn take_damage(
        &mut self,
        enemy: EnemyId,
        amount: u32,
        direction: Vec2,
        tuning: &PlayerTuning,
        out_events: &mut Vec<Event>,
    ) -> bool {
        if self.health == 0 || amount == 0 {
            return false;
        }
        if !self.invincibility.is_zero() || self.is_dashing() {
            debug!(
                enemy = enemy.get(),
                dashing = self.is_dashing(),
                "hit ignored while protected"
            );
            return false;
        }

        let before = self.health;
        self.health = self.health.saturating_sub(amount);
        out_events.push(Event::PlayerDamaged {
            enemy,
            amount,
            health: self.health,
        });
        for remaining in (self.health..before).rev() {
            out_events.push(Event::HealthRemoved { remaining });
        }

        if self.health == 0 {
            return true;
        }

        self.push = direction.normalize_or_zero() * tuning.knockback_force;
        self.invincibility = tuning.invincibility_duration();
        false
    }
}
