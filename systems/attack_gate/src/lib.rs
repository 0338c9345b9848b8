#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that limits how many enemies may hit the player per window.
//!
//! Enemies announce ready attacks; the gate admits at most `max_attackers` of
//! them per reset window and turns each admitted attack into a player damage
//! command. Refused attacks are dropped, and the enemy simply waits for its
//! next cooldown.

use std::time::Duration;

use horde_dash_core::{CombatTuning, Command, Event};
use tracing::{debug, trace};

/// Attack admission gate.
#[derive(Debug)]
pub struct AttackGate {
    cap: u32,
    reset_interval: Duration,
    elapsed: Duration,
    admitted: u32,
    refused: u64,
}

impl AttackGate {
    /// Creates a gate from the combat tuning.
    #[must_use]
    pub fn new(tuning: &CombatTuning) -> Self {
        Self {
            cap: tuning.max_attackers,
            reset_interval: tuning.attacker_reset_interval(),
            elapsed: Duration::ZERO,
            admitted: 0,
            refused: 0,
        }
    }

    /// Attacks admitted in the current window.
    #[must_use]
    pub fn admitted(&self) -> u32 {
        self.admitted
    }

    /// Attacks refused since the gate was created.
    #[must_use]
    pub fn refused(&self) -> u64 {
        self.refused
    }

    /// Consumes attack and clock events, emitting damage for admitted attacks.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.advance(*dt),
                Event::EnemyAttackReady {
                    enemy,
                    direction,
                    damage,
                } => {
                    if self.admitted >= self.cap {
                        self.refused = self.refused.saturating_add(1);
                        trace!(enemy = enemy.get(), "attack refused");
                        continue;
                    }
                    self.admitted += 1;
                    out.push(Command::DamagePlayer {
                        enemy: *enemy,
                        amount: *damage,
                        direction: *direction,
                    });
                }
                _ => {}
            }
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed < self.reset_interval {
            return;
        }
        if self.admitted > 0 {
            debug!(admitted = self.admitted, "attacker window reset");
        }
        self.elapsed = Duration::ZERO;
        self.admitted = 0;
    }
}
