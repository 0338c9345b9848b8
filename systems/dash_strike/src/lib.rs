#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves dash attacks into enemy launches.
//!
//! Sweeps requested by the world are answered with a radius query through
//! [`ProximityQuery`]; trigger-volume contacts reported while dashing are an
//! alternate entry point into the same launch protocol. Each enemy is launched
//! at most once per dash, and only while it is still in play.

use std::collections::BTreeSet;

use horde_dash_core::{Command, EnemyId, Event, LaunchTrigger, ProximityQuery, Vec2};
use tracing::{debug, trace};

/// Dash-attack resolver that reuses scratch buffers between sweeps.
#[derive(Debug, Default)]
pub struct DashStrike {
    launched: BTreeSet<EnemyId>,
    candidates: Vec<EnemyId>,
}

impl DashStrike {
    /// Creates a new resolver with an empty launched set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of enemies launched during the current dash.
    #[must_use]
    pub fn launched_this_dash(&self) -> usize {
        self.launched.len()
    }

    /// Consumes dash events and emits launch commands.
    pub fn handle<Q: ProximityQuery>(
        &mut self,
        events: &[Event],
        proximity: &Q,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::DashStarted { .. } => self.launched.clear(),
                Event::DashSweepDue {
                    origin,
                    radius,
                    final_sweep,
                } => {
                    self.sweep(*origin, *radius, proximity, out);
                    if *final_sweep {
                        debug!(launched = self.launched.len(), "dash resolved");
                    }
                }
                Event::DashContact { enemy, origin } => {
                    self.launch(*enemy, *origin, LaunchTrigger::Contact, proximity, out);
                }
                Event::DashEnded { .. } => self.launched.clear(),
                _ => {}
            }
        }
    }

    fn sweep<Q: ProximityQuery>(
        &mut self,
        origin: Vec2,
        radius: f32,
        proximity: &Q,
        out: &mut Vec<Command>,
    ) {
        let mut candidates = std::mem::take(&mut self.candidates);
        proximity.enemies_within(origin, radius, &mut candidates);
        trace!(candidates = candidates.len(), radius, "dash sweep");
        for enemy in candidates.iter().copied() {
            self.launch(enemy, origin, LaunchTrigger::Sweep, proximity, out);
        }
        self.candidates = candidates;
    }

    /// Culled candidates stay eligible, so a reveal later in the dash can still launch them.
    fn launch<Q: ProximityQuery>(
        &mut self,
        enemy: EnemyId,
        origin: Vec2,
        trigger: LaunchTrigger,
        proximity: &Q,
        out: &mut Vec<Command>,
    ) {
        if self.launched.contains(&enemy) {
            return;
        }
        if !proximity.is_launchable(enemy) {
            trace!(enemy = enemy.get(), "dash candidate not in play");
            return;
        }

        let _ = self.launched.insert(enemy);
        out.push(Command::LaunchEnemy {
            enemy,
            origin,
            trigger,
        });
    }
}
