//! Headless stand-in for the score, health and game-over displays.

use horde_dash_core::{Event, GameOverReason, RemovalCause};
use tracing::{debug, info};

/// Tracks what a HUD would show, driven purely by world events.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Presentation {
    score: u32,
    health: Option<u32>,
    launched: u64,
    killed: u64,
    outcome: Option<GameOverReason>,
}

impl Presentation {
    pub(crate) fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SessionStarted { round } => info!(?round, "round underway"),
                Event::ScoreChanged { score, delta } => {
                    self.score = *score;
                    debug!(score, delta, "score updated");
                }
                Event::EnemyLaunched { .. } => self.launched += 1,
                Event::EnemyRemoved {
                    cause: RemovalCause::Killed,
                    ..
                } => self.killed += 1,
                Event::HealthRemoved { remaining } => {
                    self.health = Some(*remaining);
                    info!(remaining, "health lost");
                }
                Event::GameOver { reason, score } => {
                    self.outcome = Some(*reason);
                    self.score = *score;
                    info!(?reason, score, launched = self.launched, "game over screen");
                }
                _ => {}
            }
        }
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    /// Health shown on the HUD, `None` until the first hit lands.
    pub(crate) fn health(&self) -> Option<u32> {
        self.health
    }

    pub(crate) fn launched(&self) -> u64 {
        self.launched
    }

    pub(crate) fn killed(&self) -> u64 {
        self.killed
    }

    pub(crate) fn outcome(&self) -> Option<GameOverReason> {
        self.outcome
    }
}
