use std::time::Duration;

use horde_dash_core::{Event, GameOverReason, SessionPhase, SessionTuning};
use tracing::{debug, info};

/// Round clock and score.
#[derive(Clone, Debug)]
pub(crate) struct Session {
    phase: SessionPhase,
    score: u32,
    round_length: Duration,
    countdown: Duration,
}

impl Session {
    pub(crate) fn new(tuning: &SessionTuning) -> Self {
        Self {
            phase: SessionPhase::Idle,
            score: 0,
            round_length: tuning.round_length(),
            countdown: tuning.countdown(),
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn is_over(&self) -> bool {
        matches!(self.phase, SessionPhase::Over { .. })
    }

    pub(crate) fn accepts_input(&self) -> bool {
        matches!(self.phase, SessionPhase::Running { .. })
    }

    pub(crate) fn open(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.phase, SessionPhase::Idle) {
            debug!(phase = ?self.phase, "session already opened");
            return;
        }

        self.phase = SessionPhase::Countdown {
            remaining: self.countdown,
        };
        info!(countdown = ?self.countdown, "session opened");
        out_events.push(Event::SessionOpened {
            countdown: self.countdown,
        });
        if self.countdown.is_zero() {
            self.start(out_events);
        }
    }

    /// Advances the countdown or the round clock.
    pub(crate) fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        match self.phase {
            SessionPhase::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.start(out_events);
                } else {
                    self.phase = SessionPhase::Countdown { remaining };
                }
            }
            SessionPhase::Running { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.end(GameOverReason::TimeUp, out_events);
                } else {
                    self.phase = SessionPhase::Running { remaining };
                }
            }
            SessionPhase::Idle | SessionPhase::Over { .. } => {}
        }
    }

    /// Ends the session. Only the first call has an effect.
    pub(crate) fn end(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        if self.is_over() {
            return;
        }

        self.phase = SessionPhase::Over { reason };
        info!(?reason, score = self.score, "game over");
        out_events.push(Event::GameOver {
            reason,
            score: self.score,
        });
    }

    pub(crate) fn add_score(&mut self, delta: u32, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_add(delta);
        out_events.push(Event::ScoreChanged {
            score: self.score,
            delta,
        });
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        self.phase = SessionPhase::Running {
            remaining: self.round_length,
        };
        info!(round = ?self.round_length, "round started");
        out_events.push(Event::SessionStarted {
            round: self.round_length,
        });
    }
}
