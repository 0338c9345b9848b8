use std::time::Duration;

use horde_dash_core::{LaunchTuning, Vec2};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Frame length the velocity retention factor is expressed against.
const RETENTION_FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Fly-away sequence advanced each tick after an enemy is launched.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LaunchSequence {
    elapsed: Duration,
    velocity: Vec2,
    spin: f32,
    alpha: f32,
    scale: f32,
}

impl LaunchSequence {
    /// Starts a launch pushing the enemy away from `origin` with an upward bias.
    pub(crate) fn begin(
        position: Vec2,
        origin: Vec2,
        tuning: &LaunchTuning,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let outward = (position - origin).normalize_or_zero();
        let direction = (outward + Vec2::Y * tuning.upward_bias)
            .try_normalize()
            .unwrap_or(Vec2::Y);
        let spin = if tuning.spin_speed > 0.0 {
            rng.gen_range(-tuning.spin_speed..=tuning.spin_speed)
        } else {
            0.0
        };

        Self {
            elapsed: Duration::ZERO,
            velocity: direction * tuning.force,
            spin,
            alpha: 1.0,
            scale: 1.0,
        }
    }

    pub(crate) fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn spin(&self) -> f32 {
        self.spin
    }

    pub(crate) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(crate) fn scale(&self) -> f32 {
        self.scale
    }

    /// Advances the sequence, returning the displacement for this tick and
    /// whether the sequence has run its course.
    pub(crate) fn advance(&mut self, dt: Duration, tuning: &LaunchTuning) -> (Vec2, bool) {
        let seconds = dt.as_secs_f32();
        self.elapsed = self.elapsed.saturating_add(dt);

        let duration = tuning.duration.max(f32::EPSILON);
        let elapsed = self.elapsed.as_secs_f32();
        let progress = (elapsed / duration).min(1.0);

        self.velocity *= tuning
            .velocity_retention
            .powf(seconds / RETENTION_FRAME_SECONDS);
        self.velocity += Vec2::Y * (1.0 - progress) * tuning.lift * seconds;

        if elapsed >= tuning.fade_start {
            let window = (duration - tuning.fade_start).max(f32::EPSILON);
            let fade = ((elapsed - tuning.fade_start) / window).clamp(0.0, 1.0);
            self.alpha = 1.0 - fade;
            self.scale = 1.0 + (tuning.min_scale - 1.0) * fade;
        }

        (self.velocity * seconds, elapsed >= duration)
    }
}
