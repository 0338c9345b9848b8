//! Designer-tunable parameters and their validation.
//!
//! Times are stored as seconds so that tuning files stay readable; the
//! accessors convert them into [`Duration`] values for the simulation.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Complete set of tuning parameters for one simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed for every random stream in the simulation.
    pub seed: u64,
    /// Spatial grid layout.
    pub grid: GridTuning,
    /// Enemy behaviour parameters.
    pub enemy: EnemyTuning,
    /// Player movement, health and dash parameters.
    pub player: PlayerTuning,
    /// Launch sequence parameters.
    pub launch: LaunchTuning,
    /// Spawner population control parameters.
    pub spawner: SpawnerTuning,
    /// Attack admission control parameters.
    pub combat: CombatTuning,
    /// Session clock parameters.
    pub session: SessionTuning,
    /// Camera parameters used for off-screen spawning.
    pub camera: CameraTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed_da54_0001,
            grid: GridTuning::default(),
            enemy: EnemyTuning::default(),
            player: PlayerTuning::default(),
            launch: LaunchTuning::default(),
            spawner: SpawnerTuning::default(),
            combat: CombatTuning::default(),
            session: SessionTuning::default(),
            camera: CameraTuning::default(),
        }
    }
}

impl Tuning {
    /// Checks every parameter against its documented range.
    pub fn validate(&self) -> Result<(), TuningError> {
        self.grid.validate()?;
        self.enemy.validate()?;
        self.player.validate()?;
        self.launch.validate()?;
        self.spawner.validate()?;
        self.combat.validate()?;
        self.session.validate()?;
        self.camera.validate()?;
        Ok(())
    }
}

/// Uniform grid covering the nominal world area, centred on the origin.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Width of the covered area in world units. Must be positive.
    pub width: f32,
    /// Height of the covered area in world units. Must be positive.
    pub height: f32,
    /// Total number of cells; the grid uses `floor(sqrt(partitions))` cells per row. At least one.
    pub partitions: u32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            partitions: 10_000,
        }
    }
}

impl GridTuning {
    fn validate(&self) -> Result<(), TuningError> {
        positive("grid.width", self.width)?;
        positive("grid.height", self.height)?;
        if self.partitions == 0 {
            return Err(TuningError::ZeroCount {
                field: "grid.partitions",
            });
        }
        Ok(())
    }
}

/// Enemy behaviour parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Chase speed in units per second.
    pub move_speed: f32,
    /// Distance at which the enemy stops and attacks.
    pub attack_range: f32,
    /// Seconds between attack attempts while in range.
    pub attack_cooldown: f32,
    /// Damage dealt per admitted attack.
    pub damage: u32,
    /// Hit points at spawn.
    pub health: u32,
    /// Seconds a knockback overrides normal behaviour.
    pub knockback_duration: f32,
    /// Exponential damping rate applied to knockback velocity.
    pub knockback_drag: f32,
    /// Knockback impulses weaker than this are scaled up to it.
    pub min_knockback_force: f32,
    /// Seconds between perception updates (direction, distance, re-bucket).
    pub perception_interval: f32,
    /// Radius of the separation neighbourhood.
    pub separation_radius: f32,
    /// Multiplier applied to the separation vector.
    pub separation_force: f32,
    /// Seconds between separation updates.
    pub separation_interval: f32,
    /// Maximum number of neighbours sampled per separation update.
    pub separation_sample: usize,
    /// Distance beyond which the enemy is culled.
    pub cull_distance: f32,
    /// Seconds between cull checks.
    pub cull_interval: f32,
    /// Number of tick phases enemies are staggered across. At least one.
    pub stagger_frames: u32,
    /// Probability of rolling the holo-foil variant, within `[0, 1]`.
    pub holo_foil_chance: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            attack_range: 1.0,
            attack_cooldown: 1.0,
            damage: 1,
            health: 1,
            knockback_duration: 0.5,
            knockback_drag: 3.0,
            min_knockback_force: 10.0,
            perception_interval: 0.2,
            separation_radius: 0.7,
            separation_force: 1.2,
            separation_interval: 0.5,
            separation_sample: 3,
            cull_distance: 25.0,
            cull_interval: 1.0,
            stagger_frames: 10,
            holo_foil_chance: 0.25,
        }
    }
}

impl EnemyTuning {
    /// Attack cooldown as a duration.
    #[must_use]
    pub fn attack_cooldown(&self) -> Duration {
        seconds(self.attack_cooldown)
    }

    /// Knockback duration as a duration.
    #[must_use]
    pub fn knockback_duration(&self) -> Duration {
        seconds(self.knockback_duration)
    }

    /// Perception interval as a duration.
    #[must_use]
    pub fn perception_interval(&self) -> Duration {
        seconds(self.perception_interval)
    }

    /// Separation interval as a duration.
    #[must_use]
    pub fn separation_interval(&self) -> Duration {
        seconds(self.separation_interval)
    }

    /// Cull check interval as a duration.
    #[must_use]
    pub fn cull_interval(&self) -> Duration {
        seconds(self.cull_interval)
    }

    fn validate(&self) -> Result<(), TuningError> {
        non_negative("enemy.move_speed", self.move_speed)?;
        non_negative("enemy.attack_range", self.attack_range)?;
        positive("enemy.attack_cooldown", self.attack_cooldown)?;
        if self.health == 0 {
            return Err(TuningError::ZeroCount {
                field: "enemy.health",
            });
        }
        non_negative("enemy.knockback_duration", self.knockback_duration)?;
        non_negative("enemy.knockback_drag", self.knockback_drag)?;
        non_negative("enemy.min_knockback_force", self.min_knockback_force)?;
        positive("enemy.perception_interval", self.perception_interval)?;
        non_negative("enemy.separation_radius", self.separation_radius)?;
        non_negative("enemy.separation_force", self.separation_force)?;
        positive("enemy.separation_interval", self.separation_interval)?;
        non_negative("enemy.cull_distance", self.cull_distance)?;
        positive("enemy.cull_interval", self.cull_interval)?;
        if self.stagger_frames == 0 {
            return Err(TuningError::ZeroCount {
                field: "enemy.stagger_frames",
            });
        }
        probability("enemy.holo_foil_chance", self.holo_foil_chance)?;
        Ok(())
    }
}

/// Player movement, health and dash parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Walking speed in units per second.
    pub move_speed: f32,
    /// Dash speed in units per second.
    pub dash_speed: f32,
    /// Seconds a dash lasts.
    pub dash_duration: f32,
    /// Seconds between dash sweeps while dashing.
    pub dash_check_interval: f32,
    /// Radius swept along the dash path.
    pub dash_path_radius: f32,
    /// Radius swept around the dash end point.
    pub dash_end_radius: f32,
    /// Hit points at the start of a session. At least one.
    pub max_health: u32,
    /// Speed of the push applied when the player is hit.
    pub knockback_force: f32,
    /// Seconds of invincibility after a hit.
    pub invincibility_duration: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            dash_speed: 250.0,
            dash_duration: 0.15,
            dash_check_interval: 0.02,
            dash_path_radius: 3.0,
            dash_end_radius: 4.0,
            max_health: 5,
            knockback_force: 5.0,
            invincibility_duration: 0.5,
        }
    }
}

impl PlayerTuning {
    /// Dash duration as a duration.
    #[must_use]
    pub fn dash_duration(&self) -> Duration {
        seconds(self.dash_duration)
    }

    /// Dash sweep interval as a duration.
    #[must_use]
    pub fn dash_check_interval(&self) -> Duration {
        seconds(self.dash_check_interval)
    }

    /// Invincibility window as a duration.
    #[must_use]
    pub fn invincibility_duration(&self) -> Duration {
        seconds(self.invincibility_duration)
    }

    /// Radius covered by each dash sweep, the larger of the path and end radii.
    #[must_use]
    pub fn dash_sweep_radius(&self) -> f32 {
        self.dash_path_radius.max(self.dash_end_radius)
    }

    fn validate(&self) -> Result<(), TuningError> {
        non_negative("player.move_speed", self.move_speed)?;
        non_negative("player.dash_speed", self.dash_speed)?;
        positive("player.dash_duration", self.dash_duration)?;
        positive("player.dash_check_interval", self.dash_check_interval)?;
        non_negative("player.dash_path_radius", self.dash_path_radius)?;
        non_negative("player.dash_end_radius", self.dash_end_radius)?;
        if self.max_health == 0 {
            return Err(TuningError::ZeroCount {
                field: "player.max_health",
            });
        }
        non_negative("player.knockback_force", self.knockback_force)?;
        non_negative("player.invincibility_duration", self.invincibility_duration)?;
        Ok(())
    }
}

/// Launch sequence parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LaunchTuning {
    /// Initial launch speed.
    pub force: f32,
    /// Weight of the upward bias added to the outward direction.
    pub upward_bias: f32,
    /// Maximum random spin in degrees per second.
    pub spin_speed: f32,
    /// Seconds from launch until the record is destroyed.
    pub duration: f32,
    /// Seconds into the launch when fading starts. Must be below `duration`.
    pub fade_start: f32,
    /// Scale reached at the end of the fade, within `[0, 1]`.
    pub min_scale: f32,
    /// Fraction of velocity kept per 1/60 s, within `[0, 1]`.
    pub velocity_retention: f32,
    /// Upward lift acceleration, fading out over the launch.
    pub lift: f32,
}

impl Default for LaunchTuning {
    fn default() -> Self {
        Self {
            force: 35.0,
            upward_bias: 2.0,
            spin_speed: 720.0,
            duration: 0.8,
            fade_start: 0.5,
            min_scale: 0.3,
            velocity_retention: 0.96,
            lift: 8.0,
        }
    }
}

impl LaunchTuning {
    /// Launch duration as a duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        seconds(self.duration)
    }

    fn validate(&self) -> Result<(), TuningError> {
        non_negative("launch.force", self.force)?;
        non_negative("launch.upward_bias", self.upward_bias)?;
        non_negative("launch.spin_speed", self.spin_speed)?;
        positive("launch.duration", self.duration)?;
        non_negative("launch.fade_start", self.fade_start)?;
        if self.fade_start >= self.duration {
            return Err(TuningError::Ordering {
                lower: "launch.fade_start",
                upper: "launch.duration",
            });
        }
        probability("launch.min_scale", self.min_scale)?;
        probability("launch.velocity_retention", self.velocity_retention)?;
        non_negative("launch.lift", self.lift)?;
        Ok(())
    }
}

/// Spawner population control parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    /// Enemies spawned when the session opens.
    pub initial_count: u32,
    /// Seconds between periodic waves.
    pub wave_interval: f32,
    /// Enemies per periodic wave.
    pub wave_size: u32,
    /// Inner radius of the spawn annulus around the player.
    pub min_spawn_distance: f32,
    /// Outer radius of the spawn annulus around the player.
    pub max_spawn_distance: f32,
    /// Hard cap on live enemies.
    pub max_active: u32,
    /// Radius around the dashing player used for density checks.
    pub density_radius: f32,
    /// Bursts spawn when fewer enemies than this are within the density radius.
    pub min_density: u32,
    /// Seconds between density checks while dashing.
    pub burst_check_interval: f32,
    /// Enemies per reactive burst.
    pub burst_size: u32,
    /// Distance beyond the camera edge at which bursts appear.
    pub offscreen_buffer: f32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            initial_count: 300,
            wave_interval: 1.5,
            wave_size: 80,
            min_spawn_distance: 12.0,
            max_spawn_distance: 18.0,
            max_active: 8_000,
            density_radius: 12.0,
            min_density: 1_000,
            burst_check_interval: 0.1,
            burst_size: 20,
            offscreen_buffer: 2.0,
        }
    }
}

impl SpawnerTuning {
    /// Wave interval as a duration.
    #[must_use]
    pub fn wave_interval(&self) -> Duration {
        seconds(self.wave_interval)
    }

    /// Burst check interval as a duration.
    #[must_use]
    pub fn burst_check_interval(&self) -> Duration {
        seconds(self.burst_check_interval)
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive("spawner.wave_interval", self.wave_interval)?;
        non_negative("spawner.min_spawn_distance", self.min_spawn_distance)?;
        non_negative("spawner.max_spawn_distance", self.max_spawn_distance)?;
        if self.min_spawn_distance > self.max_spawn_distance {
            return Err(TuningError::Ordering {
                lower: "spawner.min_spawn_distance",
                upper: "spawner.max_spawn_distance",
            });
        }
        non_negative("spawner.density_radius", self.density_radius)?;
        positive("spawner.burst_check_interval", self.burst_check_interval)?;
        non_negative("spawner.offscreen_buffer", self.offscreen_buffer)?;
        Ok(())
    }
}

/// Attack admission control parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Maximum attacks admitted per reset window.
    pub max_attackers: u32,
    /// Seconds per admission window.
    pub attacker_reset_interval: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_attackers: 50,
            attacker_reset_interval: 0.5,
        }
    }
}

impl CombatTuning {
    /// Admission window as a duration.
    #[must_use]
    pub fn attacker_reset_interval(&self) -> Duration {
        seconds(self.attacker_reset_interval)
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive(
            "combat.attacker_reset_interval",
            self.attacker_reset_interval,
        )
    }
}

/// Session clock parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Seconds of countdown before the round starts.
    pub countdown: f32,
    /// Seconds the round lasts.
    pub round_length: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            countdown: 3.0,
            round_length: 20.0,
        }
    }
}

impl SessionTuning {
    /// Countdown as a duration.
    #[must_use]
    pub fn countdown(&self) -> Duration {
        seconds(self.countdown)
    }

    /// Round length as a duration.
    #[must_use]
    pub fn round_length(&self) -> Duration {
        seconds(self.round_length)
    }

    fn validate(&self) -> Result<(), TuningError> {
        non_negative("session.countdown", self.countdown)?;
        positive("session.round_length", self.round_length)
    }
}

/// Camera parameters used to place off-screen spawns.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Half the visible height in world units.
    pub orthographic_size: f32,
    /// Width divided by height of the viewport.
    pub aspect: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            orthographic_size: 5.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl CameraTuning {
    fn validate(&self) -> Result<(), TuningError> {
        positive("camera.orthographic_size", self.orthographic_size)?;
        positive("camera.aspect", self.aspect)
    }
}

/// Reasons a tuning set is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// A value that must be positive and finite was not.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A value that must be non-negative and finite was not.
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A value that must lie in `[0, 1]` did not.
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A count that must be at least one was zero.
    #[error("{field} must be at least one")]
    ZeroCount {
        /// Offending field.
        field: &'static str,
    },
    /// Two related values are in the wrong order.
    #[error("{lower} must be less than {upper}")]
    Ordering {
        /// Field expected to be smaller.
        lower: &'static str,
        /// Field expected to be larger.
        upper: &'static str,
    },
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfUnitRange { field, value })
    }
}
