#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Dash simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots through [`ProximityQuery`] and the world's query module, and
//! respond exclusively with new command batches.

use std::time::Duration;

pub use glam::Vec2;

mod tuning;

pub use tuning::{
    CameraTuning, CombatTuning, EnemyTuning, GridTuning, LaunchTuning, PlayerTuning,
    SessionTuning, SpawnerTuning, Tuning, TuningError,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Opens a new session, starting the pre-round countdown.
    OpenSession,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the continuous input signals sampled for the player.
    SetPlayerInput {
        /// Desired movement direction; magnitude is clamped to one.
        movement: Vec2,
        /// World-space point the player is aiming at.
        aim: Vec2,
    },
    /// Edge-triggered dash request toward the current aim point.
    TriggerDash,
    /// Requests that a new enemy be created at the provided position.
    SpawnEnemy {
        /// World-space spawn position.
        position: Vec2,
    },
    /// Requests that an enemy be launched away from the provided origin.
    LaunchEnemy {
        /// Enemy targeted by the launch.
        enemy: EnemyId,
        /// Point the launch impulse radiates from, usually the player.
        origin: Vec2,
        /// Entry point that resolved the launch.
        trigger: LaunchTrigger,
    },
    /// Reports that the player's collider overlapped an enemy trigger volume.
    ReportDashContact {
        /// Enemy whose trigger volume was touched.
        enemy: EnemyId,
    },
    /// Applies direct damage to an enemy.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Hit points removed.
        amount: u32,
    },
    /// Applies a knockback impulse to an enemy.
    KnockbackEnemy {
        /// Enemy receiving the impulse.
        enemy: EnemyId,
        /// Impulse expressed as an initial velocity.
        force: Vec2,
    },
    /// Applies damage from an admitted enemy attack to the player.
    DamagePlayer {
        /// Enemy that landed the attack.
        enemy: EnemyId,
        /// Hit points removed.
        amount: u32,
        /// Direction the player is pushed toward.
        direction: Vec2,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a session opened and its countdown began.
    SessionOpened {
        /// Length of the countdown before the round starts.
        countdown: Duration,
    },
    /// Announces that the countdown elapsed and the round clock is running.
    SessionStarted {
        /// Length of the round.
        round: Duration,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created and registered in the spatial grid.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Spawn position.
        position: Vec2,
        /// Cosmetic variant rolled at spawn.
        variant: EnemyVariant,
        /// Grid cell the enemy was registered in.
        cell: CellId,
    },
    /// Reports that an enemy moved its membership between grid cells.
    EnemyRebucketed {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Cell the enemy belonged to before.
        from: CellId,
        /// Cell the enemy belongs to now.
        to: CellId,
    },
    /// Reports that an enemy left the simulation radius; its body and visuals are disabled.
    EnemyCulled {
        /// Enemy that was culled.
        enemy: EnemyId,
    },
    /// Reports that a culled enemy re-entered range; its body and visuals are enabled.
    EnemyRevealed {
        /// Enemy that was revealed.
        enemy: EnemyId,
        /// Cosmetic variant re-rolled on reveal.
        variant: EnemyVariant,
    },
    /// Reports that an enemy's attack cooldown expired within range of the player.
    EnemyAttackReady {
        /// Enemy that wants to attack.
        enemy: EnemyId,
        /// Unit direction from the enemy toward the player.
        direction: Vec2,
        /// Damage the attack would deal.
        damage: u32,
    },
    /// Announces the start of a dash.
    DashStarted {
        /// Player position when the dash began.
        origin: Vec2,
        /// Unit dash direction, or zero for a stationary dash.
        direction: Vec2,
    },
    /// Requests that dash resolution sweep the area around the player.
    DashSweepDue {
        /// Centre of the sweep.
        origin: Vec2,
        /// Radius of the sweep.
        radius: f32,
        /// Whether this is the closing sweep emitted as the dash ends.
        final_sweep: bool,
    },
    /// Announces the end of a dash.
    DashEnded {
        /// Player position when the dash ended.
        position: Vec2,
    },
    /// Reports that a dashing player touched an enemy trigger volume.
    DashContact {
        /// Enemy whose trigger was touched.
        enemy: EnemyId,
        /// Player position at the time of contact.
        origin: Vec2,
    },
    /// Confirms that an enemy was launched and left the simulation.
    EnemyLaunched {
        /// Launched enemy.
        enemy: EnemyId,
        /// Initial launch velocity.
        velocity: Vec2,
        /// Angular velocity in degrees per second.
        spin: f32,
    },
    /// Notifies population tracking that an enemy left play. Emitted exactly once per enemy.
    EnemyRemoved {
        /// Enemy that left play.
        enemy: EnemyId,
        /// Removal path.
        cause: RemovalCause,
    },
    /// Confirms that an enemy's record was destroyed.
    EnemyDestroyed {
        /// Destroyed enemy.
        enemy: EnemyId,
    },
    /// Presentation notification that the score changed.
    ScoreChanged {
        /// Score after the change.
        score: u32,
        /// Points added.
        delta: u32,
    },
    /// Reports that the player accepted damage.
    PlayerDamaged {
        /// Enemy that landed the attack.
        enemy: EnemyId,
        /// Hit points removed.
        amount: u32,
        /// Health remaining afterwards.
        health: u32,
    },
    /// Presentation notification that one health point was removed.
    HealthRemoved {
        /// Health remaining after the removal.
        remaining: u32,
    },
    /// Presentation notification that the session ended.
    GameOver {
        /// Reason the session ended.
        reason: GameOverReason,
        /// Final score.
        score: u32,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a single spatial grid cell, `column + row * cells_per_row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    /// Creates a cell identifier from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Cosmetic sprite variant applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyVariant {
    /// Regular sprite.
    Normal,
    /// Rare shiny sprite.
    HoloFoil,
}

/// Behaviour currently driving an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// Moving toward the player.
    Chasing,
    /// Holding position within attack range.
    Attacking,
    /// Pushed by an impulse; normal behaviour is suspended.
    KnockedBack,
    /// Launched by a dash and fading out.
    Launched,
}

/// Entry point that resolved a launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaunchTrigger {
    /// Periodic or closing dash sweep around the player.
    Sweep,
    /// Trigger-volume contact reported while dashing.
    Contact,
}

/// Reason an enemy left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Health dropped to zero.
    Killed,
    /// Launched by the player's dash.
    Launched(LaunchTrigger),
}

/// Reason a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The round clock ran out.
    TimeUp,
    /// The player's health reached zero.
    PlayerDefeated,
}

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionPhase {
    /// No session has been opened yet.
    Idle,
    /// Counting down before the round starts; player input is ignored.
    Countdown {
        /// Time left on the countdown.
        remaining: Duration,
    },
    /// Round in progress.
    Running {
        /// Time left on the round clock.
        remaining: Duration,
    },
    /// Session ended; ticks are ignored.
    Over {
        /// Reason the session ended.
        reason: GameOverReason,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Current world position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Grid cell recorded at the last re-bucket, if registered.
    pub cell: Option<CellId>,
    /// Behaviour currently driving the enemy.
    pub state: EnemyState,
    /// Whether simulation and visuals are disabled by distance culling.
    pub culled: bool,
    /// Remaining hit points.
    pub health: u32,
    /// Cosmetic variant.
    pub variant: EnemyVariant,
    /// Launch fade alpha, one unless launched.
    pub alpha: f32,
    /// Launch scale factor, one unless launched.
    pub scale: f32,
}

/// Read-only snapshot describing all enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Finds the snapshot of the provided enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the player's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current world position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Remaining hit points.
    pub health: u32,
    /// Maximum hit points.
    pub max_health: u32,
    /// Whether a dash is in progress.
    pub dashing: bool,
    /// Whether damage is currently ignored after a hit.
    pub invincible: bool,
}

impl PlayerSnapshot {
    /// Reports whether the player still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Immutable representation of the session clock and score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Current score.
    pub score: u32,
    /// Number of ticks processed.
    pub tick_index: u64,
}

/// Axis-aligned rectangle covering the camera's visible area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRect {
    center: Vec2,
    half_extents: Vec2,
}

impl CameraRect {
    /// Creates a rectangle from its centre and half extents.
    #[must_use]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Derives the visible rectangle of an orthographic camera.
    ///
    /// `orthographic_size` is half the visible height; the width follows from `aspect`.
    #[must_use]
    pub fn orthographic(center: Vec2, orthographic_size: f32, aspect: f32) -> Self {
        let half_height = orthographic_size.abs();
        Self::new(center, Vec2::new(half_height * aspect.abs(), half_height))
    }

    /// Centre of the rectangle.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Half width and half height of the rectangle.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Lower-left corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Upper-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Reports whether the point lies inside or on the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Radius queries against the live enemy population.
///
/// Implemented by the world's read-only proximity view so that systems can
/// query the spatial index without depending on the world crate.
pub trait ProximityQuery {
    /// Writes the enemies whose current position lies within `radius` of `point` into `out`.
    ///
    /// `out` is cleared first. Ordering is deterministic for identical world states.
    fn enemies_within(&self, point: Vec2, radius: f32, out: &mut Vec<EnemyId>);

    /// Reports whether the enemy is still in play: alive, simulated and not launched.
    fn is_launchable(&self, enemy: EnemyId) -> bool;

    /// Counts the enemies whose current position lies within `radius` of `point`.
    fn count_within(&self, point: Vec2, radius: f32) -> usize {
        let mut scratch = Vec::new();
        self.enemies_within(point, radius, &mut scratch);
        scratch.len()
    }
}
