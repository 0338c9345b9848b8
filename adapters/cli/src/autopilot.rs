//! Scripted player input for headless runs.

use std::time::Duration;

use horde_dash_core::{Command, EnemyState, Vec2};
use horde_dash_world::{query, World};

/// Radius within which the autopilot picks an enemy to aim at.
const AIM_RADIUS: f32 = 20.0;
/// Angular speed of the circling walk in radians per second.
const TURN_RATE: f32 = 0.6;

/// Circles the arena, aims at the nearest enemy and dashes on a fixed cadence.
#[derive(Debug)]
pub(crate) struct Autopilot {
    dash_every: Duration,
    since_dash: Duration,
    elapsed: Duration,
}

impl Autopilot {
    pub(crate) fn new(dash_every: Duration) -> Self {
        Self {
            dash_every,
            since_dash: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Input for the next frame of length `dt`.
    pub(crate) fn plan(&mut self, world: &World, dt: Duration, out: &mut Vec<Command>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.since_dash = self.since_dash.saturating_add(dt);

        let player = query::player(world);
        let movement = Vec2::from_angle(self.elapsed.as_secs_f32() * TURN_RATE);
        let aim = nearest_enemy(world, player.position).unwrap_or(player.position + movement);
        out.push(Command::SetPlayerInput { movement, aim });

        if !self.dash_every.is_zero() && self.since_dash >= self.dash_every {
            self.since_dash = Duration::ZERO;
            out.push(Command::TriggerDash);
        }
    }
}

fn nearest_enemy(world: &World, from: Vec2) -> Option<Vec2> {
    query::enemy_view(world)
        .iter()
        .filter(|enemy| !enemy.culled && enemy.state != EnemyState::Launched)
        .map(|enemy| (enemy.position.distance_squared(from), enemy.position))
        .filter(|(distance_squared, _)| *distance_squared <= AIM_RADIUS * AIM_RADIUS)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, position)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_dash_core::Tuning;
    use horde_dash_world as world;

    fn world_with_enemies(positions: &[Vec2]) -> World {
        let mut world = World::new(Tuning::default());
        let mut events = Vec::new();
        for position in positions {
            world::apply(
                &mut world,
                Command::SpawnEnemy {
                    position: *position,
                },
                &mut events,
            );
        }
        world
    }

    #[test]
    fn aims_at_the_nearest_enemy_in_range() {
        let world = world_with_enemies(&[Vec2::new(8.0, 0.0), Vec2::new(0.0, -3.0)]);
        let mut autopilot = Autopilot::new(Duration::from_secs(1));
        let mut commands = Vec::new();

        autopilot.plan(&world, Duration::from_millis(16), &mut commands);

        assert!(matches!(
            commands.as_slice(),
            [Command::SetPlayerInput { aim, .. }] if *aim == Vec2::new(0.0, -3.0)
        ));
    }

    #[test]
    fn aims_ahead_when_nothing_is_close() {
        let world = world_with_enemies(&[Vec2::new(30.0, 0.0)]);
        let mut autopilot = Autopilot::new(Duration::from_secs(1));
        let mut commands = Vec::new();

        autopilot.plan(&world, Duration::ZERO, &mut commands);

        assert_eq!(
            commands,
            vec![Command::SetPlayerInput {
                movement: Vec2::X,
                aim: Vec2::X,
            }]
        );
    }

    #[test]
    fn dashes_on_the_configured_cadence() {
        let world = world_with_enemies(&[]);
        let mut autopilot = Autopilot::new(Duration::from_millis(500));
        let mut dashes = 0;

        for _ in 0..20 {
            let mut commands = Vec::new();
            autopilot.plan(&world, Duration::from_millis(100), &mut commands);
            dashes += commands
                .iter()
                .filter(|command| matches!(command, Command::TriggerDash))
                .count();
        }

        assert_eq!(dashes, 4);
    }
}
