use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use horde_dash_core::{
    CameraRect, Command, EnemyId, Event, LaunchTrigger, PlayerSnapshot, ProximityQuery, Tuning,
    Vec2,
};
use horde_dash_system_spawning::{Config, Spawning};
use horde_dash_world::{self as world, query, World};

const FRAME: Duration = Duration::from_micros(16_667);

struct Harness {
    world: World,
    spawning: Spawning,
    spawned: Vec<Vec2>,
}

impl Harness {
    fn new(tuning: Tuning) -> Self {
        let spawning = Spawning::new(Config::new(tuning.spawner.clone(), tuning.seed ^ 0x5a5a));
        Self {
            world: World::new(tuning),
            spawning,
            spawned: Vec::new(),
        }
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        let mut log = events.clone();

        while !events.is_empty() {
            let mut commands = Vec::new();
            let player = query::player(&self.world);
            let camera = query::camera(&self.world);
            self.spawning.handle(
                &events,
                &player,
                camera,
                &query::proximity(&self.world),
                &mut commands,
            );

            events.clear();
            for command in commands {
                if let Command::SpawnEnemy { position } = command {
                    self.spawned.push(position);
                }
                world::apply(&mut self.world, command, &mut events);
            }
            log.extend(events.iter().cloned());
        }
        log
    }

    fn run_for(&mut self, seconds: f32) -> Vec<Event> {
        let frames = (seconds / FRAME.as_secs_f32()).round() as usize;
        let mut log = Vec::new();
        for _ in 0..frames {
            log.extend(self.apply(Command::Tick { dt: FRAME }));
        }
        log
    }

    fn live_ids(&self) -> Vec<EnemyId> {
        query::enemy_view(&self.world)
            .iter()
            .filter(|snapshot| query::grid(&self.world).cell_of(snapshot.id).is_some())
            .map(|snapshot| snapshot.id)
            .collect()
    }
}

fn quiet_tuning() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.session.countdown = 0.0;
    tuning.spawner.initial_count = 40;
    tuning.spawner.wave_size = 10;
    tuning.spawner.max_active = 1_000;
    tuning
}

#[test]
fn opening_a_session_spawns_the_initial_wave_on_the_annulus() {
    let mut harness = Harness::new(quiet_tuning());

    let _ = harness.apply(Command::OpenSession);

    assert_eq!(harness.spawned.len(), 40);
    assert_eq!(query::live_enemy_count(&harness.world), 40);
    assert_eq!(harness.spawning.population().live(), 40);
    for position in &harness.spawned {
        let distance = position.length();
        assert!(
            (12.0 - 1e-3..=18.0 + 1e-3).contains(&distance),
            "spawn outside annulus: {distance}"
        );
    }
}

#[test]
fn periodic_waves_follow_the_interval() {
    let mut harness = Harness::new(quiet_tuning());
    let _ = harness.apply(Command::OpenSession);

    let _ = harness.run_for(1.4);
    assert_eq!(harness.spawned.len(), 40);

    let _ = harness.run_for(0.2);
    assert_eq!(harness.spawned.len(), 50);
}

#[test]
fn full_population_blocks_waves() {
    let mut tuning = quiet_tuning();
    tuning.spawner.initial_count = 100;
    tuning.spawner.max_active = 100;
    let mut harness = Harness::new(tuning);
    let _ = harness.apply(Command::OpenSession);
    assert_eq!(harness.spawned.len(), 100);

    let _ = harness.run_for(2.0);

    assert_eq!(harness.spawned.len(), 100, "cap must hold when the wave timer fires");
    assert_eq!(query::live_enemy_count(&harness.world), 100);
}

#[test]
fn initial_wave_is_clamped_to_the_cap() {
    let mut tuning = quiet_tuning();
    tuning.spawner.initial_count = 500;
    tuning.spawner.max_active = 120;
    let mut harness = Harness::new(tuning);

    let _ = harness.apply(Command::OpenSession);

    assert_eq!(harness.spawned.len(), 120);
}

#[test]
fn counter_tracks_every_removal_path() {
    let mut harness = Harness::new(quiet_tuning());
    let _ = harness.apply(Command::OpenSession);
    let ids = harness.live_ids();
    assert_eq!(ids.len(), 40);

    let _ = harness.apply(Command::DamageEnemy {
        enemy: ids[0],
        amount: 1,
    });
    let _ = harness.apply(Command::LaunchEnemy {
        enemy: ids[1],
        origin: Vec2::ZERO,
        trigger: LaunchTrigger::Sweep,
    });
    let _ = harness.apply(Command::LaunchEnemy {
        enemy: ids[2],
        origin: Vec2::ZERO,
        trigger: LaunchTrigger::Contact,
    });
    let _ = harness.apply(Command::LaunchEnemy {
        enemy: ids[2],
        origin: Vec2::ZERO,
        trigger: LaunchTrigger::Sweep,
    });
    let _ = harness.apply(Command::DamageEnemy {
        enemy: ids[1],
        amount: 1,
    });

    assert_eq!(harness.spawning.population().live(), 37);
    assert_eq!(query::live_enemy_count(&harness.world), 37);

    let _ = harness.run_for(3.0);
    assert_eq!(
        harness.spawning.population().live(),
        query::live_enemy_count(&harness.world)
    );
}

#[test]
fn game_over_stops_spawning() {
    let mut tuning = quiet_tuning();
    tuning.session.round_length = 0.5;
    let mut harness = Harness::new(tuning);
    let _ = harness.apply(Command::OpenSession);

    let log = harness.run_for(3.0);

    assert!(log
        .iter()
        .any(|event| matches!(event, Event::GameOver { .. })));
    assert_eq!(harness.spawned.len(), 40);
}

struct Sparse(usize);

impl ProximityQuery for Sparse {
    fn enemies_within(&self, _point: Vec2, _radius: f32, out: &mut Vec<EnemyId>) {
        out.clear();
        out.extend((0..self.0 as u32).map(EnemyId::new));
    }

    fn is_launchable(&self, enemy: EnemyId) -> bool {
        (enemy.get() as usize) < self.0
    }
}

fn dashing_player() -> PlayerSnapshot {
    PlayerSnapshot {
        position: Vec2::new(3.0, -2.0),
        velocity: Vec2::new(250.0, 0.0),
        health: 5,
        max_health: 5,
        dashing: true,
        invincible: false,
    }
}

fn opened_spawning(tuning: &Tuning) -> Spawning {
    let mut spawning = Spawning::new(Config::new(tuning.spawner.clone(), 99));
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::SessionOpened {
            countdown: Duration::ZERO,
        }],
        &dashing_player(),
        CameraRect::orthographic(Vec2::ZERO, 5.0, 16.0 / 9.0),
        &Sparse(0),
        &mut commands,
    );
    spawning
}

#[test]
fn sparse_dash_spawns_a_burst_just_outside_the_camera() {
    let mut tuning = quiet_tuning();
    tuning.spawner.initial_count = 0;
    let mut spawning = opened_spawning(&tuning);
    let player = dashing_player();
    let camera = CameraRect::orthographic(player.position, 5.0, 16.0 / 9.0);

    let mut commands = Vec::new();
    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(150),
        }],
        &player,
        camera,
        &Sparse(10),
        &mut commands,
    );

    assert_eq!(commands.len(), 20);
    for command in commands {
        let Command::SpawnEnemy { position } = command else {
            panic!("unexpected command {command:?}");
        };
        assert!(!camera.contains(position), "burst spawned on screen");
        let min = camera.min();
        let max = camera.max();
        let outside_by = (min.x - position.x)
            .max(position.x - max.x)
            .max(min.y - position.y)
            .max(position.y - max.y);
        assert!((outside_by - 2.0).abs() < 1e-3, "offset {outside_by}");
    }
}

#[test]
fn dense_surroundings_suppress_bursts() {
    let mut tuning = quiet_tuning();
    tuning.spawner.initial_count = 0;
    tuning.spawner.min_density = 5;
    let mut spawning = opened_spawning(&tuning);

    let mut commands = Vec::new();
    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(150),
        }],
        &dashing_player(),
        CameraRect::orthographic(Vec2::ZERO, 5.0, 16.0 / 9.0),
        &Sparse(5),
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    fn replay() -> u64 {
        let mut harness = Harness::new(quiet_tuning());
        let _ = harness.apply(Command::OpenSession);
        let _ = harness.apply(Command::SetPlayerInput {
            movement: Vec2::new(1.0, 0.5),
            aim: Vec2::new(20.0, 0.0),
        });
        let _ = harness.run_for(1.0);
        let _ = harness.apply(Command::TriggerDash);
        let _ = harness.run_for(2.0);

        let mut hasher = DefaultHasher::new();
        for position in &harness.spawned {
            position.x.to_bits().hash(&mut hasher);
            position.y.to_bits().hash(&mut hasher);
        }
        harness.spawning.population().live().hash(&mut hasher);
        hasher.finish()
    }

    assert_eq!(replay(), replay(), "replay diverged between runs");
}
