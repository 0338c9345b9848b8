//! Explicit simulation loop tying the world to its systems.

use horde_dash_core::{Command, Event, Tuning};
use horde_dash_system_attack_gate::AttackGate;
use horde_dash_system_dash_strike::DashStrike;
use horde_dash_system_spawning::{Config, Spawning};
use horde_dash_world::{self as world, query, World};

use crate::presentation::Presentation;

/// Salt mixed into the tuning seed so spawn placement draws from its own stream.
const SPAWNER_SEED_SALT: u64 = 0x5a5a_5a5a_5a5a_5a5a;

/// Owns the world and every system, pumping commands until quiescent.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    spawning: Spawning,
    dash_strike: DashStrike,
    attack_gate: AttackGate,
    presentation: Presentation,
}

impl Simulation {
    pub(crate) fn new(tuning: Tuning) -> Self {
        let spawning = Spawning::new(Config::new(
            tuning.spawner.clone(),
            tuning.seed ^ SPAWNER_SEED_SALT,
        ));
        let attack_gate = AttackGate::new(&tuning.combat);
        Self {
            world: World::new(tuning),
            spawning,
            dash_strike: DashStrike::new(),
            attack_gate,
            presentation: Presentation::default(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn spawning(&self) -> &Spawning {
        &self.spawning
    }

    pub(crate) fn attack_gate(&self) -> &AttackGate {
        &self.attack_gate
    }

    pub(crate) fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Applies an adapter command and lets every system react to the fallout.
    pub(crate) fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        let mut commands = Vec::new();
        while !events.is_empty() {
            self.presentation.observe(&events);

            let player = query::player(&self.world);
            let camera = query::camera(&self.world);
            let proximity = query::proximity(&self.world);
            self.dash_strike.handle(&events, &proximity, &mut commands);
            self.attack_gate.handle(&events, &mut commands);
            self.spawning
                .handle(&events, &player, camera, &proximity, &mut commands);

            events.clear();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}
