//! Sandbox state for trying out effects in isolation: a lone chopper that
//! blows up on a timer.

use std::time::Duration;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::entities::{Chopper, Entity, EntityKind, Vec2};
use crate::error::GameError;
use crate::events::Event;
use crate::input::{InputDevice, InputFrame, InputManager, InputMapper, KeyCode};
use crate::lifecycle::{DeferredQueue, Lifetime};
use crate::particles::ExplosionEmitter;
use crate::registry::EntityId;
use crate::state::{BaseGameState, GameState, GameTime, StateKind, StatePhase};
use crate::Result;

const CLOUD_TEXTURE: &str = "Cloud";
const CHOPPER_TEXTURE: &str = "Chopper";

const CHOPPER_POSITION: Vec2 = Vec2::new(300.0, 100.0);
const EXPLOSION_POSITION: Vec2 = Vec2::new(280.0, 80.0);

pub const EXPLODE_AFTER: Duration = Duration::from_secs(2);
pub const CHOPPER_REMOVAL_DELAY: Duration = Duration::from_millis(500);
pub const EXPLOSION_ACTIVE_FOR: Duration = Duration::from_millis(1500);
/// Absolute simulation time at which the explosion goes away.
pub const EXPLOSION_REMOVE_AT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevCommand {
    DevQuit,
    StartGameplay,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DevInputMapper;

impl InputMapper for DevInputMapper {
    type Command = DevCommand;

    fn commands(&self, frame: &InputFrame<'_>) -> Vec<DevCommand> {
        let mut commands = Vec::new();
        if frame.just_pressed(&KeyCode::Esc) {
            commands.push(DevCommand::DevQuit);
        }
        if frame.just_pressed(&KeyCode::Enter) {
            commands.push(DevCommand::StartGameplay);
        }
        commands
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DevAction {
    RemoveChopper,
    DeactivateExplosion,
    RemoveExplosion,
}

pub struct DevState {
    base: BaseGameState,
    input: Option<InputManager<DevInputMapper>>,
    rng: StdRng,
    chopper: Option<EntityId>,
    explosion: Option<EntityId>,
    pending: DeferredQueue<DevAction>,
}

impl DevState {
    pub fn new(seed: u64) -> Self {
        DevState {
            base: BaseGameState::new(StateKind::Dev),
            input: None,
            rng: StdRng::seed_from_u64(seed),
            chopper: None,
            explosion: None,
            pending: DeferredQueue::new(),
        }
    }

    pub fn chopper(&self) -> Option<EntityId> {
        self.chopper
    }

    pub fn explosion(&self) -> Option<EntityId> {
        self.explosion
    }

    fn explode(&mut self, time: &GameTime) {
        let texture = self.base.load_texture(CLOUD_TEXTURE);
        let emitter = ExplosionEmitter::new(EXPLOSION_POSITION, Lifetime::unbounded());
        let explosion = Entity::textured(EntityKind::Explosion(emitter), texture, EXPLOSION_POSITION)
            .with_z(10);
        self.explosion = Some(self.base.add_game_object(explosion));

        let now = time.total;
        self.pending
            .schedule(now + CHOPPER_REMOVAL_DELAY, DevAction::RemoveChopper);
        self.pending
            .schedule(now + EXPLOSION_ACTIVE_FOR, DevAction::DeactivateExplosion);
        self.pending
            .schedule(EXPLOSION_REMOVE_AT.max(now), DevAction::RemoveExplosion);
    }

    fn explosion_mut(&mut self) -> Option<&mut ExplosionEmitter> {
        let id = self.explosion?;
        self.base.registry_mut().get_mut(id)?.as_explosion_mut()
    }

    fn run(&mut self, action: DevAction) {
        match action {
            DevAction::RemoveChopper => {
                if let Some(id) = self.chopper {
                    self.base.registry_mut().schedule_removal(id);
                }
            }
            DevAction::DeactivateExplosion => {
                if let Some(emitter) = self.explosion_mut() {
                    emitter.deactivate();
                }
            }
            DevAction::RemoveExplosion => {
                if let Some(id) = self.explosion {
                    self.base.registry_mut().schedule_removal(id);
                }
            }
        }
    }
}

impl GameState for DevState {
    fn base(&self) -> &BaseGameState {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseGameState {
        &mut self.base
    }

    fn set_input_manager(&mut self) {
        self.input = Some(InputManager::new(DevInputMapper));
    }

    fn load_content(&mut self) -> Result<()> {
        self.base.expect_phase(StatePhase::Initialized)?;
        let texture = self.base.load_texture(CHOPPER_TEXTURE);
        let chopper = Entity::textured(
            EntityKind::Chopper(Chopper::default()),
            texture,
            CHOPPER_POSITION,
        );
        self.chopper = Some(self.base.add_game_object(chopper));
        Ok(())
    }

    fn handle_input(&mut self, input: &mut dyn InputDevice, _time: &GameTime) -> Result<()> {
        let Some(mut manager) = self.input.take() else {
            return Err(GameError::Phase {
                state: StateKind::Dev,
                expected: StatePhase::Initialized,
                found: self.base.phase(),
            });
        };
        let result = manager.poll_and_dispatch(input, |command| {
            match command {
                DevCommand::DevQuit => {
                    info!("dev harness quit");
                    self.base.notify_event(&Event::GameQuit)?;
                }
                DevCommand::StartGameplay => self.base.switch_state(StateKind::Gameplay),
            }
            Ok(())
        });
        self.input = Some(manager);
        result
    }

    fn update_game_state(&mut self, time: &GameTime) -> Result<()> {
        if self.explosion.is_none() && time.total > EXPLODE_AFTER {
            self.explode(time);
        }

        for action in self.pending.drain_due(time.total) {
            self.run(action);
        }

        if let Some(id) = self.explosion {
            let registry = self.base.registry_mut();
            if let Some(emitter) = registry.get_mut(id).and_then(Entity::as_explosion_mut) {
                emitter.update(&mut self.rng);
            }
        }
        Ok(())
    }

    fn on_pruned(&mut self, removed: &[EntityId]) {
        if self.chopper.is_some_and(|id| removed.contains(&id)) {
            self.chopper = None;
        }
    }

    fn on_unload(&mut self) {
        self.pending.clear();
        self.input = None;
        self.chopper = None;
        self.explosion = None;
    }
}
