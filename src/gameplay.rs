//! The shooter itself: a player fighter firing bullets and missiles at
//! choppers, with explosions on kills.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::collision::{AabbCollisionDetector, BruteForceAabb, CollisionStrategy, HitPair};
use crate::content::TextureHandle;
use crate::entities::{Chopper, Entity, EntityKind, Missile, Rect, Vec2};
use crate::error::GameError;
use crate::events::{Event, SoundCue};
use crate::input::{Cooldown, InputDevice, InputFrame, InputManager, InputMapper, KeyCode};
use crate::lifecycle::{DeferredQueue, LifePhase, Lifetime};
use crate::particles::ExplosionEmitter;
use crate::registry::EntityId;
use crate::state::{BaseGameState, GameState, GameTime, StateKind, StatePhase};
use crate::Result;

// ── Tunables ──────────────────────────────────────────────────────────────────

const BACKGROUND_TEXTURE: &str = "Barren";
const PLAYER_FIGHTER: &str = "fighter";
const BULLET_TEXTURE: &str = "bullet";
const MISSILE_TEXTURE: &str = "Missile";
const CHOPPER_TEXTURE: &str = "Chopper";
const EXPLOSION_TEXTURE: &str = "explosion";
const EXHAUST_TEXTURE: &str = "Cloud";
const BULLET_SOUND: &str = "bulletSound";
const MISSILE_SOUND: &str = "missileSound";
const SOUNDTRACK: [&str; 2] = ["FutureAmbient_1", "FutureAmbient_2"];

pub const BULLET_COOLDOWN: Duration = Duration::from_millis(200);
pub const MISSILE_COOLDOWN: Duration = Duration::from_secs(1);
/// Time between a chopper's death and its removal.
pub const ENEMY_REMOVAL_DELAY: Duration = Duration::from_millis(500);

/// Frames an explosion keeps emitting particles.
pub const EXPLOSION_ACTIVE_LENGTH: u32 = 75;
/// Frames after which an explosion is removed.
pub const MAX_EXPLOSION_AGE: u32 = 600;

pub const PLAYER_SPEED: f32 = 10.0;
/// Gap between the fighter and the bottom edge at spawn.
const PLAYER_BOTTOM_GAP: f32 = 30.0;
pub const CHOPPER_SPAWN: Vec2 = Vec2::new(300.0, 100.0);
const EXPLOSION_OFFSET: Vec2 = Vec2::new(40.0, 40.0);

const Z_BACKGROUND: i32 = -10;
const Z_PROJECTILE: i32 = 0;
const Z_ACTOR: i32 = 5;
const Z_EXPLOSION: i32 = 10;

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameplayCommand {
    GameExit,
    PlayerMoveLeft,
    PlayerMoveRight,
    PlayerShoots,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GameplayInputMapper;

impl InputMapper for GameplayInputMapper {
    type Command = GameplayCommand;

    fn commands(&self, frame: &InputFrame<'_>) -> Vec<GameplayCommand> {
        let mut commands = Vec::new();
        if frame.just_pressed(&KeyCode::Esc) {
            commands.push(GameplayCommand::GameExit);
        }
        if frame.any_down(&[KeyCode::Left, KeyCode::Char('a')]) {
            commands.push(GameplayCommand::PlayerMoveLeft);
        }
        if frame.any_down(&[KeyCode::Right, KeyCode::Char('d')]) {
            commands.push(GameplayCommand::PlayerMoveRight);
        }
        if frame.is_down(&KeyCode::Char(' ')) {
            commands.push(GameplayCommand::PlayerShoots);
        }
        commands
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GameplayAction {
    RemoveEnemy(EntityId),
}

#[derive(Clone, Copy, Debug, Default)]
struct Textures {
    bullet: TextureHandle,
    missile: TextureHandle,
    exhaust: TextureHandle,
    explosion: TextureHandle,
}

// ── State ─────────────────────────────────────────────────────────────────────

pub struct GameplayState<S = BruteForceAabb> {
    base: BaseGameState,
    input: Option<InputManager<GameplayInputMapper>>,
    strategy: S,
    rng: StdRng,
    textures: Textures,

    player: Option<EntityId>,
    bullets: Vec<EntityId>,
    missiles: Vec<EntityId>,
    explosions: Vec<EntityId>,
    enemies: Vec<EntityId>,

    bullet_cooldown: Cooldown,
    missile_cooldown: Cooldown,
    pending: DeferredQueue<GameplayAction>,
}

impl GameplayState<BruteForceAabb> {
    pub fn new(seed: u64) -> Self {
        GameplayState::with_strategy(seed, BruteForceAabb)
    }
}

impl<S: CollisionStrategy + Clone> GameplayState<S> {
    pub fn with_strategy(seed: u64, strategy: S) -> Self {
        GameplayState {
            base: BaseGameState::new(StateKind::Gameplay),
            input: None,
            strategy,
            rng: StdRng::seed_from_u64(seed),
            textures: Textures::default(),
            player: None,
            bullets: Vec::new(),
            missiles: Vec::new(),
            explosions: Vec::new(),
            enemies: Vec::new(),
            bullet_cooldown: Cooldown::new(BULLET_COOLDOWN),
            missile_cooldown: Cooldown::new(MISSILE_COOLDOWN),
            pending: DeferredQueue::new(),
        }
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn bullets(&self) -> &[EntityId] {
        &self.bullets
    }

    pub fn missiles(&self) -> &[EntityId] {
        &self.missiles
    }

    pub fn explosions(&self) -> &[EntityId] {
        &self.explosions
    }

    pub fn enemies(&self) -> &[EntityId] {
        &self.enemies
    }

    pub fn pending_actions(&self) -> usize {
        self.pending.len()
    }

    /// Place a chopper; `load_content` spawns the first one.
    pub fn spawn_chopper(&mut self, position: Vec2) -> EntityId {
        let texture = self.base.load_texture(CHOPPER_TEXTURE);
        let chopper = Entity::textured(EntityKind::Chopper(Chopper::default()), texture, position)
            .with_z(Z_ACTOR);
        let id = self.base.add_game_object(chopper);
        self.enemies.push(id);
        id
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    fn apply_command(&mut self, command: GameplayCommand, time: &GameTime) -> Result<()> {
        match command {
            GameplayCommand::GameExit => {
                info!("player quit");
                self.base.notify_event(&Event::GameQuit)?;
            }
            GameplayCommand::PlayerMoveLeft => self.move_player(-PLAYER_SPEED),
            GameplayCommand::PlayerMoveRight => self.move_player(PLAYER_SPEED),
            GameplayCommand::PlayerShoots => self.shoot(time)?,
        }
        Ok(())
    }

    fn move_player(&mut self, dx: f32) {
        let viewport = self.base.viewport();
        let Some(id) = self.player else {
            return;
        };
        let Some(player) = self.base.registry_mut().get_mut(id) else {
            return;
        };
        player.position.x += dx;
        // keep in bounds
        let max_x = (viewport.width - player.width).max(0.0);
        let max_y = (viewport.height - player.height).max(0.0);
        player.position.x = player.position.x.clamp(0.0, max_x);
        player.position.y = player.position.y.clamp(0.0, max_y);
    }

    fn shoot(&mut self, time: &GameTime) -> Result<()> {
        let Some(origin) = self.player_bounds() else {
            return Ok(());
        };

        if self.bullet_cooldown.try_fire(time.total) {
            let y = origin.y + 30.0;
            let center = origin.x + origin.width / 2.0;
            for x in [center - 40.0, center + 10.0] {
                let bullet =
                    Entity::textured(EntityKind::Bullet, self.textures.bullet, Vec2::new(x, y))
                        .with_z(Z_PROJECTILE);
                let id = self.base.add_game_object(bullet);
                self.bullets.push(id);
            }
            self.react_all(&Event::PlayerShootsBullets, time)?;
        }

        if self.missile_cooldown.try_fire(time.total) {
            let position = Vec2::new(origin.x + 33.0, origin.y - 25.0);
            let missile = Entity::textured(
                EntityKind::Missile(Missile::new(self.textures.exhaust)),
                self.textures.missile,
                position,
            )
            .with_z(Z_PROJECTILE);
            let id = self.base.add_game_object(missile);
            self.missiles.push(id);
            self.react_all(&Event::PlayerShootsMissile, time)?;
        }
        Ok(())
    }

    fn player_bounds(&self) -> Option<Rect> {
        self.player
            .and_then(|id| self.base.registry().get(id))
            .map(Entity::bounds)
    }

    // ── Simulation ───────────────────────────────────────────────────────────

    fn move_entities(&mut self) {
        let width = self.base.viewport().width;
        let registry = self.base.registry_mut();
        for id in self.bullets.iter().chain(&self.missiles).chain(&self.enemies) {
            if let Some(entity) = registry.get_mut(*id) {
                entity.advance(width);
            }
        }
        for id in &self.missiles {
            if let Some(missile) = registry.get_mut(*id) {
                missile.trail_exhaust(&mut self.rng);
            }
        }
    }

    fn update_explosions(&mut self) {
        let registry = self.base.registry_mut();
        for id in &self.explosions {
            let Some(emitter) = registry.get_mut(*id).and_then(Entity::as_explosion_mut) else {
                continue;
            };
            match emitter.update(&mut self.rng) {
                LifePhase::Active => {}
                LifePhase::Fading => emitter.deactivate(),
                LifePhase::Expired => registry.schedule_removal(*id),
            }
        }
    }

    fn detect_collisions(&mut self, time: &GameTime) -> Result<()> {
        let mut hits: Vec<(EntityId, Event, Option<Event>)> = Vec::new();

        let pairs = [
            (self.bullets.clone(), Event::BulletHitsChopper),
            (self.missiles.clone(), Event::MissileHitsChopper),
        ];
        for (projectiles, hit_event) in pairs {
            let detector = AabbCollisionDetector::with_strategy(self.strategy.clone(), projectiles);
            detector.detect_collisions(
                self.base.registry_mut(),
                &self.enemies,
                |HitPair { a, b_id, b, .. }| {
                    let changed = b.on_notify(&hit_event);
                    a.destroy();
                    hits.push((b_id, hit_event.clone(), changed));
                    Ok(())
                },
            )?;
        }

        for (enemy, hit_event, changed) in hits {
            self.base.play_sound(&hit_event)?;
            if let Some(changed) = changed {
                self.on_object_changed(enemy, changed, time)?;
            }
        }
        Ok(())
    }

    /// Broadcast and handle whatever the entities report back.
    fn react_all(&mut self, event: &Event, time: &GameTime) -> Result<()> {
        for (id, changed) in self.base.notify_event(event)? {
            self.on_object_changed(id, changed, time)?;
        }
        Ok(())
    }

    fn on_object_changed(&mut self, id: EntityId, event: Event, time: &GameTime) -> Result<()> {
        match event {
            Event::EnemyLostLife { current_life } if current_life <= 0 => {
                let Some(position) = self.base.registry().get(id).map(|e| e.position) else {
                    return Err(GameError::handler(&event, "changed enemy is not registered"));
                };
                debug!("enemy #{} down", id.raw());
                self.add_explosion(position - EXPLOSION_OFFSET);
                self.pending
                    .schedule(time.total + ENEMY_REMOVAL_DELAY, GameplayAction::RemoveEnemy(id));
                self.react_all(&Event::EnemyDestroyed, time)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn add_explosion(&mut self, position: Vec2) {
        let emitter = ExplosionEmitter::new(
            position,
            Lifetime::new(EXPLOSION_ACTIVE_LENGTH, MAX_EXPLOSION_AGE),
        );
        let explosion =
            Entity::textured(EntityKind::Explosion(emitter), self.textures.explosion, position)
                .with_z(Z_EXPLOSION);
        let id = self.base.add_game_object(explosion);
        self.explosions.push(id);
    }

    fn run_deferred(&mut self, time: &GameTime) {
        for action in self.pending.drain_due(time.total) {
            match action {
                GameplayAction::RemoveEnemy(id) => {
                    self.base.remove_game_object(id);
                    self.enemies.retain(|enemy| *enemy != id);
                }
            }
        }
    }
}

impl<S: CollisionStrategy + Clone> GameState for GameplayState<S> {
    fn base(&self) -> &BaseGameState {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseGameState {
        &mut self.base
    }

    fn set_input_manager(&mut self) {
        self.input = Some(InputManager::new(GameplayInputMapper));
    }

    fn load_content(&mut self) -> Result<()> {
        self.base.expect_phase(StatePhase::Initialized)?;
        self.textures = Textures {
            bullet: self.base.load_texture(BULLET_TEXTURE),
            missile: self.base.load_texture(MISSILE_TEXTURE),
            exhaust: self.base.load_texture(EXHAUST_TEXTURE),
            explosion: self.base.load_texture(EXPLOSION_TEXTURE),
        };

        let background_texture = self.base.load_texture(BACKGROUND_TEXTURE);
        let background = Entity::textured(EntityKind::Background, background_texture, Vec2::ZERO)
            .with_z(Z_BACKGROUND);
        self.base.add_game_object(background);

        let viewport = self.base.viewport();
        let fighter = self.base.load_texture(PLAYER_FIGHTER);
        let position = Vec2::new(
            viewport.width / 2.0 - fighter.width as f32 / 2.0,
            viewport.height - fighter.height as f32 - PLAYER_BOTTOM_GAP,
        );
        let player = Entity::textured(EntityKind::Player, fighter, position).with_z(Z_ACTOR);
        self.player = Some(self.base.add_game_object(player));

        self.spawn_chopper(CHOPPER_SPAWN);

        let bullet_sound = self.base.load_sound(BULLET_SOUND);
        let missile_sound = self.base.load_sound(MISSILE_SOUND);
        self.base
            .register_sound(&Event::PlayerShootsBullets, bullet_sound, SoundCue::default());
        self.base.register_sound(
            &Event::PlayerShootsMissile,
            missile_sound,
            SoundCue {
                volume: 0.4,
                pitch: -0.2,
                pan: 0.0,
            },
        );

        let tracks = SOUNDTRACK
            .iter()
            .map(|name| self.base.load_sound(name))
            .collect();
        self.base.set_soundtrack(tracks);
        Ok(())
    }

    fn handle_input(&mut self, input: &mut dyn InputDevice, time: &GameTime) -> Result<()> {
        let Some(mut manager) = self.input.take() else {
            return Err(GameError::Phase {
                state: StateKind::Gameplay,
                expected: StatePhase::Initialized,
                found: self.base.phase(),
            });
        };
        let result = manager.poll_and_dispatch(input, |command| self.apply_command(command, time));
        self.input = Some(manager);
        result
    }

    fn update_game_state(&mut self, time: &GameTime) -> Result<()> {
        self.move_entities();
        self.update_explosions();
        self.detect_collisions(time)?;
        self.run_deferred(time);
        Ok(())
    }

    fn on_pruned(&mut self, removed: &[EntityId]) {
        for list in [
            &mut self.bullets,
            &mut self.missiles,
            &mut self.explosions,
            &mut self.enemies,
        ] {
            list.retain(|id| !removed.contains(id));
        }
        if self.player.is_some_and(|id| removed.contains(&id)) {
            self.player = None;
        }
    }

    fn on_unload(&mut self) {
        let cancelled = self.pending.clear();
        if cancelled > 0 {
            debug!("cancelled {cancelled} pending actions");
        }
        self.input = None;
        self.player = None;
        self.bullets.clear();
        self.missiles.clear();
        self.explosions.clear();
        self.enemies.clear();
    }
}
