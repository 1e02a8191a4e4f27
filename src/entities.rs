/// Simulation entities: geometry, capability tags and per-kind data.
///
/// Entities are plain data owned by an `EntityRegistry`. The only behaviour
/// here is what an entity does to itself (moving one step, taking a hit);
/// everything that touches more than one entity lives in the game states.

use std::ops::{Add, AddAssign, Sub};

use rand::Rng;

use crate::content::TextureHandle;
use crate::events::Event;
use crate::particles::{ExhaustEmitter, ExplosionEmitter};

// ── Tunables ──────────────────────────────────────────────────────────────────

pub const BULLET_SPEED: f32 = 10.0;

pub const MISSILE_START_SPEED: f32 = 1.0;
pub const MISSILE_ACCELERATION: f32 = 0.2;
pub const MISSILE_MAX_SPEED: f32 = 12.0;

pub const CHOPPER_LIFE: i32 = 40;
pub const CHOPPER_SPEED: f32 = 2.0;
pub const BULLET_DAMAGE: i32 = 10;
pub const MISSILE_DAMAGE: i32 = 40;

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner, y grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

// ── Capabilities ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Subject to off-view pruning.
    pub movable: bool,
    /// Considered by the collision detector.
    pub collidable: bool,
    /// Reacts to hit events by losing life.
    pub damageable: bool,
}

impl Capabilities {
    pub const SCENERY: Capabilities = Capabilities {
        movable: false,
        collidable: false,
        damageable: false,
    };
    pub const ACTOR: Capabilities = Capabilities {
        movable: true,
        collidable: false,
        damageable: false,
    };
    pub const PROJECTILE: Capabilities = Capabilities {
        movable: true,
        collidable: true,
        damageable: false,
    };
    pub const ENEMY: Capabilities = Capabilities {
        movable: true,
        collidable: true,
        damageable: true,
    };
}

// ── Per-kind data ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Missile {
    pub speed: f32,
    pub exhaust: ExhaustEmitter,
}

impl Default for Missile {
    fn default() -> Self {
        Missile::new(TextureHandle::default())
    }
}

impl Missile {
    /// A missile at launch speed whose trail is drawn with `exhaust_texture`.
    pub fn new(exhaust_texture: TextureHandle) -> Self {
        Missile {
            speed: MISSILE_START_SPEED,
            exhaust: ExhaustEmitter::new(exhaust_texture),
        }
    }

    /// Accelerate and return the distance to travel upward this frame.
    pub fn step(&mut self) -> f32 {
        let distance = self.speed;
        self.speed = (self.speed + MISSILE_ACCELERATION).min(MISSILE_MAX_SPEED);
        distance
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chopper {
    pub life: i32,
    /// Horizontal velocity; the sign flips at the viewport edges.
    pub velocity: f32,
}

impl Default for Chopper {
    fn default() -> Self {
        Chopper {
            life: CHOPPER_LIFE,
            velocity: CHOPPER_SPEED,
        }
    }
}

impl Chopper {
    fn take_damage(&mut self, amount: i32) -> Event {
        self.life -= amount;
        Event::EnemyLostLife {
            current_life: self.life,
        }
    }
}

#[derive(Clone, Debug)]
pub enum EntityKind {
    Background,
    Player,
    Bullet,
    Missile(Missile),
    Chopper(Chopper),
    Explosion(ExplosionEmitter),
}

// ── Entity ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub z_order: i32,
    pub destroyed: bool,
    pub caps: Capabilities,
    pub texture: TextureHandle,
}

impl Entity {
    pub fn new(kind: EntityKind, position: Vec2, width: f32, height: f32) -> Self {
        let caps = match &kind {
            EntityKind::Background => Capabilities::SCENERY,
            EntityKind::Player => Capabilities::ACTOR,
            EntityKind::Bullet | EntityKind::Missile(_) => Capabilities::PROJECTILE,
            EntityKind::Chopper(_) => Capabilities::ENEMY,
            EntityKind::Explosion(_) => Capabilities::SCENERY,
        };
        Entity {
            kind,
            position,
            width,
            height,
            z_order: 0,
            destroyed: false,
            caps,
            texture: TextureHandle::default(),
        }
    }

    /// Entity sized after its texture.
    pub fn textured(kind: EntityKind, texture: TextureHandle, position: Vec2) -> Self {
        let mut entity = Entity::new(kind, position, texture.width as f32, texture.height as f32);
        entity.texture = texture;
        entity
    }

    pub fn with_z(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Background => "background",
            EntityKind::Player => "player",
            EntityKind::Bullet => "bullet",
            EntityKind::Missile(_) => "missile",
            EntityKind::Chopper(_) => "chopper",
            EntityKind::Explosion(_) => "explosion",
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn can_collide(&self) -> bool {
        self.caps.collidable && !self.destroyed
    }

    pub fn as_explosion(&self) -> Option<&ExplosionEmitter> {
        match &self.kind {
            EntityKind::Explosion(emitter) => Some(emitter),
            _ => None,
        }
    }

    pub fn as_explosion_mut(&mut self) -> Option<&mut ExplosionEmitter> {
        match &mut self.kind {
            EntityKind::Explosion(emitter) => Some(emitter),
            _ => None,
        }
    }

    pub fn as_missile(&self) -> Option<&Missile> {
        match &self.kind {
            EntityKind::Missile(missile) => Some(missile),
            _ => None,
        }
    }

    /// Puff exhaust out of the bottom centre of a missile. No-op for other kinds.
    pub fn trail_exhaust(&mut self, rng: &mut impl Rng) {
        let tail = Vec2::new(self.position.x + self.width / 2.0, self.position.y + self.height);
        if let EntityKind::Missile(missile) = &mut self.kind {
            missile.exhaust.update(tail, rng);
        }
    }

    pub fn life(&self) -> Option<i32> {
        match &self.kind {
            EntityKind::Chopper(chopper) => Some(chopper.life),
            _ => None,
        }
    }

    /// React to a gameplay event. Returns the entity's own change
    /// notification when the event altered it; unknown events are ignored.
    pub fn on_notify(&mut self, event: &Event) -> Option<Event> {
        if self.destroyed || !self.caps.damageable {
            return None;
        }
        let changed = match (&mut self.kind, event) {
            (EntityKind::Chopper(chopper), Event::BulletHitsChopper) => {
                chopper.take_damage(BULLET_DAMAGE)
            }
            (EntityKind::Chopper(chopper), Event::MissileHitsChopper) => {
                chopper.take_damage(MISSILE_DAMAGE)
            }
            _ => return None,
        };
        // A downed enemy drops out of collision immediately so later
        // projectiles in the same scan pass through it.
        if matches!(changed, Event::EnemyLostLife { current_life } if current_life <= 0) {
            self.caps.collidable = false;
        }
        Some(changed)
    }

    // ── Movement ─────────────────────────────────────────────────────────────

    /// One frame of the entity's own motion. `world_width` bounds the
    /// chopper sweep.
    pub fn advance(&mut self, world_width: f32) {
        match &mut self.kind {
            EntityKind::Bullet => self.position.y -= BULLET_SPEED,
            EntityKind::Missile(missile) => {
                let distance = missile.step();
                self.position.y -= distance;
            }
            EntityKind::Chopper(chopper) => {
                let max_x = (world_width - self.width).max(0.0);
                self.position.x += chopper.velocity;
                if self.position.x <= 0.0 {
                    self.position.x = 0.0;
                    chopper.velocity = chopper.velocity.abs();
                } else if self.position.x >= max_x {
                    self.position.x = max_x;
                    chopper.velocity = -chopper.velocity.abs();
                }
            }
            EntityKind::Background | EntityKind::Player | EntityKind::Explosion(_) => {}
        }
    }
}
