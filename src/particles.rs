//! Particle emitters: explosion bursts and missile exhaust.
//!
//! Randomness comes through an injected `Rng` so callers control
//! determinism (tests use a seeded `StdRng`).

use rand::Rng;

use crate::content::TextureHandle;
use crate::entities::Vec2;
use crate::lifecycle::{LifePhase, Lifetime};

/// How an emitter spawns its particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionConfig {
    pub per_frame: usize,
    pub speed: (f32, f32),
    pub lifespan: (u32, u32),
    /// Particles start within a square this wide at the emitter origin.
    pub spread: f32,
    /// Direction range in radians (y grows downward).
    pub angle: (f32, f32),
}

/// Omnidirectional burst.
pub const EXPLOSION: EmissionConfig = EmissionConfig {
    per_frame: 4,
    speed: (0.5, 3.0),
    lifespan: (60, 240),
    spread: 40.0,
    angle: (0.0, std::f32::consts::TAU),
};

/// Short-lived puffs pushed out behind a climbing missile.
pub const EXHAUST: EmissionConfig = EmissionConfig {
    per_frame: 2,
    speed: (0.5, 1.5),
    lifespan: (20, 40),
    spread: 4.0,
    angle: (
        std::f32::consts::FRAC_PI_2 - 0.4,
        std::f32::consts::FRAC_PI_2 + 0.4,
    ),
};

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub age: u32,
    pub lifespan: u32,
}

impl Particle {
    /// 1.0 when fresh, 0.0 when expired.
    pub fn opacity(&self) -> f32 {
        if self.lifespan == 0 {
            return 0.0;
        }
        1.0 - (self.age as f32 / self.lifespan as f32).min(1.0)
    }

    fn is_alive(&self) -> bool {
        self.age < self.lifespan
    }
}

#[derive(Clone, Debug)]
pub struct ExplosionEmitter {
    origin: Vec2,
    lifetime: Lifetime,
    emitting: bool,
    particles: Vec<Particle>,
}

impl ExplosionEmitter {
    pub fn new(origin: Vec2, lifetime: Lifetime) -> Self {
        ExplosionEmitter {
            origin,
            lifetime,
            emitting: true,
            particles: Vec::new(),
        }
    }

    /// Advance one frame: age the emitter, move and expire particles, then
    /// emit a new burst if still active.
    pub fn update(&mut self, rng: &mut impl Rng) -> LifePhase {
        let phase = self.lifetime.tick();
        step_particles(&mut self.particles);
        if self.emitting {
            emit(&mut self.particles, self.origin, &EXPLOSION, rng);
        }

        phase
    }

    /// Stop emitting; live particles keep fading out.
    pub fn deactivate(&mut self) {
        self.emitting = false;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub fn age(&self) -> u32 {
        self.lifetime.age()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

/// Trail of a missile, carried by the missile itself so it goes away with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExhaustEmitter {
    texture: TextureHandle,
    particles: Vec<Particle>,
}

impl ExhaustEmitter {
    pub fn new(texture: TextureHandle) -> Self {
        ExhaustEmitter {
            texture,
            particles: Vec::new(),
        }
    }

    /// Age the trail and puff out more at `tail`.
    pub fn update(&mut self, tail: Vec2, rng: &mut impl Rng) {
        step_particles(&mut self.particles);
        emit(&mut self.particles, tail, &EXHAUST, rng);
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

fn step_particles(particles: &mut Vec<Particle>) {
    for particle in particles.iter_mut() {
        particle.position += particle.velocity;
        particle.age += 1;
    }
    particles.retain(Particle::is_alive);
}

fn emit(particles: &mut Vec<Particle>, origin: Vec2, config: &EmissionConfig, rng: &mut impl Rng) {
    let half = config.spread / 2.0;
    for _ in 0..config.per_frame {
        let angle = rng.gen_range(config.angle.0..config.angle.1);
        let speed = rng.gen_range(config.speed.0..config.speed.1);
        let offset = Vec2::new(rng.gen_range(-half..=half), rng.gen_range(-half..=half));
        particles.push(Particle {
            position: origin + offset,
            velocity: Vec2::new(angle.cos() * speed, angle.sin() * speed),
            age: 0,
            lifespan: rng.gen_range(config.lifespan.0..=config.lifespan.1),
        });
    }
}
