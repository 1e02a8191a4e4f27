//! Game-state contract and the machinery every concrete state shares.
//!
//! Lifecycle: `Uninitialized → Initialized → Loaded → Active → Unloaded`.
//! A state never replaces itself; it raises a switch signal and the owner
//! (see [`crate::machine::StateMachine`]) decides what happens next.

use std::time::Duration;

use log::{debug, info};

use crate::content::{Content, ContentLoader, SoundHandle, TextureHandle};
use crate::entities::Entity;
use crate::error::GameError;
use crate::events::{AudioSink, Event, EventBus, SoundCue, SoundManager, Subscriber};
use crate::input::InputDevice;
use crate::registry::{EntityId, EntityRegistry, RenderSink};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    Gameplay,
    Dev,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatePhase {
    Uninitialized,
    Initialized,
    Loaded,
    Active,
    Unloaded,
}

/// Simulation clock. Advanced by a fixed amount per frame; nothing in the
/// core reads wall-clock time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameTime {
    pub total: Duration,
    pub elapsed: Duration,
    pub frame: u64,
}

impl GameTime {
    pub fn advance(self, delta: Duration) -> GameTime {
        GameTime {
            total: self.total + delta,
            elapsed: delta,
            frame: self.frame + 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }
}

// ── Shared state plumbing ─────────────────────────────────────────────────────

/// Registry, content, notification and signalling shared by all states.
pub struct BaseGameState {
    kind: StateKind,
    phase: StatePhase,
    viewport: Viewport,
    content: Option<Content>,
    sounds: Option<SoundManager>,
    bus: EventBus,
    registry: EntityRegistry,
    switch_request: Option<StateKind>,
}

impl BaseGameState {
    pub fn new(kind: StateKind) -> Self {
        BaseGameState {
            kind,
            phase: StatePhase::Uninitialized,
            viewport: Viewport::new(0.0, 0.0),
            content: None,
            sounds: None,
            bus: EventBus::new(),
            registry: EntityRegistry::new(),
            switch_request: None,
        }
    }

    pub fn initialize(
        &mut self,
        content: Box<dyn ContentLoader>,
        audio: Box<dyn AudioSink>,
        viewport: Viewport,
    ) -> Result<()> {
        self.expect_phase(StatePhase::Uninitialized)?;
        self.content = Some(Content::new(content));
        self.sounds = Some(SoundManager::new(audio));
        self.viewport = viewport;
        self.set_phase(StatePhase::Initialized);
        Ok(())
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn phase(&self) -> StatePhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: StatePhase) {
        debug!("{:?} state: {:?} -> {:?}", self.kind, self.phase, phase);
        self.phase = phase;
    }

    pub fn expect_phase(&self, expected: StatePhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::Phase {
                state: self.kind,
                expected,
                found: self.phase,
            })
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // ── Content ───────────────────────────────────────────────────────────────

    /// Texture by name, falling back to the default texture. Before
    /// initialization there is no loader and the null handle is returned.
    pub fn load_texture(&mut self, name: &str) -> TextureHandle {
        match self.content.as_mut() {
            Some(content) => content.load_texture(name),
            None => TextureHandle::default(),
        }
    }

    pub fn load_sound(&mut self, name: &str) -> SoundHandle {
        match self.content.as_mut() {
            Some(content) => content.load_sound(name),
            None => SoundHandle::default(),
        }
    }

    pub fn register_sound(&mut self, event: &Event, sound: SoundHandle, cue: SoundCue) {
        if let Some(sounds) = self.sounds.as_mut() {
            sounds.register_sound_with(event.kind(), sound, cue);
        }
    }

    pub fn set_soundtrack(&mut self, tracks: Vec<SoundHandle>) {
        if let Some(sounds) = self.sounds.as_mut() {
            sounds.set_soundtrack(tracks);
        }
    }

    /// Keep the soundtrack going; called once per frame.
    pub fn play_soundtrack(&mut self) {
        if let Some(sounds) = self.sounds.as_mut() {
            sounds.play_soundtrack();
        }
    }

    pub fn current_track(&self) -> Option<SoundHandle> {
        self.sounds.as_ref().and_then(SoundManager::current_track)
    }

    // ── Entities ──────────────────────────────────────────────────────────────

    pub fn add_game_object(&mut self, entity: Entity) -> EntityId {
        self.registry.add(entity)
    }

    pub fn remove_game_object(&mut self, id: EntityId) -> Option<Entity> {
        self.registry.remove(id)
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    // ── Notification ──────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.bus.subscribe(subscriber);
    }

    /// Broadcast: sound manager, state subscribers, then every live entity in
    /// registry order. Returns the change notifications raised by entities.
    pub fn notify_event(&mut self, event: &Event) -> Result<Vec<(EntityId, Event)>> {
        self.play_sound(event)?;
        self.bus.publish(event)?;
        let mut changed = Vec::new();
        for (id, entity) in self.registry.iter_mut() {
            if let Some(change) = entity.on_notify(event) {
                changed.push((id, change));
            }
        }
        Ok(changed)
    }

    pub fn play_sound(&mut self, event: &Event) -> Result<()> {
        match self.sounds.as_mut() {
            Some(sounds) => sounds.on_notify(event),
            None => Ok(()),
        }
    }

    // ── Signals ───────────────────────────────────────────────────────────────

    pub fn switch_state(&mut self, next: StateKind) {
        info!("{:?} state requests switch to {:?}", self.kind, next);
        self.switch_request = Some(next);
    }

    pub fn take_switch_request(&mut self) -> Option<StateKind> {
        self.switch_request.take()
    }

    // ── Frame ─────────────────────────────────────────────────────────────────

    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.registry.render_all(sink);
    }

    pub fn unload(&mut self) {
        if let Some(content) = self.content.as_mut() {
            content.unload();
        }
        if let Some(sounds) = self.sounds.as_mut() {
            sounds.clear();
        }
        self.bus.clear();
        self.registry.clear();
        self.switch_request = None;
        self.set_phase(StatePhase::Unloaded);
    }
}

// ── Contract ──────────────────────────────────────────────────────────────────

/// One node of the state machine. Concrete states supply the hooks; the
/// provided methods fix the frame cycle that all of them share.
pub trait GameState {
    fn base(&self) -> &BaseGameState;
    fn base_mut(&mut self) -> &mut BaseGameState;

    /// Install this state's input mapper.
    fn set_input_manager(&mut self);

    /// Populate the initial entities.
    fn load_content(&mut self) -> Result<()>;

    /// Poll `input` once and run the commands it yields.
    fn handle_input(&mut self, input: &mut dyn InputDevice, time: &GameTime) -> Result<()>;

    /// Per-frame simulation; cleanup of destroyed entities follows it.
    fn update_game_state(&mut self, time: &GameTime) -> Result<()>;

    /// Called with the ids dropped by the end-of-frame cleanup.
    fn on_pruned(&mut self, _removed: &[EntityId]) {}

    /// Drop state-local bookkeeping (pending actions, id lists) on unload.
    fn on_unload(&mut self) {}

    fn kind(&self) -> StateKind {
        self.base().kind()
    }

    fn phase(&self) -> StatePhase {
        self.base().phase()
    }

    fn initialize(
        &mut self,
        content: Box<dyn ContentLoader>,
        audio: Box<dyn AudioSink>,
        viewport: Viewport,
    ) -> Result<()> {
        self.base_mut().initialize(content, audio, viewport)?;
        self.set_input_manager();
        Ok(())
    }

    /// initialize + load_content + activate.
    fn enter(
        &mut self,
        content: Box<dyn ContentLoader>,
        audio: Box<dyn AudioSink>,
        viewport: Viewport,
    ) -> Result<()> {
        self.initialize(content, audio, viewport)?;
        self.load_content()?;
        self.base_mut().set_phase(StatePhase::Loaded);
        self.base_mut().set_phase(StatePhase::Active);
        Ok(())
    }

    fn update(&mut self, time: &GameTime) -> Result<()> {
        self.base().expect_phase(StatePhase::Active)?;
        self.base_mut().play_soundtrack();
        self.update_game_state(time)?;
        let removed = self.base_mut().registry_mut().prune();
        if !removed.is_empty() {
            self.on_pruned(&removed);
        }
        Ok(())
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        self.base().render(sink);
    }

    fn unload_content(&mut self) {
        self.on_unload();
        self.base_mut().unload();
    }
}
