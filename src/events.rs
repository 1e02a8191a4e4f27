//! Typed gameplay events and their synchronous delivery.

use std::collections::HashMap;

use log::{debug, trace};

use crate::content::SoundHandle;
use crate::Result;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    GameQuit,
    PlayerShootsBullets,
    PlayerShootsMissile,
    BulletHitsChopper,
    MissileHitsChopper,
    EnemyLostLife { current_life: i32 },
    EnemyDestroyed,
}

/// Payload-free tag of an [`Event`], usable as a map key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameQuit,
    PlayerShootsBullets,
    PlayerShootsMissile,
    BulletHitsChopper,
    MissileHitsChopper,
    EnemyLostLife,
    EnemyDestroyed,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::GameQuit => EventKind::GameQuit,
            Event::PlayerShootsBullets => EventKind::PlayerShootsBullets,
            Event::PlayerShootsMissile => EventKind::PlayerShootsMissile,
            Event::BulletHitsChopper => EventKind::BulletHitsChopper,
            Event::MissileHitsChopper => EventKind::MissileHitsChopper,
            Event::EnemyLostLife { .. } => EventKind::EnemyLostLife,
            Event::EnemyDestroyed => EventKind::EnemyDestroyed,
        }
    }
}

// ── Subscribers ──────────────────────────────────────────────────────────────

/// State-level listener. An `Err` is fatal for the frame: delivery stops
/// at the failing subscriber and the error travels up to the caller.
pub trait Subscriber {
    fn on_notify(&mut self, event: &Event) -> Result<()>;
}

impl<F> Subscriber for F
where
    F: FnMut(&Event) -> Result<()>,
{
    fn on_notify(&mut self, event: &Event) -> Result<()> {
        self(event)
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Deliver to every subscriber in subscription order.
    pub fn publish(&mut self, event: &Event) -> Result<()> {
        trace!("publish {event:?} to {} subscribers", self.subscribers.len());
        for subscriber in &mut self.subscribers {
            subscriber.on_notify(event)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

// ── Sound ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundCue {
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
}

impl Default for SoundCue {
    fn default() -> Self {
        SoundCue {
            volume: 1.0,
            pitch: 0.0,
            pan: 0.0,
        }
    }
}

/// Playback collaborator; mixing happens outside the core.
pub trait AudioSink {
    fn play(&mut self, sound: SoundHandle, cue: SoundCue);
    /// Whether a previously played sound is still audible.
    fn is_playing(&self, sound: SoundHandle) -> bool;
    fn stop(&mut self, sound: SoundHandle);
}

/// Discards everything. Silent tracks never end, so a soundtrack played
/// through it stays on its first track.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, sound: SoundHandle, _cue: SoundCue) {
        trace!("audio disabled, dropping sound #{}", sound.id);
    }

    fn is_playing(&self, _sound: SoundHandle) -> bool {
        true
    }

    fn stop(&mut self, _sound: SoundHandle) {}
}

/// Plays the sound registered for an event's kind, plus an optional
/// looping soundtrack.
pub struct SoundManager {
    sink: Box<dyn AudioSink>,
    sounds: HashMap<EventKind, (SoundHandle, SoundCue)>,
    soundtrack: Vec<SoundHandle>,
    current_track: Option<usize>,
}

impl SoundManager {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        SoundManager {
            sink,
            sounds: HashMap::new(),
            soundtrack: Vec::new(),
            current_track: None,
        }
    }

    /// Replace the playlist. Playback starts on the next
    /// [`play_soundtrack`](Self::play_soundtrack).
    pub fn set_soundtrack(&mut self, tracks: Vec<SoundHandle>) {
        self.stop_soundtrack();
        debug!("soundtrack set to {} tracks", tracks.len());
        self.soundtrack = tracks;
    }

    /// Called once per frame: once the current track has finished, start
    /// the next one, wrapping around at the end of the list.
    pub fn play_soundtrack(&mut self) {
        if self.soundtrack.is_empty() {
            return;
        }
        if let Some(index) = self.current_track {
            if self.sink.is_playing(self.soundtrack[index]) {
                return;
            }
        }
        let next = self
            .current_track
            .map_or(0, |index| (index + 1) % self.soundtrack.len());
        let track = self.soundtrack[next];
        debug!("soundtrack track {next} (sound #{})", track.id);
        self.current_track = Some(next);
        self.sink.play(track, SoundCue::default());
    }

    pub fn stop_soundtrack(&mut self) {
        if let Some(index) = self.current_track.take() {
            self.sink.stop(self.soundtrack[index]);
        }
    }

    pub fn current_track(&self) -> Option<SoundHandle> {
        self.current_track.map(|index| self.soundtrack[index])
    }

    pub fn register_sound(&mut self, kind: EventKind, sound: SoundHandle) {
        self.register_sound_with(kind, sound, SoundCue::default());
    }

    pub fn register_sound_with(&mut self, kind: EventKind, sound: SoundHandle, cue: SoundCue) {
        debug!("sound #{} bound to {kind:?}", sound.id);
        self.sounds.insert(kind, (sound, cue));
    }

    /// Forget every registration and stop the soundtrack.
    pub fn clear(&mut self) {
        self.stop_soundtrack();
        self.soundtrack.clear();
        self.sounds.clear();
    }
}

impl Subscriber for SoundManager {
    fn on_notify(&mut self, event: &Event) -> Result<()> {
        if let Some((sound, cue)) = self.sounds.get(&event.kind()) {
            self.sink.play(*sound, *cue);
        }
        Ok(())
    }
}
