//! Asset collaborator boundary.
//!
//! Loading and decoding are external; the core only asks for a named
//! resource and gets back an opaque handle. A miss falls back to a named
//! default resource and is logged, never returned as an error.

use std::collections::HashMap;

use log::warn;

pub const FALLBACK_TEXTURE: &str = "Empty";
pub const FALLBACK_SOUND: &str = "EmptySound";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    pub id: u32,
}

pub trait ContentLoader {
    fn load_texture(&mut self, name: &str) -> Option<TextureHandle>;
    fn load_sound(&mut self, name: &str) -> Option<SoundHandle>;
    /// Release everything loaded so far.
    fn unload(&mut self);
}

/// Fallback-aware front over a [`ContentLoader`].
pub struct Content {
    loader: Box<dyn ContentLoader>,
}

impl Content {
    pub fn new(loader: Box<dyn ContentLoader>) -> Self {
        Content { loader }
    }

    pub fn load_texture(&mut self, name: &str) -> TextureHandle {
        if let Some(texture) = self.loader.load_texture(name) {
            return texture;
        }
        warn!("texture {name:?} missing, using {FALLBACK_TEXTURE:?}");
        self.loader
            .load_texture(FALLBACK_TEXTURE)
            .unwrap_or_default()
    }

    pub fn load_sound(&mut self, name: &str) -> SoundHandle {
        if let Some(sound) = self.loader.load_sound(name) {
            return sound;
        }
        warn!("sound {name:?} missing, using {FALLBACK_SOUND:?}");
        self.loader.load_sound(FALLBACK_SOUND).unwrap_or_default()
    }

    pub fn unload(&mut self) {
        self.loader.unload();
    }
}

// ── In-memory catalogue ───────────────────────────────────────────────────────

/// A name → handle catalogue. Handle ids are assigned in registration order,
/// so two libraries built the same way hand out identical handles.
#[derive(Clone, Debug, Default)]
pub struct ContentLibrary {
    textures: HashMap<String, TextureHandle>,
    sounds: HashMap<String, SoundHandle>,
    names: Vec<String>,
    loaded: usize,
}

impl ContentLibrary {
    /// Empty catalogue holding only the fallback resources.
    pub fn new() -> Self {
        ContentLibrary::default()
            .with_texture(FALLBACK_TEXTURE, 1, 1)
            .with_sound(FALLBACK_SOUND)
    }

    /// Every asset the gameplay and dev states ask for.
    pub fn shooter() -> Self {
        ContentLibrary::new()
            .with_texture("Barren", 1280, 720)
            .with_texture("fighter", 80, 80)
            .with_texture("bullet", 8, 20)
            .with_texture("Missile", 12, 40)
            .with_texture("Cloud", 16, 16)
            .with_texture("Chopper", 110, 60)
            .with_texture("explosion", 16, 16)
            .with_sound("bulletSound")
            .with_sound("missileSound")
            .with_sound("FutureAmbient_1")
            .with_sound("FutureAmbient_2")
    }

    pub fn with_texture(mut self, name: &str, width: u32, height: u32) -> Self {
        let id = self.next_id();
        self.textures.insert(name.to_string(), TextureHandle { id, width, height });
        self.names.push(name.to_string());
        self
    }

    pub fn with_sound(mut self, name: &str) -> Self {
        let id = self.next_id();
        self.sounds.insert(name.to_string(), SoundHandle { id });
        self.names.push(name.to_string());
        self
    }

    /// Reverse lookup used by presenters to pick a look for a handle.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Number of successful loads since the last unload.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    fn next_id(&self) -> u32 {
        self.names.len() as u32
    }
}

impl ContentLoader for ContentLibrary {
    fn load_texture(&mut self, name: &str) -> Option<TextureHandle> {
        let texture = self.textures.get(name).copied();
        self.loaded += usize::from(texture.is_some());
        texture
    }

    fn load_sound(&mut self, name: &str) -> Option<SoundHandle> {
        let sound = self.sounds.get(name).copied();
        self.loaded += usize::from(sound.is_some());
        sound
    }

    fn unload(&mut self) {
        self.loaded = 0;
    }
}
