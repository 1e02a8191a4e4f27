#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use arcade_runtime::content::{ContentLibrary, SoundHandle};
use arcade_runtime::entities::{Entity, Vec2};
use arcade_runtime::events::{AudioSink, Event, EventKind, SoundCue};
use arcade_runtime::registry::RenderSink;
use arcade_runtime::state::{GameState, GameTime, Viewport};

pub type Played = Rc<RefCell<Vec<(SoundHandle, SoundCue)>>>;
/// Sounds currently audible; a test ends a track by removing it.
pub type Playing = Rc<RefCell<HashSet<SoundHandle>>>;
pub type Seen = Rc<RefCell<Vec<EventKind>>>;

/// Records every submission.
#[derive(Default)]
pub struct RecordingSink {
    pub submitted: Vec<(&'static str, i32, Vec2)>,
}

impl RenderSink for RecordingSink {
    fn submit(&mut self, entity: &Entity, z_order: i32) {
        self.submitted
            .push((entity.kind_name(), z_order, entity.position));
    }
}

pub struct RecordingAudio {
    pub played: Played,
    pub playing: Playing,
}

impl RecordingAudio {
    pub fn new(played: &Played) -> Self {
        RecordingAudio::with_playing(played, &Playing::default())
    }

    pub fn with_playing(played: &Played, playing: &Playing) -> Self {
        RecordingAudio {
            played: Rc::clone(played),
            playing: Rc::clone(playing),
        }
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: SoundHandle, cue: SoundCue) {
        self.played.borrow_mut().push((sound, cue));
        self.playing.borrow_mut().insert(sound);
    }

    fn is_playing(&self, sound: SoundHandle) -> bool {
        self.playing.borrow().contains(&sound)
    }

    fn stop(&mut self, sound: SoundHandle) {
        self.playing.borrow_mut().remove(&sound);
    }
}

pub fn viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

/// Initialize, load and activate with the shooter assets; returns the
/// played-sound log.
pub fn enter(state: &mut dyn GameState) -> Played {
    enter_with(state, ContentLibrary::shooter())
}

pub fn enter_with(state: &mut dyn GameState, library: ContentLibrary) -> Played {
    enter_listening(state, library).0
}

/// Like [`enter_with`], also exposing which sounds are still audible.
pub fn enter_listening(state: &mut dyn GameState, library: ContentLibrary) -> (Played, Playing) {
    let played: Played = Rc::default();
    let playing: Playing = Rc::default();
    state
        .enter(
            Box::new(library),
            Box::new(RecordingAudio::with_playing(&played, &playing)),
            viewport(),
        )
        .expect("enter state");
    (played, playing)
}

/// Subscribe a recorder of event kinds to the state's bus.
pub fn watch(state: &mut dyn GameState) -> Seen {
    let seen: Seen = Rc::default();
    let sink = Rc::clone(&seen);
    state.base_mut().subscribe(Box::new(
        move |event: &Event| -> arcade_runtime::Result<()> {
            sink.borrow_mut().push(event.kind());
            Ok(())
        },
    ));
    seen
}

/// Simulation time `ms` milliseconds in, on a 10 ms frame grid.
pub fn at_ms(ms: u64) -> GameTime {
    GameTime {
        total: Duration::from_millis(ms),
        elapsed: Duration::from_millis(10),
        frame: ms / 10,
    }
}
