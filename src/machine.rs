//! Top-level orchestrator: owns the single active state, feeds it frames and
//! acts on its switch and quit signals.

use std::cell::Cell;
use std::rc::Rc;

use log::info;

use crate::content::ContentLoader;
use crate::dev::DevState;
use crate::events::{AudioSink, Event, Subscriber};
use crate::gameplay::GameplayState;
use crate::input::InputDevice;
use crate::registry::RenderSink;
use crate::state::{GameState, GameTime, StateKind, Viewport};
use crate::Result;

/// Builds a fresh, uninitialized state for a kind.
pub type StateFactory = Box<dyn FnMut(StateKind) -> Box<dyn GameState>>;
/// Hands each entered state its own collaborators.
pub type ServiceFactory = Box<dyn FnMut() -> (Box<dyn ContentLoader>, Box<dyn AudioSink>)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Switched(StateKind),
    Quit,
}

/// The built-in states, each seeded from `seed`.
pub fn default_states(seed: u64) -> StateFactory {
    Box::new(move |kind| -> Box<dyn GameState> {
        match kind {
            StateKind::Gameplay => Box::new(GameplayState::new(seed)),
            StateKind::Dev => Box::new(DevState::new(seed)),
        }
    })
}

struct QuitWatcher(Rc<Cell<bool>>);

impl Subscriber for QuitWatcher {
    fn on_notify(&mut self, event: &Event) -> Result<()> {
        if matches!(event, Event::GameQuit) {
            self.0.set(true);
        }
        Ok(())
    }
}

pub struct StateMachine {
    current: Box<dyn GameState>,
    states: StateFactory,
    services: ServiceFactory,
    viewport: Viewport,
    quit: Rc<Cell<bool>>,
}

impl StateMachine {
    pub fn new(
        initial: StateKind,
        viewport: Viewport,
        mut states: StateFactory,
        services: ServiceFactory,
    ) -> Result<Self> {
        let current = states(initial);
        let mut machine = StateMachine {
            current,
            states,
            services,
            viewport,
            quit: Rc::new(Cell::new(false)),
        };
        machine.enter_current()?;
        Ok(machine)
    }

    pub fn current_kind(&self) -> StateKind {
        self.current.kind()
    }

    pub fn current(&self) -> &dyn GameState {
        self.current.as_ref()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.get()
    }

    /// Input (one poll of `input`), then update, then signal handling. An
    /// error leaves the current state in place.
    pub fn frame(&mut self, input: &mut dyn InputDevice, time: &GameTime) -> Result<FrameOutcome> {
        self.current.handle_input(input, time)?;
        self.current.update(time)?;

        if self.quit.get() {
            return Ok(FrameOutcome::Quit);
        }
        match self.current.base_mut().take_switch_request() {
            Some(next) => {
                self.switch_to(next)?;
                Ok(FrameOutcome::Switched(next))
            }
            None => Ok(FrameOutcome::Continue),
        }
    }

    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.current.render(sink);
    }

    pub fn switch_to(&mut self, next: StateKind) -> Result<()> {
        info!("switching {:?} -> {:?}", self.current.kind(), next);
        self.current.unload_content();
        self.current = (self.states)(next);
        self.enter_current()
    }

    pub fn shutdown(&mut self) {
        self.current.unload_content();
    }

    fn enter_current(&mut self) -> Result<()> {
        let (content, audio) = (self.services)();
        self.current.enter(content, audio, self.viewport)?;
        self.current
            .base_mut()
            .subscribe(Box::new(QuitWatcher(Rc::clone(&self.quit))));
        Ok(())
    }
}
