mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use log::{error, info};

use arcade_runtime::config::GameConfig;
use arcade_runtime::content::{ContentLibrary, ContentLoader};
use arcade_runtime::events::{AudioSink, NullAudio};
use arcade_runtime::input::{InputDevice, KeyboardSnapshot};
use arcade_runtime::machine::{default_states, FrameOutcome, StateMachine};
use arcade_runtime::state::{GameTime, StateKind};

use display::TerminalRenderer;

#[derive(Parser)]
#[command(name = "arcade_runtime")]
#[command(about = "Terminal front end for the arcade shooter core")]
struct Cli {
    /// Start in the dev harness instead of gameplay
    #[arg(long)]
    dev: bool,
    /// Simulation frames per second
    #[arg(long, default_value_t = arcade_runtime::config::DEFAULT_FPS)]
    fps: u32,
    /// Seed for particle effects
    #[arg(long)]
    seed: Option<u64>,
    /// Write logs here (the terminal itself is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> GameConfig {
        let mut config = GameConfig::default().with_fps(self.fps);
        if self.dev {
            config.start = StateKind::Dev;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // stderr would scribble over the game screen
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
    Ok(())
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Held-key tracking over a crossterm event channel.
///
/// Each key maps to the frame of its last press/repeat event; a key is
/// considered down while that frame is within `hold_window`. Terminals with
/// keyboard enhancement also report releases, which drop the key at once.
/// Classic terminals only repeat presses, so keys expire on silence.
struct TerminalKeyboard {
    rx: mpsc::Receiver<Event>,
    key_frame: HashMap<KeyCode, u64>,
    hold_window: u64,
    frame: u64,
    interrupted: bool,
}

impl TerminalKeyboard {
    fn new(rx: mpsc::Receiver<Event>, hold_window: u64) -> Self {
        TerminalKeyboard {
            rx,
            key_frame: HashMap::new(),
            hold_window,
            frame: 0,
            interrupted: false,
        }
    }

    fn normalize(code: KeyCode) -> KeyCode {
        match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

impl InputDevice for TerminalKeyboard {
    fn current_state(&mut self) -> KeyboardSnapshot {
        self.frame += 1;

        // Drain all pending input events (non-blocking)
        while let Ok(Event::Key(KeyEvent {
            code,
            kind,
            modifiers,
            ..
        })) = self.rx.try_recv()
        {
            let code = Self::normalize(code);
            match kind {
                KeyEventKind::Press | KeyEventKind::Repeat => {
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        self.interrupted = true;
                    }
                    self.key_frame.insert(code, self.frame);
                }
                KeyEventKind::Release => {
                    self.key_frame.remove(&code);
                }
            }
        }

        let frame = self.frame;
        let window = self.hold_window;
        self.key_frame
            .retain(|_, last| frame.saturating_sub(*last) <= window);
        KeyboardSnapshot::from_keys(self.key_frame.keys().cloned())
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

fn game_loop<W: Write>(
    out: &mut W,
    config: &GameConfig,
    keyboard: &mut TerminalKeyboard,
) -> Result<()> {
    let library = ContentLibrary::shooter();
    let services_library = library.clone();
    let mut machine = StateMachine::new(
        config.start,
        config.viewport,
        default_states(config.seed),
        Box::new(move || -> (Box<dyn ContentLoader>, Box<dyn AudioSink>) {
            (Box::new(services_library.clone()), Box::new(NullAudio))
        }),
    )?;

    let mut time = GameTime::default();
    loop {
        let frame_start = Instant::now();

        // frame-coupled: every frame advances the clock by the same step
        time = time.advance(config.frame);
        let outcome = machine.frame(keyboard, &time)?;
        if keyboard.interrupted {
            info!("interrupted");
            break;
        }
        match outcome {
            FrameOutcome::Quit => break,
            FrameOutcome::Switched(kind) => info!("now in {kind:?}"),
            FrameOutcome::Continue => {}
        }

        let mut renderer = TerminalRenderer::begin(out, &library, config.viewport)?;
        machine.render(&mut renderer);
        let current = machine.current();
        renderer.finish(current.kind(), current.base().registry().len())?;

        let elapsed = frame_start.elapsed();
        if elapsed < config.frame {
            thread::sleep(config.frame - elapsed);
        }
    }

    machine.shutdown();
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;
    let config = cli.config();
    info!("starting in {:?} at {} fps", config.start, config.fps());

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let mut keyboard = TerminalKeyboard::new(rx, config.hold_window);
    let result = game_loop(&mut out, &config, &mut keyboard);
    if let Err(err) = &result {
        error!("game loop failed: {err:#}");
    }

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
