/// Terminal presenter: all screen I/O lives here.
///
/// The simulation works in world units; this module scales them onto the
/// terminal grid and draws one glyph run per entity. No game logic is
/// performed here.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};

use arcade_runtime::content::{ContentLibrary, FALLBACK_TEXTURE};
use arcade_runtime::entities::{Entity, EntityKind};
use arcade_runtime::particles::Particle;
use arcade_runtime::registry::RenderSink;
use arcade_runtime::state::{StateKind, Viewport};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::Yellow;
const C_PLAYER: Color = Color::White;
const C_CHOPPER: Color = Color::Green;
const C_BULLET: Color = Color::Cyan;
const C_MISSILE: Color = Color::Yellow;
const C_UNKNOWN: Color = Color::Magenta;
const C_HINT: Color = Color::DarkGrey;

/// Particle glyphs from freshest to most faded.
type Palette = [(&'static str, Color); 3];

const FIRE: Palette = [("*", Color::Yellow), ("+", Color::Red), ("·", Color::DarkGrey)];
const SMOKE: Palette = [("░", Color::Grey), ("·", Color::Grey), ("·", Color::DarkGrey)];

/// Rows reserved above (HUD + border) and below (border + hint) the field.
const TOP_ROWS: u16 = 2;
const BOTTOM_ROWS: u16 = 2;

pub struct TerminalRenderer<'a, W: Write> {
    out: &'a mut W,
    library: &'a ContentLibrary,
    viewport: Viewport,
    cols: u16,
    rows: u16,
    error: Option<std::io::Error>,
}

impl<'a, W: Write> TerminalRenderer<'a, W> {
    /// Clear the screen and draw the frame chrome.
    pub fn begin(
        out: &'a mut W,
        library: &'a ContentLibrary,
        viewport: Viewport,
    ) -> std::io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        out.queue(terminal::Clear(terminal::ClearType::All))?;
        let mut renderer = TerminalRenderer {
            out,
            library,
            viewport,
            cols,
            rows,
            error: None,
        };
        renderer.draw_border()?;
        Ok(renderer)
    }

    /// Draw HUD and hint, then flush. Reports the first error hit while
    /// entities were being submitted.
    pub fn finish(mut self, state: StateKind, entities: usize) -> std::io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.draw_hud(state, entities)?;
        self.draw_controls_hint(state)?;
        self.out.queue(style::ResetColor)?;
        self.out.queue(cursor::MoveTo(0, self.rows.saturating_sub(1)))?;
        self.out.flush()
    }

    // ── Coordinate mapping ───────────────────────────────────────────────────

    fn field_cols(&self) -> u16 {
        self.cols.saturating_sub(2).max(1)
    }

    fn field_rows(&self) -> u16 {
        self.rows.saturating_sub(TOP_ROWS + BOTTOM_ROWS).max(1)
    }

    /// World point → terminal cell, or `None` when outside the field.
    fn to_cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let col = (x / self.viewport.width * self.field_cols() as f32).floor();
        let row = (y / self.viewport.height * self.field_rows() as f32).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as u16, row as u16);
        if col >= self.field_cols() || row >= self.field_rows() {
            return None;
        }
        Some((col + 1, row + TOP_ROWS))
    }

    fn span(&self, width: f32) -> usize {
        ((width / self.viewport.width * self.field_cols() as f32).round() as usize).max(1)
    }

    // ── Chrome ───────────────────────────────────────────────────────────────

    fn draw_border(&mut self) -> std::io::Result<()> {
        let w = self.cols as usize;
        let bottom = TOP_ROWS + self.field_rows();

        self.out.queue(style::SetForegroundColor(C_BORDER))?;
        self.out.queue(cursor::MoveTo(0, TOP_ROWS - 1))?;
        self.out
            .queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;
        self.out.queue(cursor::MoveTo(0, bottom))?;
        self.out
            .queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;
        for row in TOP_ROWS..bottom {
            self.out.queue(cursor::MoveTo(0, row))?;
            self.out.queue(Print("│"))?;
            self.out.queue(cursor::MoveTo(self.cols.saturating_sub(1), row))?;
            self.out.queue(Print("│"))?;
        }
        Ok(())
    }

    fn draw_hud(&mut self, state: StateKind, entities: usize) -> std::io::Result<()> {
        self.out.queue(cursor::MoveTo(1, 0))?;
        self.out.queue(style::SetForegroundColor(C_HUD))?;
        let label = match state {
            StateKind::Gameplay => "[ GAMEPLAY ]",
            StateKind::Dev => "[ DEV ]",
        };
        self.out
            .queue(Print(format!("{label}  entities: {entities:>3}")))?;
        Ok(())
    }

    fn draw_controls_hint(&mut self, state: StateKind) -> std::io::Result<()> {
        let hint = match state {
            StateKind::Gameplay => "← → / A D : Move   SPACE : Shoot   ESC : Quit",
            StateKind::Dev => "ENTER : Gameplay   ESC : Quit",
        };
        self.out.queue(cursor::MoveTo(1, self.rows.saturating_sub(1)))?;
        self.out.queue(style::SetForegroundColor(C_HINT))?;
        self.out.queue(Print(hint))?;
        Ok(())
    }

    // ── Entities ─────────────────────────────────────────────────────────────

    fn draw_entity(&mut self, entity: &Entity) -> std::io::Result<()> {
        let (glyph, color) = match &entity.kind {
            EntityKind::Background => return Ok(()),
            EntityKind::Explosion(emitter) => {
                return self.draw_particles(emitter.particles(), &FIRE);
            }
            EntityKind::Player => ("▲", C_PLAYER),
            EntityKind::Bullet => ("║", C_BULLET),
            EntityKind::Missile(missile) => {
                self.draw_particles(missile.exhaust.particles(), &SMOKE)?;
                ("^", C_MISSILE)
            }
            EntityKind::Chopper(_) => ("≡", C_CHOPPER),
        };
        // an asset that fell back to the default texture is drawn as a '?'
        let (glyph, color) = match self.library.name_of(entity.texture.id) {
            Some(FALLBACK_TEXTURE) | None => ("?", C_UNKNOWN),
            Some(_) => (glyph, color),
        };

        let center_y = entity.position.y + entity.height / 2.0;
        let Some((col, row)) = self.to_cell(entity.position.x, center_y) else {
            return Ok(());
        };
        let room = self.cols.saturating_sub(1).saturating_sub(col) as usize;
        let run = self.span(entity.width).min(room);
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out.queue(style::SetForegroundColor(color))?;
        self.out.queue(Print(glyph.repeat(run)))?;
        Ok(())
    }

    fn draw_particles(&mut self, particles: &[Particle], palette: &Palette) -> std::io::Result<()> {
        for particle in particles {
            let Some((col, row)) = self.to_cell(particle.position.x, particle.position.y) else {
                continue;
            };
            let (glyph, color) = match particle.opacity() {
                o if o > 0.66 => palette[0],
                o if o > 0.33 => palette[1],
                _ => palette[2],
            };
            self.out.queue(cursor::MoveTo(col, row))?;
            self.out.queue(style::SetForegroundColor(color))?;
            self.out.queue(Print(glyph))?;
        }
        Ok(())
    }
}

impl<W: Write> RenderSink for TerminalRenderer<'_, W> {
    fn submit(&mut self, entity: &Entity, _z_order: i32) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.draw_entity(entity) {
            self.error = Some(err);
        }
    }
}
