//! Local input capture.
//!
//! Every producer normalizes to [`InputSnapshot`] with one contract for `look`:
//! it is the rotation to apply this frame, in radians. A device that senses a
//! deflection (a stick, a held key) converts it to a delta itself, by multiplying
//! with its turn rate and the frame time, before handing it over.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::sim::{InputSnapshot, Vec2};

pub trait InputSource {
    /// Current snapshot. The attack press and the accumulated look delta are
    /// handed out once and then reset.
    fn take(&mut self) -> InputSnapshot;
}

/// Radians turned per arrow key press.
pub const LOOK_STEP: f32 = 0.08;

/// Terminals report presses and repeats but not releases, so a movement key
/// keeps its axis deflected for this long after the last press or repeat.
pub const MOVE_HOLD: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    Quit,
}

#[derive(Debug, Default)]
pub struct KeyboardInput {
    x: Axis,
    y: Axis,
    look: Vec2,
    attack: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Axis {
    value: f32,
    until: Option<Instant>,
}

impl Axis {
    fn press(&mut self, value: f32, now: Instant) {
        self.value = value;
        self.until = Some(now + MOVE_HOLD);
    }

    fn at(&self, now: Instant) -> f32 {
        match self.until {
            Some(until) if now < until => self.value,
            _ => 0.0,
        }
    }
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        self.handle_key_at(key, Instant::now())
    }

    fn handle_key_at(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Char('w') => self.y.press(1.0, now),
            KeyCode::Char('s') => self.y.press(-1.0, now),
            KeyCode::Char('a') => self.x.press(-1.0, now),
            KeyCode::Char('d') => self.x.press(1.0, now),
            KeyCode::Left => self.look.x -= LOOK_STEP,
            KeyCode::Right => self.look.x += LOOK_STEP,
            KeyCode::Up => self.look.y -= LOOK_STEP,
            KeyCode::Down => self.look.y += LOOK_STEP,
            KeyCode::Char(' ') => self.attack = true,
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn take_at(&mut self, now: Instant) -> InputSnapshot {
        InputSnapshot {
            movement: Vec2::new(self.x.at(now), self.y.at(now)),
            look: std::mem::take(&mut self.look),
            attack: std::mem::take(&mut self.attack),
        }
    }
}

impl InputSource for KeyboardInput {
    fn take(&mut self) -> InputSnapshot {
        self.take_at(Instant::now())
    }
}
