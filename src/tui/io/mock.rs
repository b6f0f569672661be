//! # Mock Terminal Surface
//!
//! In-memory implementation of [`TerminalSurface`] for tests: a cell grid
//! that renders rows back as strings, plus a scripted event queue shared
//! with interrupter handles so capture threads can wake a test loop the
//! same way they wake the real terminal.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthChar;

use crate::pipeline::Notify;
use crate::tui::io::{Event, Style, TerminalSurface};

/// Scripted in-memory surface. Cells persist across `show` calls exactly
/// like the real terminal's back buffer.
pub struct MockSurface {
    w: u16,
    h: u16,
    cells: Vec<Option<(Style, char)>>,
    events: Arc<Mutex<VecDeque<Event>>>,
    cursor: Option<(u16, u16)>,
    shows: usize,
    finalized: bool,
}

impl MockSurface {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![None; w as usize * h as usize],
            events: Arc::new(Mutex::new(VecDeque::new())),
            cursor: None,
            shows: 0,
            finalized: false,
        }
    }

    /// Queue a key press for the controller to consume.
    pub fn push_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        self.push_event(Event::Key(KeyEvent::new(code, modifiers)));
    }

    /// Queue each character of `text` as a plain key press.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_key(KeyCode::Char(ch), KeyModifiers::NONE);
        }
    }

    pub fn push_event(&mut self, event: Event) {
        self.events
            .lock()
            .expect("mock event queue poisoned")
            .push_back(event);
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<(Style, char)> {
        self.cells[y as usize * self.w as usize + x as usize]
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn shows(&self) -> usize {
        self.shows
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    /// Render one row as text. A wide rune fills its own cell and skips
    /// the cell it covers; unwritten cells render as spaces.
    pub fn row_text(&self, y: u16) -> String {
        let mut out = String::new();
        let mut x = 0u16;
        while x < self.w {
            match self.cell(x, y) {
                Some((_, ch)) => {
                    out.push(ch);
                    x += (UnicodeWidthChar::width(ch).unwrap_or(1).max(1)) as u16;
                }
                None => {
                    out.push(' ');
                    x += 1;
                }
            }
        }
        out
    }

    /// The whole grid, rows joined with newlines.
    pub fn screen_text(&self) -> String {
        (0..self.h)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }
}

impl TerminalSurface for MockSurface {
    fn size(&mut self) -> (u16, u16) {
        (self.w, self.h)
    }

    fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char) {
        if x < self.w && y < self.h {
            self.cells[y as usize * self.w as usize + x as usize] = Some((style, ch));
        }
    }

    fn show_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Some((x, y));
    }

    fn show(&mut self) -> Result<()> {
        self.shows += 1;
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Event> {
        match self
            .events
            .lock()
            .expect("mock event queue poisoned")
            .pop_front()
        {
            Some(event) => Ok(event),
            None => bail!("mock event queue exhausted"),
        }
    }

    fn interrupter(&self) -> Notify {
        let events = Arc::clone(&self.events);
        Arc::new(move || {
            events
                .lock()
                .expect("mock event queue poisoned")
                .push_back(Event::Interrupt);
        })
    }

    fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        Ok(())
    }
}
