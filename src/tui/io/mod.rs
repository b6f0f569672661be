//! # Terminal Surface Abstraction
//!
//! Isolates terminal-specific code behind the `TerminalSurface` trait so
//! the rendering engine depends only on a cell grid and an event source.
//! The production implementation drives a real terminal through crossterm;
//! tests substitute an in-memory grid with scripted events.
//!
//! ```text
//! Production:  Controller ──▶ CrosstermSurface ──▶ crossterm
//! Testing:     Controller ──▶ MockSurface      ──▶ Vec<Option<Cell>> + VecDeque<Event>
//! ```

use anyhow::Result;
use crossterm::event::KeyEvent;

use crate::pipeline::Notify;

pub mod mock;
pub mod terminal;

pub use mock::MockSurface;
pub use terminal::CrosstermSurface;

/// The two interface styles plus the terminal default. `WhiteOnBlue`
/// marks an edited-but-not-run command line; `WhiteOnDarkBlue` marks one
/// whose results are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Default,
    WhiteOnBlue,
    WhiteOnDarkBlue,
}

/// Events delivered to the controller's main loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key press (or repeat) from the terminal.
    Key(KeyEvent),
    /// Posted by capture threads when new data is available; triggers a
    /// redraw without any state change.
    Interrupt,
    /// The terminal changed size; the next draw re-queries dimensions.
    Resize,
}

/// A full-screen cell-addressed terminal.
///
/// `set_cell` writes into a back buffer; nothing reaches the terminal
/// until `show`. Cells persist across frames. `poll_event` blocks until
/// input, an interrupt, or a resize arrives.
pub trait TerminalSurface {
    /// Current dimensions (columns, rows).
    fn size(&mut self) -> (u16, u16);

    /// Write one cell of the back buffer.
    fn set_cell(&mut self, x: u16, y: u16, style: Style, ch: char);

    /// Place the visible cursor at the next `show`.
    fn show_cursor(&mut self, x: u16, y: u16);

    /// Flush the back buffer to the terminal.
    fn show(&mut self) -> Result<()>;

    /// Block until the next event.
    fn poll_event(&mut self) -> Result<Event>;

    /// A thread-safe handle that injects an `Interrupt` event into this
    /// surface's queue; handed to capture threads as their notify hook.
    fn interrupter(&self) -> Notify;

    /// Inject an `Interrupt` event from the owning thread.
    fn post_interrupt(&self) {
        (self.interrupter())();
    }

    /// Restore the terminal to its normal state. Idempotent; must be
    /// called before the process writes ordinary output or exits.
    fn finalize(&mut self) -> Result<()>;
}
