//! # Crossterm Terminal Surface
//!
//! Production implementation of [`TerminalSurface`]. All crossterm
//! dependencies are isolated here. The surface keeps a back buffer of
//! cells flushed on `show`, and runs an input thread that converts
//! terminal events into an mpsc channel; interrupter handles feed the
//! same channel, which is how capture threads wake the event loop.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event as CrosstermEvent};
use crossterm::style::{Color, Colors, Print, ResetColor, SetColors};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use unicode_width::UnicodeWidthChar;

use crate::pipeline::Notify;
use crate::tui::io::{Event, Style, TerminalSurface};

/// How often the input thread rechecks its stop flag while polling.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Cell = Option<(Style, char)>;

/// Full-screen crossterm-backed surface.
pub struct CrosstermSurface {
    w: u16,
    h: u16,
    cells: Vec<Cell>,
    cursor: Option<(u16, u16)>,
    events: Receiver<Event>,
    sender: Sender<Event>,
    stop_flag: Arc<AtomicBool>,
    input_thread: Option<JoinHandle<()>>,
    finalized: bool,
}

impl CrosstermSurface {
    /// Enter raw mode and the alternate screen, and start the input
    /// thread. Any failure here is a startup fatal for the caller.
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().context("enabling terminal raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)
            .context("entering alternate screen")?;
        let (w, h) = terminal::size().context("querying terminal size")?;

        let (sender, events) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let input_thread = Self::start_input_thread(sender.clone(), Arc::clone(&stop_flag));

        Ok(Self {
            w,
            h,
            cells: vec![None; w as usize * h as usize],
            cursor: None,
            events,
            sender,
            stop_flag,
            input_thread: Some(input_thread),
            finalized: false,
        })
    }

    fn start_input_thread(sender: Sender<Event>, stop_flag: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                match event::poll(INPUT_POLL_INTERVAL) {
                    Ok(false) => {}
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) => {
                            if sender.send(Event::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(CrosstermEvent::Resize(..)) => {
                            if sender.send(Event::Resize).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!(%err, "terminal input read failed");
                            return;
                        }
                    },
                    Err(err) => {
                        tracing::warn!(%err, "terminal input poll failed");
                        return;
                    }
                }
            }
        })
    }

    fn queue_style(out: &mut impl Write, style: Style) -> io::Result<()> {
        match style {
            Style::Default => queue!(out, ResetColor),
            Style::WhiteOnBlue => queue!(out, SetColors(Colors::new(Color::White, Color::Blue))),
            Style::WhiteOnDarkBlue => {
                queue!(out, SetColors(Colors::new(Color::White, Color::DarkBlue)))
            }
        }
    }
}

impl TerminalSurface for CrosstermSurface {
    fn size(&mut self) -> (u16, u16) {
        if let Ok((w, h)) = terminal::size() {
            if (w, h) != (self.w, self.h) {
                self.w = w;
                self.h = h;
                self.cells = vec![None; w as usize * h as usize];
            }
        }
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
        let mut out = io::stdout().lock();
        queue!(out, cursor::Hide)?;
        let mut last_style = None;
        for y in 0..self.h {
            queue!(out, cursor::MoveTo(0, y))?;
            let mut x = 0;
            while x < self.w {
                let (style, ch) = self.cells[y as usize * self.w as usize + x as usize]
                    .unwrap_or((Style::Default, ' '));
                let w = (UnicodeWidthChar::width(ch).unwrap_or(1).max(1)) as u16;
                // A wide rune that would spill past the edge renders as a
                // space so the terminal never wraps.
                let ch = if x + w > self.w { ' ' } else { ch };
                if last_style != Some(style) {
                    Self::queue_style(&mut out, style)?;
                    last_style = Some(style);
                }
                queue!(out, Print(ch))?;
                // The terminal cursor advanced over the covered cells.
                x += if x + w > self.w { 1 } else { w };
            }
        }
        queue!(out, ResetColor)?;
        if let Some((x, y)) = self.cursor {
            queue!(out, cursor::MoveTo(x, y), cursor::Show)?;
        }
        out.flush().context("flushing terminal output")?;
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Event> {
        self.events
            .recv()
            .context("terminal event channel closed")
    }

    fn interrupter(&self) -> Notify {
        let sender = self.sender.clone();
        Arc::new(move || {
            let _ = sender.send(Event::Interrupt);
        })
    }

    fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }

        let mut stdout = io::stdout();
        execute!(stdout, cursor::Show, LeaveAlternateScreen)
            .context("leaving alternate screen")?;
        terminal::disable_raw_mode().context("restoring terminal mode")?;
        Ok(())
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        // Last line of defense; the controller finalizes explicitly on
        // every exit path.
        if !self.finalized {
            let _ = self.finalize();
        }
    }
}
