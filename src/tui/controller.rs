//! # Controller
//!
//! Owns the terminal surface and wires everything together: the stdin
//! capture buffer, the command line editor, the output viewport, and the
//! per-revision pipeline subprocess. Each turn of the main loop restarts
//! the subprocess if asked, redraws the composite screen, then blocks on
//! the next event and dispatches it editor → viewport → global keys.

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;
use crate::pipeline::buffer::CaptureBuf;
use crate::pipeline::subprocess::Subprocess;
use crate::tui::buf_view::BufView;
use crate::tui::editor::Editor;
use crate::tui::io::{Event, Style, TerminalSurface};
use crate::tui::region::{draw_text, Region};

/// What the user chose on exit; executed by `main` after the terminal is
/// restored.
#[derive(Debug, PartialEq, Eq)]
pub enum ExitAction {
    /// Ctrl-C / Ctrl-D: print the pipeline on stderr.
    EmitPipeline(String),
    /// Ctrl-X: save the pipeline as a script.
    WriteScript(String),
}

/// The application main loop.
pub struct Controller<S: TerminalSurface> {
    surface: S,
    config: Config,
    stdin_buf: Arc<CaptureBuf>,
    editor: Editor,
    view: BufView,
    current: Option<Subprocess>,
    last_command: String,
    restart: bool,
    message: String,
}

impl<S: TerminalSurface> Controller<S> {
    pub fn new(surface: S, config: Config, stdin_buf: Arc<CaptureBuf>, initial_pipeline: &str) -> Self {
        let message = format!(
            "Enter runs  ^X exit (^C nosave)  PgUp/PgDn/Up/Dn/^</^> scroll  ^S pause (^Q end)  [Ultimate Plumber v{}]",
            env!("CARGO_PKG_VERSION")
        );
        Self {
            surface,
            config,
            editor: Editor::new("| ", initial_pipeline),
            // Until a command is entered, show the raw input data, as if
            // `cat` had been typed.
            view: BufView::new(Arc::clone(&stdin_buf)),
            stdin_buf,
            current: None,
            last_command: String::new(),
            restart: false,
            message,
        }
    }

    /// Run until the user quits. The subprocess is killed and the terminal
    /// restored before this returns, on success and on error alike.
    pub fn run(&mut self) -> Result<ExitAction> {
        let outcome = self.event_loop();
        if let Some(current) = self.current.take() {
            current.kill();
        }
        let finalize = self.surface.finalize();
        let action = outcome?;
        finalize?;
        Ok(action)
    }

    fn event_loop(&mut self) -> Result<ExitAction> {
        loop {
            self.maybe_restart();
            self.draw()?;

            match self.surface.poll_event()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    if self.editor.handle_key(&key) {
                        self.message.clear();
                        continue;
                    }
                    let (_, h) = self.surface.size();
                    if self.view.handle_key(&key, h as i32 - 1) {
                        self.message.clear();
                        continue;
                    }
                    if let Some(action) = self.handle_global_key(&key) {
                        return Ok(action);
                    }
                }
                // New capture data or a resize; redraw on the next turn.
                Event::Interrupt | Event::Resize => {}
            }
        }
    }

    /// Kill the previous run and launch the current command when a restart
    /// is due (Enter was pressed, or any edit in unsafe mode). An empty
    /// command points the viewport back at the raw input.
    fn maybe_restart(&mut self) {
        let command = self.editor.text();
        if !(self.restart || (self.config.unsafe_mode && command != self.last_command)) {
            return;
        }

        if let Some(current) = self.current.take() {
            current.kill();
        }
        if command.is_empty() {
            self.view.buf = Arc::clone(&self.stdin_buf);
        } else {
            tracing::debug!(%command, "starting pipeline");
            let subprocess = Subprocess::start(
                &self.config.shell,
                &command,
                &self.stdin_buf,
                self.surface.interrupter(),
            );
            self.view.buf = Arc::clone(subprocess.out());
            self.current = Some(subprocess);
        }
        self.restart = false;
        self.last_command = command;
    }

    fn draw(&mut self) -> Result<()> {
        let (w, h) = self.surface.size();
        let (w, h) = (w as i32, h as i32);

        // The command line doubles as a ran/not-yet-run cue: bright while
        // the text differs from what produced the current output.
        let style = if self.editor.text() == self.last_command {
            Style::WhiteOnDarkBlue
        } else {
            Style::WhiteOnBlue
        };

        let no_colors = self.config.no_colors;
        let Self {
            surface,
            editor,
            view,
            stdin_buf,
            message,
            ..
        } = self;

        {
            let mut region = surface_region(surface, no_colors, 0, 0, 1, 1);
            region.set_cell(0, 0, style, stdin_buf.status_indicator());
        }

        let mut cursor = (0, 0);
        {
            let mut region = surface_region(surface, no_colors, 1, 0, w - 1, 1);
            editor.draw_to(&mut region, style, |x, y| cursor = (x, y));
        }
        surface.show_cursor((cursor.0 + 1).max(0) as u16, cursor.1.max(0) as u16);

        {
            let mut region = surface_region(surface, no_colors, 0, 1, w, h - 1);
            view.draw_to(&mut region);
        }
        {
            let mut region = surface_region(surface, no_colors, 0, (h - 1).max(0) as u16, w, 1);
            draw_text(&mut region, Style::WhiteOnBlue, message);
        }

        surface.show()
    }

    fn handle_global_key(&mut self, key: &KeyEvent) -> Option<ExitAction> {
        let plain = key.modifiers.is_empty();
        let ctrl = key.modifiers == KeyModifiers::CONTROL;
        match key.code {
            KeyCode::Enter if plain => {
                self.restart = true;
                None
            }
            KeyCode::Char('s') if ctrl => {
                // Freeze the input, injecting a fake EOF for readers.
                self.stdin_buf.pause(true);
                self.surface.post_interrupt();
                None
            }
            KeyCode::Char('q') if ctrl => {
                // Unfreeze and re-run: the previous run saw a fake EOF.
                self.stdin_buf.pause(false);
                self.restart = true;
                None
            }
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => {
                Some(ExitAction::EmitPipeline(self.editor.text()))
            }
            KeyCode::Char('x') if ctrl => Some(ExitAction::WriteScript(self.editor.text())),
            _ => None,
        }
    }

    #[cfg(test)]
    fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    fn view(&self) -> &BufView {
        &self.view
    }
}

/// A region mapped onto a rectangle of the surface. The `--no-colors`
/// override is applied here so widgets stay style-agnostic.
fn surface_region<'a, S: TerminalSurface>(
    surface: &'a mut S,
    no_colors: bool,
    x: u16,
    y: u16,
    w: i32,
    h: i32,
) -> Region<'a> {
    Region::new(
        w,
        h,
        Box::new(move |dx, dy, style, ch| {
            let style = if no_colors { Style::Default } else { style };
            surface.set_cell(x + dx as u16, y + dy as u16, style, ch);
        }),
    )
}
