//! # Buffer Viewport
//!
//! A scrollable window onto a capture buffer. The origin `(x, y)` counts
//! display columns clipped off the left of every line and whole lines
//! skipped from the top. Content wider than the region is clipped with
//! `«`/`»` overflow markers; wide runes that straddle an edge are replaced
//! by markers across the columns they would have covered. Drawing reads
//! the buffer through a snapshot cursor, so a redraw never blocks.

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use unicode_width::UnicodeWidthChar;

use crate::pipeline::buffer::CaptureBuf;
use crate::tui::io::Style;
use crate::tui::region::Region;
use crate::tui::text::{RuneSource, Runes, TabExpander};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Columns moved per horizontal scroll step.
const SCROLL_X: i32 = 8;

/// Left/right overflow markers (single-width).
const MARKER_LEFT: char = '\u{ab}';
const MARKER_RIGHT: char = '\u{bb}';

/// Viewport state over a capture buffer.
pub struct BufView {
    /// Display columns clipped off the left of every rendered line.
    pub x: i32,
    /// Logical lines skipped from the top of the buffer.
    pub y: i32,
    pub buf: Arc<CaptureBuf>,
}

impl BufView {
    pub fn new(buf: Arc<CaptureBuf>) -> Self {
        Self { x: 0, y: 0, buf }
    }

    /// Render the visible window into `region`. Idempotent for a fixed
    /// buffer snapshot and scroll origin.
    pub fn draw_to(&self, region: &mut Region<'_>) {
        let mut lines = BufReader::new(self.buf.open_reader(false));

        // Skip whole lines above the window; hitting EOF first leaves the
        // rune stream empty and every row renders blank.
        let mut skipped = Vec::new();
        for _ in 0..self.y {
            skipped.clear();
            match lines.read_until(b'\n', &mut skipped) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }

        let mut src = TabExpander::new(Runes::new(lines));
        let mut y = 0;
        let mut row = RowState::new(-self.x);
        loop {
            let ch = src.read_rune().unwrap_or(None);
            if y >= region.h {
                break;
            }
            match ch {
                None => {
                    row.end_line(region, y);
                    y += 1;
                    break;
                }
                Some('\n') => {
                    row.end_line(region, y);
                    y += 1;
                    row = RowState::new(-self.x);
                }
                Some(ch) => row.print_ch(region, y, ch),
            }
        }
        while y < region.h {
            RowState::new(-self.x).end_line(region, y);
            y += 1;
        }
    }

    /// Handle a scrolling key; false when the key is not ours.
    /// `page_size` is the vertical distance for PgUp/PgDn.
    pub fn handle_key(&mut self, ev: &KeyEvent, page_size: i32) -> bool {
        let plain = ev.modifiers.is_empty();
        let scroll = ev
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match ev.code {
            KeyCode::Up if plain => {
                self.y -= 1;
                self.normalize_y();
            }
            KeyCode::Down if plain => {
                self.y += 1;
                self.normalize_y();
            }
            KeyCode::PageUp if plain => {
                self.y -= page_size;
                self.normalize_y();
            }
            KeyCode::PageDown if plain => {
                self.y += page_size;
                self.normalize_y();
            }
            KeyCode::Left if scroll => self.x = (self.x - SCROLL_X).max(0),
            KeyCode::Right if scroll => self.x += SCROLL_X,
            KeyCode::Home if scroll => self.x = 0,
            _ => return false,
        }
        true
    }

    fn normalize_y(&mut self) {
        let nlines = self.buf.line_count() as i32;
        self.y = self.y.clamp(0, (nlines - 1).max(0));
    }
}

/// Per-row clipping state while laying runes onto one screen row.
struct RowState {
    x: i32,
    overflow_left: bool,
    last_rune_w: i32,
}

impl RowState {
    fn new(x: i32) -> Self {
        Self {
            x,
            overflow_left: false,
            last_rune_w: 1,
        }
    }

    fn print_ch(&mut self, region: &mut Region<'_>, y: i32, ch: char) {
        let w = (UnicodeWidthChar::width(ch).unwrap_or(0) as i32).max(1);
        if (self.overflow_left && self.x == 0) || (self.x < 0 && self.x + w > 0) {
            // The rune straddles the left edge.
            fill(region, y, 0, MARKER_LEFT, self.x + w);
        } else if self.x < 0 {
            // Wholly off-left; remember that for the edge column.
            self.overflow_left = true;
        } else if self.x == region.w {
            // First rune entirely past the right edge: retroactively mark
            // the last rune's cells.
            fill(region, y, self.x - self.last_rune_w, MARKER_RIGHT, self.last_rune_w);
        } else if self.x < region.w && self.x + w > region.w {
            // The rune straddles the right edge.
            fill(region, y, self.x, MARKER_RIGHT, region.w - self.x);
        } else {
            region.set_cell(self.x, y, Style::Default, ch);
        }
        self.x += w;
        self.last_rune_w = w;
    }

    fn end_line(&mut self, region: &mut Region<'_>, y: i32) {
        let mut x_start = self.x.max(0);
        if x_start == 0 && self.overflow_left {
            region.set_cell(0, y, Style::Default, MARKER_LEFT);
            x_start += 1;
        }
        fill(region, y, x_start, ' ', region.w - x_start);
    }
}

fn fill(region: &mut Region<'_>, y: i32, x0: i32, ch: char, w: i32) {
    for i in 0..w.max(0) {
        region.set_cell(x0 + i, y, Style::Default, ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::io::{MockSurface, TerminalSurface};

    const W: i32 = 10;
    const H: i32 = 10;

    /// Render `view` onto a fresh 10x10 grid and return its rows.
    fn draw(view: &BufView) -> Vec<String> {
        let mut surface = MockSurface::new(W as u16, H as u16);
        {
            let mut region = Region::new(
                W,
                H,
                Box::new(|x, y, style, ch| surface.set_cell(x as u16, y as u16, style, ch)),
            );
            view.draw_to(&mut region);
        }
        (0..H as u16).map(|y| surface.row_text(y)).collect()
    }

    fn view_of(text: &str) -> BufView {
        BufView::new(CaptureBuf::preloaded(1000, text.as_bytes()))
    }

    fn scrolled(mut view: BufView, x: i32, y: i32) -> BufView {
        view.x = x;
        view.y = y;
        view
    }

    #[test]
    fn long_line_trimmed_on_the_right() {
        let rows = draw(&view_of("1234567890xyz"));
        assert_eq!(rows[0], "123456789»");
        for row in &rows[1..] {
            assert_eq!(row, "          ");
        }
    }

    #[test]
    fn long_lines_trimmed_on_left_and_right() {
        let view = scrolled(
            view_of("1234567890xyz\n吃3456789_123\n喝茶56789_123\n1茶456789_123\n1喝茶6789_123"),
            2,
            0,
        );
        let rows = draw(&view);
        assert_eq!(rows[0], "«4567890x»");
        assert_eq!(rows[1], "«456789_1»");
        assert_eq!(rows[2], "««56789_1»");
        assert_eq!(rows[3], "«456789_1»");
        assert_eq!(rows[4], "«茶6789_1»");
    }

    #[test]
    fn wide_characters_fit_cleanly() {
        let rows = draw(&view_of("吃饭\n喝茶\n睡觉"));
        assert_eq!(rows[0], "吃饭      ");
        assert_eq!(rows[1], "喝茶      ");
        assert_eq!(rows[2], "睡觉      ");
        assert_eq!(rows[3], "          ");
    }

    #[test]
    fn wide_characters_trimmed_halfway_on_the_left() {
        let view = scrolled(
            view_of("吃3456789_123\n喝茶56789_123\n1吃456789_123\n1喝茶6789_123"),
            1,
            0,
        );
        let rows = draw(&view);
        assert_eq!(rows[0], "«3456789_»");
        assert_eq!(rows[1], "«茶56789_»");
        assert_eq!(rows[2], "««456789_»");
        assert_eq!(rows[3], "««茶6789_»");
    }

    #[test]
    fn wide_characters_trimmed_halfway_on_the_right() {
        let view = view_of(
            "1234567890喝茶bc\n123456789喝茶abc\n12345678喝茶zabc\n1234567喝茶yzabc\n123456喝茶xyzabc\n12345喝茶0xyzabc\n1234喝茶90xyzabc",
        );
        let rows = draw(&view);
        assert_eq!(rows[0], "123456789»");
        assert_eq!(rows[1], "123456789»");
        assert_eq!(rows[2], "12345678»»");
        assert_eq!(rows[3], "1234567喝»");
        assert_eq!(rows[4], "123456喝»»");
        assert_eq!(rows[5], "12345喝茶»");
        assert_eq!(rows[6], "1234喝茶9»");
    }

    #[test]
    fn single_tabulations() {
        let rows = draw(&view_of("\tA\n1\tB\n1234567\tC\n喝\tD"));
        assert_eq!(rows[0], "        A ");
        assert_eq!(rows[1], "1       B ");
        assert_eq!(rows[2], "1234567 C ");
        assert_eq!(rows[3], "喝      D ");
    }

    #[test]
    fn left_trimmed_single_tabulations() {
        let view = scrolled(view_of("\tA\n1\tB\n1234567\tC\n喝\tD"), 3, 0);
        let rows = draw(&view);
        assert_eq!(rows[0], "«    A    ");
        assert_eq!(rows[1], "«    B    ");
        assert_eq!(rows[2], "«567 C    ");
        assert_eq!(rows[3], "«    D    ");
    }

    #[test]
    fn vertical_scroll_skips_lines() {
        let view = scrolled(view_of("one\ntwo\nthree"), 0, 1);
        let rows = draw(&view);
        assert_eq!(rows[0], "two       ");
        assert_eq!(rows[1], "three     ");
    }

    #[test]
    fn scroll_past_the_end_renders_blank_rows() {
        let view = scrolled(view_of("one\ntwo"), 0, 9);
        for row in draw(&view) {
            assert_eq!(row, "          ");
        }
    }

    #[test]
    fn draw_is_idempotent_for_a_fixed_snapshot() {
        let view = scrolled(view_of("1234567890xyz\n吃饭喝茶"), 2, 0);
        assert_eq!(draw(&view), draw(&view));
    }

    #[test]
    fn vertical_keys_clamp_to_line_count() {
        let mut view = view_of("one\ntwo\nthree");
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        let page_down = KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE);

        assert!(view.handle_key(&up, 5));
        assert_eq!(view.y, 0);
        assert!(view.handle_key(&page_down, 5));
        assert_eq!(view.y, 2);
        assert!(view.handle_key(&down, 5));
        assert_eq!(view.y, 2);
    }

    #[test]
    fn horizontal_keys_step_by_eight_and_clamp_left() {
        let mut view = view_of("wide");
        let ctrl_right = KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL);
        let alt_left = KeyEvent::new(KeyCode::Left, KeyModifiers::ALT);
        let ctrl_home = KeyEvent::new(KeyCode::Home, KeyModifiers::CONTROL);

        assert!(view.handle_key(&ctrl_right, 5));
        assert!(view.handle_key(&ctrl_right, 5));
        assert_eq!(view.x, 16);
        assert!(view.handle_key(&alt_left, 5));
        assert_eq!(view.x, 8);
        assert!(view.handle_key(&ctrl_home, 5));
        assert_eq!(view.x, 0);
        assert!(view.handle_key(&alt_left, 5));
        assert_eq!(view.x, 0);
    }

    #[test]
    fn unscrolled_keys_are_not_handled() {
        let mut view = view_of("text");
        let plain_left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert!(!view.handle_key(&plain_left, 5));
        assert!(!view.handle_key(&enter, 5));
    }
}
