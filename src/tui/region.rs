//! # Region
//!
//! A rectangular drawing target handed to widgets. Widgets see only a
//! width, a height, and a cell setter in region-local coordinates, so the
//! same drawing code runs against the real terminal and the test grid.

use crate::tui::io::Style;

/// Cell setter in region-local coordinates.
pub type SetCell<'a> = Box<dyn FnMut(i32, i32, Style, char) + 'a>;

/// A rectangular drawing target. Pure value: no lifecycle, no clearing;
/// out-of-bounds writes are silently clipped.
pub struct Region<'a> {
    pub w: i32,
    pub h: i32,
    put: SetCell<'a>,
}

impl<'a> Region<'a> {
    pub fn new(w: i32, h: i32, put: SetCell<'a>) -> Self {
        Self { w, h, put }
    }

    pub fn set_cell(&mut self, x: i32, y: i32, style: Style, ch: char) {
        if x >= 0 && x < self.w && y >= 0 && y < self.h {
            (self.put)(x, y, style, ch);
        }
    }
}

/// Write `text` along the region's first row.
pub fn draw_text(region: &mut Region<'_>, style: Style, text: &str) {
    for (x, ch) in text.chars().enumerate() {
        region.set_cell(x as i32, 0, style, ch);
    }
}
