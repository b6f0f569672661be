//! # Command Line Editor
//!
//! A single-line rune editor with a readline-like key model: cursor
//! movement (Left/Right, Ctrl-A/E/B/F), kill and yank (Ctrl-K/Y), and
//! unix-word-rubout (Ctrl-W). The editor owns no terminal state; it draws
//! itself into a [`Region`] and reports the cursor through a callback.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::io::Style;
use crate::tui::region::Region;

/// Single-line editor state.
pub struct Editor {
    prompt: Vec<char>,
    value: Vec<char>,
    killspace: Vec<char>,
    cursor: usize,
    /// Rendered width of `value` on the last draw; the next draw blanks
    /// any columns beyond the new value so shrinking erases cleanly.
    lastw: usize,
}

impl Editor {
    pub fn new(prompt: &str, value: &str) -> Self {
        let value: Vec<char> = value.chars().collect();
        let cursor = value.len();
        let lastw = value.len();
        Self {
            prompt: prompt.chars().collect(),
            value,
            killspace: Vec::new(),
            cursor,
            lastw,
        }
    }

    /// Current command text.
    pub fn text(&self) -> String {
        self.value.iter().collect()
    }

    pub fn draw_to(
        &mut self,
        region: &mut Region<'_>,
        style: Style,
        mut set_cursor: impl FnMut(i32, i32),
    ) {
        for (i, &ch) in self.prompt.iter().enumerate() {
            region.set_cell(i as i32, 0, style, ch);
        }
        for (i, &ch) in self.value.iter().enumerate() {
            region.set_cell((self.prompt.len() + i) as i32, 0, style, ch);
        }

        // Blank the remains of a longer previous value.
        for i in self.value.len()..self.lastw {
            region.set_cell((self.prompt.len() + i) as i32, 0, Style::Default, ' ');
        }
        self.lastw = self.value.len();

        set_cursor((self.prompt.len() + self.cursor) as i32, 0);
    }

    /// Handle an editing or movement key; false when the key is not ours.
    pub fn handle_key(&mut self, ev: &KeyEvent) -> bool {
        // A plain character (shift allowed) is inserted as-is.
        if let KeyCode::Char(ch) = ev.code {
            if ev.modifiers.difference(KeyModifiers::SHIFT).is_empty() {
                self.insert(&[ch]);
                return true;
            }
        }

        let plain = ev.modifiers.is_empty();
        let ctrl = ev.modifiers == KeyModifiers::CONTROL;
        match ev.code {
            KeyCode::Backspace if plain => self.delete(-1),
            KeyCode::Delete if plain => self.delete(0),
            KeyCode::Left if plain => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('b') if ctrl => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right if plain => self.cursor = (self.cursor + 1).min(self.value.len()),
            KeyCode::Char('f') if ctrl => self.cursor = (self.cursor + 1).min(self.value.len()),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.value.len(),
            KeyCode::Char('k') if ctrl => self.kill(),
            KeyCode::Char('y') if ctrl => {
                let killspace = self.killspace.clone();
                self.insert(&killspace);
            }
            KeyCode::Char('w') if ctrl => self.unix_word_rubout(),
            _ => return false,
        }
        true
    }

    /// Splice runes in at the cursor and advance past them.
    fn insert(&mut self, runes: &[char]) {
        self.value.splice(self.cursor..self.cursor, runes.iter().copied());
        self.cursor += runes.len();
    }

    /// Delete the rune at `cursor + dx` (−1 backspace, 0 delete) if in range.
    fn delete(&mut self, dx: isize) {
        let Some(pos) = self.cursor.checked_add_signed(dx) else {
            return;
        };
        if pos >= self.value.len() {
            return;
        }
        self.value.remove(pos);
        self.cursor = pos;
    }

    /// Move `value[cursor..]` into the kill buffer and truncate.
    fn kill(&mut self) {
        if self.cursor != self.value.len() {
            self.killspace.clear();
            self.killspace.extend_from_slice(&self.value[self.cursor..]);
        }
        self.value.truncate(self.cursor);
    }

    /// Delete backwards to a word boundary, saving the removed slice into
    /// the kill buffer. A word boundary sits after whitespace preceding a
    /// non-space run, so trailing blanks are consumed with their word
    /// (`unix-word-rubout` from readline).
    fn unix_word_rubout(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut pos = self.cursor - 1;
        while pos != 0 && (is_blank(self.value[pos]) || !is_blank(self.value[pos - 1])) {
            pos -= 1;
        }
        self.killspace.clear();
        self.killspace
            .extend_from_slice(&self.value[pos..self.cursor]);
        self.value.drain(pos..self.cursor);
        self.cursor = pos;
    }
}

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Editor with the cursor placed between the two halves.
    fn editor_between(before_cursor: &str, after_cursor: &str) -> Editor {
        let mut editor = Editor::new("", &format!("{before_cursor}{after_cursor}"));
        editor.cursor = before_cursor.chars().count();
        editor
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn insert_at_every_position() {
        let cases = [
            ("", "abc", &['X'][..], "Xabc"),
            ("", "abc", &['☃'][..], "☃abc"),
            ("a", "bc", &['X'][..], "aXbc"),
            ("a", "bc", &['☃'][..], "a☃bc"),
            ("abc", "", &['X'][..], "abcX"),
            ("abc", "", &['☃'][..], "abc☃"),
            ("a", "bc", &['X', 'Y'][..], "aXYbc"),
        ];
        for (before, after, runes, want) in cases {
            let mut editor = editor_between(before, after);
            editor.insert(runes);
            assert_eq!(editor.text(), want, "insert {runes:?} into {before:?}|{after:?}");
        }
    }

    #[test]
    fn insert_then_backspace_is_identity() {
        let mut editor = editor_between("lorem", " dolor");
        editor.insert(&['i', 'p', 's']);
        for _ in 0..3 {
            editor.delete(-1);
        }
        assert_eq!(editor.text(), "lorem dolor");
        assert_eq!(editor.cursor, 5);
    }

    #[test]
    fn unix_word_rubout_cases() {
        let cases = [
            // (before cursor, after cursor, want value, want killspace)
            ("", "abc", "abc", ""),
            (" ", "abc", "abc", " "),
            (" a", "bc", " bc", "a"),
            ("ab", "c", "c", "ab"),
            ("lorem ipsum", " dolor", "lorem  dolor", "ipsum"),
            ("lorem ipsum ", "dolor", "lorem dolor", "ipsum "),
            ("a b  ", " c", "a  c", "b  "),
            ("a b\t\t", "c", "a c", "b\t\t"),
        ];
        for (before, after, want_value, want_killspace) in cases {
            let mut editor = editor_between(before, after);
            editor.unix_word_rubout();
            assert_eq!(editor.text(), want_value, "value for {before:?}|{after:?}");
            assert_eq!(
                editor.killspace.iter().collect::<String>(),
                want_killspace,
                "killspace for {before:?}|{after:?}"
            );
        }
    }

    #[test]
    fn rubout_takes_the_word_with_its_trailing_space() {
        let mut editor = editor_between("lorem ipsum ", "dolor");
        assert_eq!(editor.cursor, 12);
        editor.unix_word_rubout();
        assert_eq!(editor.text(), "lorem dolor");
        assert_eq!(editor.killspace.iter().collect::<String>(), "ipsum ");
    }

    #[test]
    fn kill_and_yank_round_trip() {
        let mut editor = editor_between("head ", "tail");
        editor.handle_key(&ctrl('k'));
        assert_eq!(editor.text(), "head ");
        editor.handle_key(&ctrl('y'));
        assert_eq!(editor.text(), "head tail");
        // Kill at end of line keeps the previous killspace.
        editor.handle_key(&ctrl('k'));
        editor.handle_key(&ctrl('y'));
        assert_eq!(editor.text(), "head tailtail");
    }

    #[test]
    fn movement_keys_clamp_to_bounds() {
        let mut editor = editor_between("ab", "");
        editor.handle_key(&ctrl('a'));
        assert_eq!(editor.cursor, 0);
        editor.handle_key(&key(KeyCode::Left));
        assert_eq!(editor.cursor, 0);
        editor.handle_key(&ctrl('f'));
        editor.handle_key(&ctrl('e'));
        assert_eq!(editor.cursor, 2);
        editor.handle_key(&key(KeyCode::Right));
        assert_eq!(editor.cursor, 2);
    }

    #[test]
    fn delete_at_boundaries_is_a_no_op() {
        let mut editor = editor_between("", "x");
        editor.delete(-1);
        assert_eq!(editor.text(), "x");
        let mut editor = editor_between("x", "");
        editor.delete(0);
        assert_eq!(editor.text(), "x");
    }

    #[test]
    fn plain_and_shifted_chars_insert_but_ctrl_chars_do_not() {
        let mut editor = editor_between("", "");
        assert!(editor.handle_key(&key(KeyCode::Char('g'))));
        assert!(editor.handle_key(&KeyEvent::new(
            KeyCode::Char('G'),
            KeyModifiers::SHIFT
        )));
        assert_eq!(editor.text(), "gG");
        // Ctrl-T is bound to nothing: not handled, nothing inserted.
        assert!(!editor.handle_key(&ctrl('t')));
        assert_eq!(editor.text(), "gG");
    }

    #[test]
    fn draw_blanks_leftover_columns_after_shrink() {
        let mut editor = Editor::new("| ", "abcdef");
        let mut cells = std::collections::HashMap::new();
        let mut cursor = (0, 0);
        {
            let mut region = Region::new(20, 1, Box::new(|x, y, _, ch| {
                cells.insert((x, y), ch);
            }));
            editor.draw_to(&mut region, Style::WhiteOnBlue, |x, y| cursor = (x, y));
        }
        assert_eq!(cursor, (8, 0));
        assert_eq!(cells.get(&(0, 0)), Some(&'|'));
        assert_eq!(cells.get(&(2, 0)), Some(&'a'));

        // Shrink the value; the next draw must blank the stale columns.
        editor.handle_key(&ctrl('a'));
        editor.handle_key(&ctrl('k'));
        let mut cells = std::collections::HashMap::new();
        {
            let mut region = Region::new(20, 1, Box::new(|x, y, _, ch| {
                cells.insert((x, y), ch);
            }));
            editor.draw_to(&mut region, Style::WhiteOnBlue, |_, _| {});
        }
        for i in 0..6 {
            assert_eq!(cells.get(&(2 + i, 0)), Some(&' '), "column {} not blanked", 2 + i);
        }
    }
}
