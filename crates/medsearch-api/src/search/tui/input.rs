//! Single-line query editor

use crossterm::event::{KeyCode, KeyModifiers};

/// Query text plus a byte-offset cursor that always sits on a char boundary
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryInput {
    pub text: String,
    pub cursor: usize,
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '/'
}

/// Byte offset of the start of the word before `cursor`
fn word_start_before(text: &str, cursor: usize) -> usize {
    let head = &text[..cursor];
    let trimmed = head.trim_end_matches(is_word_boundary);
    trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| is_word_boundary(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

/// Byte offset of the end of the word after `cursor`
fn word_end_after(text: &str, cursor: usize) -> usize {
    let tail = &text[cursor..];
    let skipped = tail.len() - tail.trim_start_matches(is_word_boundary).len();
    let rest = &tail[skipped..];
    let word = rest.find(is_word_boundary).unwrap_or(rest.len());
    cursor + skipped + word
}

impl QueryInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole text and park the cursor at the end
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    fn prev_char(&self) -> usize {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_char(&self) -> usize {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.cursor)
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        let prev = self.prev_char();
        self.text.drain(prev..self.cursor);
        self.cursor = prev;
    }

    pub fn delete(&mut self) {
        let next = self.next_char();
        self.text.drain(self.cursor..next);
    }

    pub fn delete_word_before(&mut self) {
        let start = word_start_before(&self.text, self.cursor);
        self.text.drain(start..self.cursor);
        self.cursor = start;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Apply an editing key. Returns true if the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        // macOS Option may report as SUPER
        let word = modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER);

        match code {
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('w') if ctrl => self.delete_word_before(),
            KeyCode::Backspace if word => self.delete_word_before(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.text.len(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            KeyCode::Char('b') if word => self.cursor = word_start_before(&self.text, self.cursor),
            KeyCode::Char('f') if word => self.cursor = word_end_after(&self.text, self.cursor),
            KeyCode::Left if word || ctrl => {
                self.cursor = word_start_before(&self.text, self.cursor)
            }
            KeyCode::Right if word || ctrl => self.cursor = word_end_after(&self.text, self.cursor),
            KeyCode::Left => self.cursor = self.prev_char(),
            KeyCode::Right => self.cursor = self.next_char(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(c) if !ctrl && !word => self.insert_char(c),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> QueryInput {
        let mut input = QueryInput::new();
        for c in s.chars() {
            input.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        input
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = typed("parä");
        assert_eq!(input.text, "parä");
        assert_eq!(input.cursor, "parä".len());

        input.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(input.text, "par");
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn test_insert_in_the_middle() {
        let mut input = typed("pcm");
        input.handle_key(KeyCode::Left, KeyModifiers::NONE);
        input.handle_key(KeyCode::Left, KeyModifiers::NONE);
        input.handle_key(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(input.text, "pacm");
        assert_eq!(input.cursor, 2);
    }

    #[test]
    fn test_word_motion_and_delete() {
        let mut input = typed("Paracetamol 500mg tab");
        input.handle_key(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(input.text, "Paracetamol 500mg ");

        input.handle_key(KeyCode::Left, KeyModifiers::ALT);
        assert_eq!(input.cursor, "Paracetamol ".len());

        input.handle_key(KeyCode::Right, KeyModifiers::CONTROL);
        assert_eq!(input.cursor, "Paracetamol 500mg".len());
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = typed("aspirin");
        assert!(input.handle_key(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(input, QueryInput::new());
    }

    #[test]
    fn test_unhandled_keys_are_not_consumed() {
        let mut input = typed("a");
        assert!(!input.handle_key(KeyCode::Enter, KeyModifiers::NONE));
        assert!(!input.handle_key(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(input.text, "a");
    }

    #[test]
    fn test_set_text_moves_cursor_to_end() {
        let mut input = typed("par");
        input.handle_key(KeyCode::Home, KeyModifiers::NONE);
        input.set_text("Paradil DS");
        assert_eq!(input.cursor, "Paradil DS".len());
    }
}
