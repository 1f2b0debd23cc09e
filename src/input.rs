pub const TITLE_CHAR_LIMIT: usize = 200;
pub const MIN_WIDTH: u16 = 40;
pub const MAX_WIDTH: u16 = 60;

/// Single-line text field used for task titles. Cursor positions count chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    chars: Vec<char>,
    cursor: usize,
    width: u16,
    pub placeholder: String,
    pub char_limit: usize,
}

impl Default for LineInput {
    fn default() -> Self {
        LineInput {
            chars: Vec::new(),
            cursor: 0,
            width: MIN_WIDTH,
            placeholder: String::new(),
            char_limit: TITLE_CHAR_LIMIT,
        }
    }
}

impl LineInput {
    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Replaces the content and puts the cursor at the end.
    pub fn set_value(&mut self, value: &str) {
        self.chars = value.chars().take(self.char_limit).collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Sizes the field from the terminal width, leaving a margin.
    pub fn resize(&mut self, terminal_width: u16) {
        self.width = terminal_width.saturating_sub(4).clamp(MIN_WIDTH, MAX_WIDTH);
    }

    pub fn insert_char(&mut self, c: char) {
        if c.is_control() || self.chars.len() >= self.char_limit {
            return;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.chars.len() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.chars.len();
    }

    /// The slice of text that fits the field, scrolled so the cursor stays
    /// visible. Returns the text and the cursor offset within it.
    pub fn visible(&self) -> (String, usize) {
        let width = self.width as usize;
        let start = if self.cursor >= width {
            self.cursor + 1 - width
        } else {
            0
        };
        let end = (start + width).min(self.chars.len());
        let text = self.chars[start..end].iter().collect();
        (text, self.cursor - start)
    }
}
