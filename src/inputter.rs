use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line text input. The cursor counts characters, not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.current_input.clear();
                self.curser_pos = 0;
                self.get()
            }
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
        self.finished = false;
        self.canceled = false;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let idx = self.byte_pos();
            self.current_input.remove(idx);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            let idx = self.byte_pos();
            self.current_input.remove(idx);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        if modifier.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            trace!("Ignoring {code:?} with {modifier:?}");
        } else if let Some(chr) = code.as_char() {
            let idx = self.byte_pos();
            self.current_input.insert(idx, chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(input: &mut Inputter, code: KeyCode) -> InputResult {
        input.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(input: &mut Inputter, text: &str) -> InputResult {
        let mut result = input.get();
        for c in text.chars() {
            result = press(input, KeyCode::Char(c));
        }
        result
    }

    #[test]
    fn typing() {
        let mut input = Inputter::default();
        let result = type_text(&mut input, "smith");
        assert_eq!(result.input, "smith");
        assert_eq!(result.curser_pos, 5);
        assert!(!result.finished);
    }

    #[test]
    fn edit_in_the_middle() {
        let mut input = Inputter::default();
        type_text(&mut input, "smth");
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        let result = type_text(&mut input, "i");
        assert_eq!(result.input, "smith");

        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Delete);
        let result = press(&mut input, KeyCode::End);
        assert_eq!(result.input, "mith");
        assert_eq!(result.curser_pos, 4);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut input = Inputter::default();
        type_text(&mut input, "o'bxrien");
        for _ in 0..4 {
            press(&mut input, KeyCode::Left);
        }
        let result = press(&mut input, KeyCode::Backspace);
        assert_eq!(result.input, "o'brien");
        assert_eq!(result.curser_pos, 3);
    }

    #[test]
    fn multibyte_characters() {
        let mut input = Inputter::default();
        type_text(&mut input, "élodie");
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Right);
        let result = press(&mut input, KeyCode::Backspace);
        assert_eq!(result.input, "lodie");
    }

    #[test]
    fn enter_and_escape() {
        let mut input = Inputter::default();
        type_text(&mut input, "doe");
        let result = press(&mut input, KeyCode::Enter);
        assert!(result.finished);
        assert!(!result.canceled);
        assert_eq!(result.input, "doe");

        input.set("doe");
        let result = press(&mut input, KeyCode::Esc);
        assert!(result.finished);
        assert!(result.canceled);
        assert!(result.input.is_empty());
    }

    #[test]
    fn control_keys_are_not_text() {
        let mut input = Inputter::default();
        type_text(&mut input, "abc");
        let result = input.read(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(result.input, "abc");
        let result = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(result.input.is_empty());
    }
}
