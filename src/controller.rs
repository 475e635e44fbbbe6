use std::time::Duration;
use tracing::trace;

use crate::domain::{LVConfig, LVError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &LVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, LVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.map_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn map_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) | (KeyCode::Right, _) => {
                Some(Message::NextPage)
            }
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) | (KeyCode::Left, _) => {
                Some(Message::PreviousPage)
            }
            (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(Message::MoveBeginning),
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(Message::MoveEnd),
            (KeyCode::Enter, _) => Some(Message::Activate),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('/'), _) => Some(Message::EditSearch),
            (KeyCode::Char('c'), _) => Some(Message::PickClients),
            (KeyCode::Char('x'), _) => Some(Message::ClearFilters),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('Y'), _) => Some(Message::CopyProfile),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode, modifiers: KeyModifiers, raw: bool) -> Option<Message> {
        Controller::new(&LVConfig::default()).map_key(KeyEvent::new(code, modifiers), raw)
    }

    #[test]
    fn table_keys() {
        assert_eq!(map(KeyCode::Char('q'), KeyModifiers::NONE, false), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::CONTROL, false), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::NONE, false), Some(Message::PickClients));
        assert_eq!(map(KeyCode::Char('/'), KeyModifiers::NONE, false), Some(Message::EditSearch));
        assert_eq!(map(KeyCode::Enter, KeyModifiers::NONE, false), Some(Message::Activate));
        assert_eq!(map(KeyCode::PageDown, KeyModifiers::NONE, false), Some(Message::NextPage));
        assert_eq!(map(KeyCode::Char('G'), KeyModifiers::SHIFT, false), Some(Message::MoveEnd));
        assert_eq!(map(KeyCode::Char('Y'), KeyModifiers::SHIFT, false), Some(Message::CopyProfile));
        assert_eq!(map(KeyCode::Char('z'), KeyModifiers::NONE, false), None);
    }

    #[test]
    fn raw_keys_pass_through() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map(KeyCode::Char('q'), KeyModifiers::NONE, true), Some(Message::RawKey(key)));
    }
}
