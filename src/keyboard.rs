//! On-screen keyboard layout and the logical keys it emits.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Back,
    Clear,
    Enter,
}

impl Key {
    pub fn label(self) -> String {
        match self {
            Self::Char(c) => c.to_string(),
            Self::Space => "SPACE".into(),
            Self::Back => "BACK".into(),
            Self::Clear => "CLEAR".into(),
            Self::Enter => "ENTER".into(),
        }
    }

    pub fn is_wide(self) -> bool {
        !matches!(self, Self::Char(_))
    }
}

const LETTER_ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];
const ACTION_ROW: [Key; 4] = [Key::Space, Key::Back, Key::Clear, Key::Enter];

/// Key rows top to bottom, as drawn.
pub fn rows() -> Vec<Vec<Key>> {
    let mut rows: Vec<Vec<Key>> = LETTER_ROWS
        .iter()
        .map(|r| r.chars().map(Key::Char).collect())
        .collect();
    rows.push(ACTION_ROW.to_vec());
    rows
}

/// Maps a physical key press onto the on-screen vocabulary. Esc clears the
/// line, matching the CLEAR key.
pub fn from_key_event(k: &KeyEvent) -> Option<Key> {
    if k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match k.code {
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Back),
        KeyCode::Esc => Some(Key::Clear),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char(c) if !c.is_control() => Some(Key::Char(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_kiosk_keyboard() {
        let rows = rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].len(), 10);
        assert_eq!(rows[1].len(), 9);
        assert_eq!(rows[2].len(), 7);
        assert_eq!(rows[0][0], Key::Char('Q'));
        assert_eq!(rows[3], vec![Key::Space, Key::Back, Key::Clear, Key::Enter]);
        assert!(Key::Enter.is_wide());
        assert_eq!(Key::Back.label(), "BACK");
    }

    #[test]
    fn physical_keys_map_to_logical_keys() {
        let ev = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(from_key_event(&ev(KeyCode::Char('h'))), Some(Key::Char('h')));
        assert_eq!(from_key_event(&ev(KeyCode::Char(' '))), Some(Key::Space));
        assert_eq!(from_key_event(&ev(KeyCode::Backspace)), Some(Key::Back));
        assert_eq!(from_key_event(&ev(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(from_key_event(&ev(KeyCode::F(5))), None);
        assert_eq!(
            from_key_event(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
    }
}
