use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Style, Stylize},
    text::{Line, Span},
};

/// A single line of editable text
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    value: String,
    masked: bool,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            masked: false,
        }
    }

    /// An input that shows `*` instead of what's typed
    pub fn masked() -> Self {
        Self {
            value: String::new(),
            masked: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Apply a key press. Returns false if the key isn't for us.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }

        match key.code {
            KeyCode::Char(c) => self.value.push(c),
            KeyCode::Backspace => {
                self.value.pop();
            }
            _ => return false,
        };

        true
    }

    /// Render as `label: value`, with a cursor if focused
    pub fn line(&self, label: &str, focused: bool, label_style: Style) -> Line<'static> {
        let shown = if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };

        let mut spans = vec![
            Span::styled(format!("{label}: "), label_style),
            Span::raw(shown),
        ];
        if focused {
            spans.push("_".slow_blink());
        }
        spans.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_deleting() {
        let mut input = TextInput::default();
        assert!(input.handle_key(key(KeyCode::Char('1'))));
        assert!(input.handle_key(key(KeyCode::Char('2'))));
        assert!(input.handle_key(key(KeyCode::Backspace)));
        assert!(!input.handle_key(key(KeyCode::Enter)));
        assert!(!input.handle_key(KeyEvent::new(
            KeyCode::Char('s'),
            KeyModifiers::CONTROL
        )));

        assert_eq!(input.value(), "1");
    }

    #[test]
    fn masked_inputs_hide_text() {
        let mut input = TextInput::masked();
        input.handle_key(key(KeyCode::Char('p')));
        input.handle_key(key(KeyCode::Char('w')));

        let line = input.line("Password", false, Style::default());
        assert_eq!(line.spans[1].content, "**");
    }
}
