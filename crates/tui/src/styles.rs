use ratatui::{
    prelude::Text,
    style::{Color, Modifier, Style},
};

pub fn error_text(t: impl Into<Text<'static>>) -> Text<'static> {
    let mut t = t.into();
    t.patch_style(Style::default().fg(Color::Red));
    t
}

pub fn success_text(t: impl Into<Text<'static>>) -> Text<'static> {
    let mut t = t.into();
    t.patch_style(Style::default().fg(Color::Green));
    t
}

/// Border of whatever has focus
pub fn focused() -> Style {
    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
}

/// Rows and buttons that are currently active
pub fn active() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn disabled() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Placeholder blocks shown while loading
pub fn skeleton() -> Style {
    Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
}
