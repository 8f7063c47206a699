use std::rc::Rc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lms_client::{Credentials, Error as ClientError, Session};
use log::{error, info};
use ratatui::{
    prelude::Alignment,
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    auth_cache::AuthCache,
    config::Config,
    event::{Event, EventBus},
    main_screen::MainScreen,
    styles::{self, error_text},
    widgets::{centered_rect, TextInput},
    ExitState, Screen,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Email,
    Password,
    Remember,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Email => Focus::Password,
            Focus::Password => Focus::Remember,
            Focus::Remember => Focus::Email,
        }
    }

    fn prev(self) -> Self {
        self.next().next()
    }
}

/// Asks for an email and password, and logs in with them.
pub struct LoginPrompt {
    events: Rc<EventBus>,
    config: Config,

    email: TextInput,
    password: TextInput,
    remember: bool,
    focus: Focus,

    msg: Text<'static>,
}

impl LoginPrompt {
    pub fn new(events: Rc<EventBus>, config: Config) -> Self {
        Self {
            events,
            config,
            email: TextInput::default(),
            password: TextInput::masked(),
            remember: true,
            focus: Focus::Email,
            msg: Text::raw(""),
        }
    }

    /// Show the given error message to start with
    pub fn new_with_msg(events: Rc<EventBus>, config: Config, msg: &str) -> Self {
        Self {
            msg: error_text(msg.to_string()),
            ..Self::new(events, config)
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        let email = self.email.value().trim();
        if email.is_empty() || self.password.value().is_empty() {
            return None;
        }

        Some(Credentials {
            email: email.to_string(),
            password: self.password.value().to_string().into(),
        })
    }

    /// Try to log in. This blocks, but there's nothing else to draw meanwhile.
    fn login(&mut self) -> Result<ExitState> {
        let Some(creds) = self.credentials() else {
            self.msg = error_text("Please enter your email and password.");
            return Ok(ExitState::Running);
        };

        let session = match self.config.client(Session::default())?.login(&creds) {
            Ok(s) => s,
            Err(ClientError::Status { message, .. }) if !message.is_empty() => {
                self.msg = error_text(message);
                self.password.clear();
                return Ok(ExitState::Running);
            }
            Err(e) => {
                error!("error logging in: {}", e);
                self.msg = error_text(e.user_message());
                self.password.clear();
                return Ok(ExitState::Running);
            }
        };
        info!("logged in as {:?} on tenant {}", session.role, session.tenant_id);

        if self.remember {
            let cache = AuthCache {
                session: session.clone(),
            };
            if let Err(e) = cache.save() {
                error!("error saving auth cache: {:#}", e);
            }
        }

        Ok(ExitState::ChangeScreen(Box::new(MainScreen::new(
            self.events.clone(),
            self.config.clone(),
            session,
        )?)))
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<ExitState> {
        match key.code {
            KeyCode::Esc => return Ok(ExitState::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(ExitState::Quit)
            }
            KeyCode::Enter => return self.login(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Char(' ') if self.focus == Focus::Remember => self.remember = !self.remember,
            _ => {
                match self.focus {
                    Focus::Email => self.email.handle_key(key),
                    Focus::Password => self.password.handle_key(key),
                    Focus::Remember => false,
                };
            }
        };

        Ok(ExitState::Running)
    }
}

impl Screen for LoginPrompt {
    fn draw(&mut self, frame: &mut Frame) {
        let area = centered_rect(60, 50, frame.size());
        let label = |f: Focus| {
            if self.focus == f {
                styles::focused()
            } else {
                Style::default()
            }
        };

        let mut text = Text::from(vec![
            Line::from(format!("API: {}", self.config.api_url).gray()),
            Line::raw(""),
            self.email
                .line("Email", self.focus == Focus::Email, label(Focus::Email)),
            self.password.line(
                "Password",
                self.focus == Focus::Password,
                label(Focus::Password),
            ),
            Line::from(Span::styled(
                format!("[{}] Remember me", if self.remember { "x" } else { " " }),
                label(Focus::Remember),
            )),
            Line::raw(""),
        ]);
        text.lines.extend(self.msg.lines.iter().cloned());
        text.lines.push(Line::raw(""));
        text.lines
            .push(Line::from("Tab next field · Enter log in · Esc quit".gray()));

        frame.render_widget(
            Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Log in ")
                    .title_alignment(Alignment::Center),
            ),
            area,
        );
    }

    fn handle_event(&mut self, event: Event) -> Result<ExitState> {
        match event {
            Event::Key(key) => self.handle_key(key),
            _ => Ok(ExitState::Running),
        }
    }
}
