use std::{io, rc::Rc};

use anyhow::Result;
use event::{Event, EventBus};
use log::{error, info};
use ratatui::prelude::*;
use simplelog::{LevelFilter, WriteLogger};
use xdg::BaseDirectories;

mod auth_cache;
mod config;
mod event;
mod login_prompt;
mod main_screen;
mod store;
mod styles;
mod tui;
mod widgets;

use auth_cache::AuthCache;
use config::Config;
use login_prompt::LoginPrompt;
use main_screen::MainScreen;

/// A full-screen part of the application, ie the login prompt or the main screen.
pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_event(&mut self, event: Event) -> Result<ExitState>;
}

/// What to do after a screen has handled an event
pub enum ExitState {
    Running,
    Quit,
    ChangeScreen(Box<dyn Screen>),
}

fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load_or_default();
    let events = Rc::new(EventBus::new());
    events.spawn_terminal_listener();

    let mut screen: Box<dyn Screen> = match AuthCache::load() {
        Ok(cache) if cache.session.is_logged_in() => {
            match MainScreen::new(events.clone(), config.clone(), cache.session) {
                Ok(s) => Box::new(s),
                Err(e) => {
                    error!("error starting with cached session: {:#}", e);
                    Box::new(LoginPrompt::new(events.clone(), config.clone()))
                }
            }
        }
        _ => Box::new(LoginPrompt::new(events.clone(), config.clone())),
    };

    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::new(backend)?;
    tui::init(&mut terminal)?;

    loop {
        tui::draw(&mut terminal, screen.as_mut())?;
        match screen.handle_event(events.next()?)? {
            ExitState::Running => (),
            ExitState::Quit => break,
            ExitState::ChangeScreen(s) => screen = s,
        }
    }

    info!("exiting");
    tui::exit(&mut terminal)?;

    Ok(())
}

/// Log to a file, since the terminal is ours. `LMS_TUI_DEBUG` turns on debug logs, including response bodies.
fn init_logging() -> Result<()> {
    let path = BaseDirectories::with_prefix("lms-tui")?.place_state_file("lms-tui.log")?;
    let level = match std::env::var_os("LMS_TUI_DEBUG") {
        Some(_) => LevelFilter::Debug,
        None => LevelFilter::Info,
    };

    WriteLogger::init(
        level,
        simplelog::Config::default(),
        std::fs::File::create(path)?,
    )?;

    Ok(())
}
