use std::{rc::Rc, time::Duration};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lms_client::Session;
use log::{debug, error};
use ratatui::{
    prelude::{Constraint, Direction, Layout, Rect},
    style::Stylize,
    text::{Line, Text},
    widgets::Paragraph,
    Frame,
};

use crate::{
    auth_cache::AuthCache,
    config::Config,
    event::{Event, EventBus, Timer},
    login_prompt::LoginPrompt,
    store::Store,
    styles::success_text,
    ExitState, Screen,
};

mod courses;
mod editor;
mod explorer;

use courses::CourseList;
use editor::Editor;
use explorer::Explorer;

/// How long the "saved" message stays up before the editor closes
const SAVED_MESSAGE_DELAY: Duration = Duration::from_millis(1500);

/// An action that a [`Pane`] or the [`Store`] can request to be taken
pub enum Action {
    /// Do nothing
    None,

    /// Quit the application
    Exit,

    /// Go (back) to the course list
    OpenCourses,

    /// Explore the course with the given id
    OpenExplorer(String),

    /// Edit the course with the given id
    OpenEditor(String),

    /// Go back to the login screen
    Reauthenticate,

    /// The course being edited was saved
    CourseSaved,

    /// Display the given string at the bottom of the screen
    Flash(Text<'static>),
}

/// Something drawn in the main area, that handles its own input.
pub trait Pane {
    fn draw(&mut self, store: &Store, frame: &mut Frame, area: Rect);
    fn handle_event(&mut self, store: &mut Store, event: Event) -> Action;
}

/// Which page of the main screen is showing
enum Page {
    Courses,
    Explorer(Explorer),
    Editor(Editor),
}

/// The main screen of the application
/// Page logic is in the submodules, this just contains shared state and switches between them.
pub struct MainScreen {
    store: Store,
    config: Config,
    session: Session,

    /// Kept around so we return to the same page of courses
    courses: CourseList,
    page: Page,

    flash: Text<'static>,

    events: Rc<EventBus>,
}

impl MainScreen {
    pub fn new(events: Rc<EventBus>, config: Config, session: Session) -> Result<Self> {
        let client = config.client(session.clone())?;
        let mut store = Store::new(&events, client);

        let mut courses = CourseList::new(config.page_size);
        courses.mount(&mut store);

        Ok(Self {
            store,
            courses,
            page: Page::Courses,
            config,
            session,
            flash: Text::raw(""),
            events,
        })
    }

    fn perform(&mut self, action: Action) -> Result<ExitState> {
        match action {
            Action::None => (),
            Action::Exit => return Ok(ExitState::Quit),
            Action::OpenCourses => {
                self.store.reset_course();
                self.courses.mount(&mut self.store);
                self.page = Page::Courses;
            }
            Action::OpenExplorer(course_id) => {
                self.page = Page::Explorer(Explorer::new(&mut self.store, course_id));
            }
            Action::OpenEditor(course_id) => {
                self.page = Page::Editor(Editor::new(&mut self.store, course_id));
            }
            Action::Reauthenticate => {
                if let Err(e) = AuthCache::clear() {
                    error!("error clearing auth cache: {:#}", e);
                }
                return Ok(ExitState::ChangeScreen(Box::new(LoginPrompt::new_with_msg(
                    self.events.clone(),
                    self.config.clone(),
                    "Your session has expired. Please log in again.",
                ))));
            }
            Action::CourseSaved => {
                self.flash = success_text("Course updated successfully.");
                self.events.spawn_timer(
                    SAVED_MESSAGE_DELAY,
                    Timer::ReturnToCourses(self.store.current_generation()),
                );
            }
            Action::Flash(s) => self.flash = s,
        };

        Ok(ExitState::Running)
    }

    fn header(&self) -> Line<'static> {
        let terms = self.store.tenant().terminology();
        let who = self
            .session
            .user_name
            .clone()
            .unwrap_or_else(|| "signed in".to_string());

        vec![
            " LMS ".bold().reversed(),
            format!("  {}", terms.courses).bold(),
            format!("  {} ({:?}) @ {}", who, self.session.role, self.store.tenant()).gray(),
        ]
        .into()
    }
}

impl Screen for MainScreen {
    fn draw(&mut self, frame: &mut Frame) {
        let layout = Layout::new(
            Direction::Vertical,
            [
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ],
        )
        .split(frame.size());

        frame.render_widget(Paragraph::new(self.header()), layout[0]);
        match &mut self.page {
            Page::Courses => self.courses.draw(&self.store, frame, layout[1]),
            Page::Explorer(e) => e.draw(&self.store, frame, layout[1]),
            Page::Editor(e) => e.draw(&self.store, frame, layout[1]),
        }
        frame.render_widget(Paragraph::new(self.flash.clone()), layout[2]);
    }

    /// Handle the given event
    fn handle_event(&mut self, event: Event) -> Result<ExitState> {
        // C-C always exits
        if matches!(
            event,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c') | KeyCode::Char('C'),
                modifiers: KeyModifiers::CONTROL,
                ..
            })
        ) {
            return Ok(ExitState::Quit);
        }

        let action = match event {
            Event::Store(s) => self.store.event(s),
            Event::Timer(Timer::ReturnToCourses(generation)) => match self.page {
                Page::Editor(_) if self.store.is_current(generation) => Action::OpenCourses,
                _ => {
                    debug!("ignoring stale return timer");
                    Action::None
                }
            },
            x => {
                if matches!(x, Event::Key(_)) {
                    self.flash = Text::raw("");
                }
                match &mut self.page {
                    Page::Courses => self.courses.handle_event(&mut self.store, x),
                    Page::Explorer(e) => e.handle_event(&mut self.store, x),
                    Page::Editor(e) => e.handle_event(&mut self.store, x),
                }
            }
        };

        self.perform(action)
    }
}
