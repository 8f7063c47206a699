//! Browsing one course: a module tree on the left, the selected video on the right.
use crossterm::event::{KeyCode, KeyEvent};
use lms_client::modules::Module;
use log::debug;
use ratatui::{
    prelude::{Constraint, Direction, Layout, Rect},
    style::Stylize,
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{Action, Pane};
use crate::{
    event::Event,
    store::{Loadable, Store},
    styles::{self, error_text},
    widgets::TextInput,
};

mod navigation;
mod player;
mod quiz;
mod state;

use navigation::Navigation;
use player::QuizSlot;
use quiz::{Affordance, ModalOutcome, QuizModal};
use state::{ExplorerState, Transition};

/// The course explorer page
pub struct Explorer {
    course_id: String,
    state: ExplorerState,
    navigation: Navigation,
    player_focused: bool,

    /// Whether keys go to the search box
    searching: bool,
    search: TextInput,

    modal: Option<QuizModal>,

    /// Set once we've expanded the first module of a freshly loaded tree
    expanded: bool,
}

impl Explorer {
    pub fn new(store: &mut Store, course_id: String) -> Self {
        store.open_course(&course_id);
        Self {
            course_id,
            state: ExplorerState::default(),
            navigation: Navigation::default(),
            player_focused: false,
            searching: false,
            search: TextInput::default(),
            modal: None,
            expanded: false,
        }
    }

    fn reload(&mut self, store: &mut Store) {
        store.open_course(&self.course_id);
        self.state = ExplorerState::default();
        self.navigation = Navigation::default();
        self.search.clear();
        self.modal = None;
        self.expanded = false;
    }

    /// Everything we need to show the tree, or the message to show instead.
    fn loaded<'a>(store: &'a Store) -> Result<&'a [Module], Text<'static>> {
        match (store.course(), store.modules()) {
            (Loadable::Failed(msg), _) | (_, Loadable::Failed(msg)) => {
                let mut text = error_text(msg.clone());
                text.lines.extend(["", "Press R to reload, or q to go back."].map(Line::raw));
                Err(text)
            }
            (Loadable::Loaded(_), Loadable::Loaded(modules)) => Ok(modules),
            _ => Err(Text::styled("Loading...", styles::skeleton())),
        }
    }

    fn header(&self, store: &Store) -> Line<'static> {
        let name = store
            .course()
            .loaded()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let search = if self.searching || !self.search.value().is_empty() {
            self.search.line("  Search", self.searching, styles::disabled())
        } else {
            Line::from("  / to search".gray())
        };

        let mut line = Line::from(name.bold());
        line.spans.extend(search.spans);
        line
    }

    fn activate(&mut self, modules: &[Module]) -> Action {
        let Some(node) = self.navigation.selected() else {
            return Action::None;
        };

        match self.state.activate(modules, node) {
            Transition::Selected => {
                self.player_focused = true;
                Action::None
            }
            Transition::NothingToPlay => Action::Flash(error_text("There's nothing to play here.")),
            t => {
                debug!("{:?} on {:?}", t, node);
                Action::None
            }
        }
    }

    /// Open the video or module quiz for the current selection
    fn open_quiz(&mut self, store: &Store, slot: QuizSlot) -> Action {
        let Some(sel) = self.state.selection() else {
            return Action::None;
        };

        let found = player::quiz_for(store, sel, slot);
        if let Some(quiz) = player::can_take(found) {
            let title = match slot {
                QuizSlot::Video => sel.video.label().to_string(),
                QuizSlot::Module => sel.breadcrumb.module.clone(),
            };
            self.modal = Some(QuizModal::new(title, quiz.clone()));
            return Action::None;
        }

        match found {
            None => Action::Flash("Still checking for quizzes...".into()),
            Some((_, Some(Affordance::CreateQuiz))) => {
                Action::Flash("Quizzes can be created from the web dashboard.".into())
            }
            _ => Action::Flash("There's no quiz for this yet.".into()),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, modules: &[Module]) {
        match key.code {
            KeyCode::Esc => {
                self.search.clear();
                self.searching = false;
            }
            KeyCode::Enter => self.searching = false,
            _ => {
                self.search.handle_key(key);
            }
        };
        self.state.set_query(self.search.value());
        self.navigation.select_first(&self.state, modules);
    }
}

impl Pane for Explorer {
    fn draw(&mut self, store: &Store, frame: &mut Frame, area: Rect) {
        let layout = Layout::new(
            Direction::Vertical,
            [Constraint::Length(1), Constraint::Min(3)],
        )
        .split(area);
        frame.render_widget(Paragraph::new(self.header(store)), layout[0]);

        let modules = match Self::loaded(store) {
            Ok(m) => m,
            Err(text) => {
                frame.render_widget(Paragraph::new(text), layout[1]);
                return;
            }
        };
        if !self.expanded {
            self.state.auto_expand(modules);
            self.navigation.select_first(&self.state, modules);
            self.expanded = true;
        }

        let size = layout[1];
        let content_rect = Rect {
            x: size.x + 1,
            y: size.y + 1,
            width: size.width.saturating_sub(2),
            height: size.height.saturating_sub(2),
        };

        // 30/70 split the two panes
        let panes = Layout::new(
            Direction::Horizontal,
            [
                Constraint::Percentage(30),
                Constraint::Length(1),
                Constraint::Percentage(70),
            ],
        )
        .split(content_rect);

        let terms = store.tenant().terminology();
        if modules.is_empty() {
            frame.render_widget(
                Paragraph::new(format!(
                    "This {} has no {} yet.",
                    terms.course.to_lowercase(),
                    terms.modules.to_lowercase()
                )),
                panes[0],
            );
        } else {
            self.navigation
                .draw(&self.state, modules, frame, panes[0], terms.modules);
        }
        player::draw(self.state.selection(), modules, store, frame, panes[2]);

        // Draw a focus rectangle around one of them.
        let focus_rect = if !self.player_focused {
            Rect {
                x: size.x,
                y: size.y,
                width: panes[2].x - size.x,
                height: size.height,
            }
        } else {
            Rect {
                x: panes[1].x,
                y: size.y,
                width: size.width - (panes[1].x - size.x),
                height: size.height,
            }
        };
        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::focused()),
            focus_rect,
        );

        if let Some(modal) = &self.modal {
            modal.draw(frame, area);
        }
    }

    fn handle_event(&mut self, store: &mut Store, event: Event) -> Action {
        let Event::Key(key) = event else {
            return Action::None;
        };

        if let Some(modal) = &mut self.modal {
            if modal.handle_key(key) == ModalOutcome::Close {
                self.modal = None;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Char('q') if !self.searching => return Action::OpenCourses,
            KeyCode::Esc if !self.searching => return Action::OpenCourses,
            KeyCode::Char('R') if !self.searching => {
                self.reload(store);
                return Action::None;
            }
            _ => (),
        };

        let modules = match Self::loaded(store) {
            Ok(m) => m,
            Err(_) => return Action::None,
        };

        if self.searching {
            self.handle_search_key(key, modules);
            return Action::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.player_focused = !self.player_focused,
            KeyCode::Char('/') => {
                self.searching = true;
                self.player_focused = false;
            }

            // tree
            KeyCode::Down | KeyCode::Char('j') if !self.player_focused => {
                self.navigation.key_down()
            }
            KeyCode::Up | KeyCode::Char('k') if !self.player_focused => self.navigation.key_up(),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right | KeyCode::Char('l')
                if !self.player_focused =>
            {
                return self.activate(modules)
            }
            KeyCode::Left | KeyCode::Char('h') if self.player_focused => {
                self.player_focused = false
            }

            // player
            KeyCode::Char('o') => {
                if let Some(sel) = self.state.selection() {
                    if let Err(e) = open::that(&sel.video.url) {
                        return Action::Flash(error_text(format!("Error opening video: {e}")));
                    }
                }
            }
            KeyCode::Char('n') => {
                self.state.step(1);
            }
            KeyCode::Char('p') => {
                self.state.step(-1);
            }
            KeyCode::Char('t') => return self.open_quiz(store, QuizSlot::Video),
            KeyCode::Char('m') => return self.open_quiz(store, QuizSlot::Module),
            _ => (),
        };

        Action::None
    }
}
