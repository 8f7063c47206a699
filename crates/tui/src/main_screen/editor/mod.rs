//! The three step course editor
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lms_client::course::MAX_COVER_BYTES;
use ratatui::{
    prelude::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{Action, Pane};
use crate::{
    event::Event,
    store::{Loadable, Store},
    styles::{self, error_text, success_text},
};

mod form;
use form::{CourseForm, Field, Step, MEDIUMS};

pub struct Editor {
    course_id: String,
    /// Filled in once the course has loaded
    form: Option<CourseForm>,
    /// Index into the current step's fields
    field: usize,
    /// Validation or image error from the last attempt
    error: Option<String>,
}

impl Editor {
    pub fn new(store: &mut Store, course_id: String) -> Self {
        store.open_course_for_edit(&course_id);
        Self {
            course_id,
            form: None,
            field: 0,
            error: None,
        }
    }

    fn ensure_form(&mut self, store: &Store) {
        if self.form.is_none() {
            self.form = store.course().loaded().map(CourseForm::from_course);
        }
    }

    fn saving(store: &Store) -> bool {
        matches!(store.update_state(), Loadable::Loading | Loadable::Loaded(_))
    }

    fn focused_field(&self) -> Option<Field> {
        let form = self.form.as_ref()?;
        form.step().fields().get(self.field).copied()
    }

    fn move_field(&mut self, delta: isize) {
        let Some(form) = &self.form else {
            return;
        };
        let len = form.step().fields().len() as isize;
        self.field = (self.field as isize + delta).rem_euclid(len) as usize;
    }

    fn change_step(&mut self, forward: bool) {
        let Some(form) = &mut self.form else {
            return;
        };
        let res = if forward {
            form.next_step()
        } else {
            form.prev_step();
            Ok(())
        };

        match res {
            Ok(()) => {
                self.field = 0;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn submit(&mut self, store: &mut Store) {
        let Some(form) = &self.form else {
            return;
        };
        match form.to_update() {
            Ok(update) => {
                self.error = None;
                store.submit_update(&self.course_id, update);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn field_key(&mut self, key: KeyEvent) {
        let (Some(field), Some(form)) = (self.focused_field(), &mut self.form) else {
            return;
        };

        match (field, key.code) {
            (Field::Status, KeyCode::Left) => form.cycle_status(-1),
            (Field::Status, KeyCode::Right) => form.cycle_status(1),
            (Field::Board, KeyCode::Left) => form.cycle_board(-1),
            (Field::Board, KeyCode::Right) => form.cycle_board(1),
            (Field::Medium, KeyCode::Left) => {
                form.medium_cursor = form.medium_cursor.saturating_sub(1)
            }
            (Field::Medium, KeyCode::Right) => {
                form.medium_cursor = (form.medium_cursor + 1).min(MEDIUMS.len() - 1)
            }
            (Field::Medium, KeyCode::Char(' ')) => {
                form.toggle_medium(MEDIUMS[form.medium_cursor])
            }
            (Field::CoverPath, KeyCode::Enter) => {
                self.error = form.attach_cover().err().map(|e| e.to_string());
            }
            (Field::Title, _) => {
                form.title.handle_key(key);
            }
            (Field::Grade, _) => {
                form.grade.handle_key(key);
            }
            (Field::CoverPath, _) => {
                form.cover_path.handle_key(key);
            }
            _ => (),
        };
    }

    fn steps_line(form: &CourseForm) -> Line<'static> {
        let mut spans = vec![];
        for step in Step::ALL {
            if step.index() > 0 {
                spans.push(" › ".gray());
            }
            let label = format!("{}. {}", step.index() + 1, step.name());
            spans.push(if step == form.step() {
                Span::styled(label, styles::active())
            } else {
                Span::styled(label, styles::disabled())
            });
        }
        spans.into()
    }

    fn field_line(&self, form: &CourseForm, field: Field) -> Line<'static> {
        let focused = self.focused_field() == Some(field);
        let label = if focused {
            styles::focused()
        } else {
            Style::default()
        };
        let choice = |s: String| -> Line<'static> {
            vec![
                Span::styled(format!("{}: ", field_name(field)), label),
                if focused {
                    format!("◀ {s} ▶").into()
                } else {
                    s.into()
                },
            ]
            .into()
        };

        match field {
            Field::Title => form.title.line("Title", focused, label),
            Field::Grade => form.grade.line("Grade (1-12)", focused, label),
            Field::CoverPath => form.cover_path.line("Image path", focused, label),
            Field::Status => choice(form.status.to_string()),
            Field::Board => choice(form.board().unwrap_or("None").to_string()),
            Field::Medium if !form.has_medium() => vec![
                Span::styled("Medium: ", label),
                "not applicable for this board".gray(),
            ]
            .into(),
            Field::Medium => {
                let mut spans = vec![Span::styled("Medium: ", label)];
                for (i, m) in MEDIUMS.iter().enumerate() {
                    let on = form.medium().iter().any(|x| x == m);
                    let text = format!("[{}] {m}  ", if on { "x" } else { " " });
                    spans.push(if focused && i == form.medium_cursor {
                        Span::styled(text, styles::active())
                    } else {
                        text.into()
                    });
                }
                spans.into()
            }
        }
    }

    fn body(&self, store: &Store, form: &CourseForm) -> Text<'static> {
        let mut lines = vec![Self::steps_line(form), Line::raw("")];
        for field in form.step().fields() {
            lines.push(self.field_line(form, *field));
        }

        if form.step() == Step::Cover {
            lines.push(Line::raw(""));
            match (form.cover(), form.preview()) {
                (Some(c), Some(preview)) => {
                    lines.push(Line::from(format!(
                        "Attached {} ({}, {} KB)",
                        c.file_name,
                        c.mime,
                        c.bytes.len().div_ceil(1024)
                    )));
                    lines.push(Line::from(
                        format!("Preview: {} characters of data URL", preview.len()).gray(),
                    ));
                }
                _ => lines.push(Line::from(
                    format!(
                        "Images up to {} MB. Press Enter to attach.",
                        MAX_COVER_BYTES / (1024 * 1024)
                    )
                    .gray(),
                )),
            }
        }

        lines.push(Line::raw(""));
        let mut text = Text::from(lines);
        if let Some(e) = &self.error {
            text.lines.extend(error_text(e.clone()).lines);
        }
        match store.update_state() {
            Loadable::Loading => text.lines.push(Line::raw("Saving...")),
            Loadable::Loaded(_) => text.lines.extend(success_text("Saved.").lines),
            Loadable::Failed(msg) => text.lines.extend(error_text(msg.clone()).lines),
            Loadable::NotRequested => (),
        }

        text
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Title => "Title",
        Field::Status => "Status",
        Field::Board => "Board",
        Field::Grade => "Grade",
        Field::Medium => "Medium",
        Field::CoverPath => "Image path",
    }
}

impl Pane for Editor {
    fn draw(&mut self, store: &Store, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(format!(
            " Edit {} ",
            store.tenant().terminology().course.to_lowercase()
        ));

        match store.course() {
            Loadable::Failed(msg) => {
                let mut text = error_text(msg.clone());
                text.lines.extend(["", "Press Esc to go back."].map(Line::raw));
                frame.render_widget(Paragraph::new(text).block(block), area);
                return;
            }
            Loadable::Loaded(_) => self.ensure_form(store),
            _ => (),
        }
        let Some(form) = &self.form else {
            frame.render_widget(
                Paragraph::new("Loading...")
                    .style(styles::skeleton())
                    .block(block),
                area,
            );
            return;
        };

        let layout = Layout::new(
            Direction::Vertical,
            [Constraint::Min(3), Constraint::Length(1)],
        )
        .split(area);

        frame.render_widget(
            Paragraph::new(self.body(store, form))
                .wrap(Wrap { trim: false })
                .block(block),
            layout[0],
        );
        frame.render_widget(
            Paragraph::new(
                "Tab next field · PgDn/PgUp change step · Ctrl-S save · Esc cancel".gray(),
            ),
            layout[1],
        );
    }

    fn handle_event(&mut self, store: &mut Store, event: Event) -> Action {
        let Event::Key(key) = event else {
            return Action::None;
        };
        if key.code == KeyCode::Esc {
            return Action::OpenCourses;
        }

        self.ensure_form(store);
        if self.form.is_none() || Self::saving(store) {
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => self.submit(store),
            KeyCode::Tab | KeyCode::Down => self.move_field(1),
            KeyCode::BackTab | KeyCode::Up => self.move_field(-1),
            KeyCode::PageDown => self.change_step(true),
            KeyCode::PageUp => self.change_step(false),
            KeyCode::Enter if self.focused_field() != Some(Field::CoverPath) => {
                self.change_step(true)
            }
            _ => self.field_key(key),
        };

        Action::None
    }
}
