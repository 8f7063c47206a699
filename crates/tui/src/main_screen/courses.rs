//! The paginated course grid
use crossterm::event::KeyCode;
use lms_client::course::{Course, Pagination};
use ratatui::{
    prelude::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{Action, Pane};
use crate::{
    event::Event,
    store::{Loadable, Store},
    styles::{self, error_text},
};

const COLUMNS: usize = 3;

/// State for the course list: which page we're on and which card is selected.
pub struct CourseList {
    page: u32,
    limit: u32,
    selected: usize,
}

/// What the pager controls should look like
#[derive(Debug, PartialEq, Eq)]
pub struct PagerView {
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Page numbers, with whether each is the current page
    pub pages: Vec<(u32, bool)>,
}

impl From<&Pagination> for PagerView {
    fn from(p: &Pagination) -> Self {
        Self {
            prev_enabled: p.has_prev_page,
            next_enabled: p.has_next_page,
            pages: (1..=p.total_pages.max(1))
                .map(|n| (n, n == p.current_page))
                .collect(),
        }
    }
}

impl PagerView {
    fn line(&self) -> Line<'static> {
        let enabled = |on: bool| if on { Style::default() } else { styles::disabled() };

        let mut spans = vec![Span::styled("[ Prev ]", enabled(self.prev_enabled)), " ".into()];
        for (n, active) in &self.pages {
            spans.push(if *active {
                Span::styled(format!("[{n}]"), styles::active())
            } else {
                Span::raw(format!(" {n} "))
            });
        }
        spans.push(" ".into());
        spans.push(Span::styled("[ Next ]", enabled(self.next_enabled)));
        spans.into()
    }
}

impl CourseList {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            selected: 0,
        }
    }

    /// Fetch the current page fresh
    pub fn mount(&mut self, store: &mut Store) {
        store.request_course_page(self.page, self.limit);
    }

    fn go_to_page(&mut self, store: &mut Store, page: u32) {
        self.page = page;
        self.selected = 0;
        self.mount(store);
    }

    fn selected_course<'a>(&self, store: &'a Store) -> Option<&'a Course> {
        store
            .course_page()
            .loaded()
            .and_then(|p| p.courses.get(self.selected))
    }

    fn draw_card(&self, store: &Store, frame: &mut Frame, area: Rect, idx: usize, course: &Course) {
        let mut lines: Vec<Line> = vec![
            Line::from(course.status.to_string().italic()),
            Line::from(match course.price {
                Some(p) if p > 0.0 => format!("₹{p:.2}"),
                _ => "Free".to_string(),
            }),
        ];
        if let Some(progress) = course.progress {
            lines.push(format!("{progress:.0}% complete").green().into());
        }
        if store.tenant().shows_curriculum() {
            let chips = course.curriculum_chips();
            if !chips.is_empty() {
                lines.push(
                    chips
                        .into_iter()
                        .map(|c| format!("[{c}] ").blue())
                        .collect::<Vec<_>>()
                        .into(),
                );
            }
        }
        if let Some(d) = course.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(Line::raw(""));
            lines.push(Line::raw(d.to_string()));
        }

        let border = if idx == self.selected {
            styles::focused()
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: true }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(course.name.clone().bold()),
            ),
            area,
        );
    }

    /// Grid cells for `count` cards
    fn cells(&self, area: Rect, count: usize) -> Vec<Rect> {
        let rows = count.div_ceil(COLUMNS).max(1);
        let row_areas = Layout::new(
            Direction::Vertical,
            vec![Constraint::Ratio(1, rows as u32); rows],
        )
        .split(area);

        row_areas
            .iter()
            .flat_map(|row| {
                Layout::new(
                    Direction::Horizontal,
                    vec![Constraint::Ratio(1, COLUMNS as u32); COLUMNS],
                )
                .split(*row)
                .to_vec()
            })
            .take(count)
            .collect()
    }
}

impl Pane for CourseList {
    fn draw(&mut self, store: &Store, frame: &mut Frame, area: Rect) {
        let layout = Layout::new(
            Direction::Vertical,
            [Constraint::Min(3), Constraint::Length(1)],
        )
        .split(area);

        match store.course_page() {
            Loadable::NotRequested | Loadable::Loading => {
                for cell in self.cells(layout[0], self.limit as usize) {
                    frame.render_widget(
                        Paragraph::new("░░░░░░░░░░\n░░░░░░\n░░░░░░░░")
                            .style(styles::skeleton())
                            .block(Block::default().borders(Borders::ALL).style(styles::skeleton())),
                        cell,
                    );
                }
            }
            Loadable::Failed(msg) => {
                let mut text = error_text(msg.clone());
                text.lines.extend(["", "Press r to retry."].map(Line::raw));
                frame.render_widget(Paragraph::new(text), layout[0]);
            }
            Loadable::Loaded(page) if page.courses.is_empty() => {
                let terms = store.tenant().terminology();
                frame.render_widget(
                    Paragraph::new(format!("No {} found.", terms.courses.to_lowercase())),
                    layout[0],
                );
            }
            Loadable::Loaded(page) => {
                self.selected = self.selected.min(page.courses.len() - 1);
                for (idx, (cell, course)) in self
                    .cells(layout[0], page.courses.len())
                    .into_iter()
                    .zip(&page.courses)
                    .enumerate()
                {
                    self.draw_card(store, frame, cell, idx, course);
                }
                frame.render_widget(
                    Paragraph::new(PagerView::from(&page.pagination).line()),
                    layout[1],
                );
            }
        }
    }

    fn handle_event(&mut self, store: &mut Store, event: Event) -> Action {
        let Event::Key(key) = event else {
            return Action::None;
        };
        let count = store
            .course_page()
            .loaded()
            .map(|p| p.courses.len())
            .unwrap_or(0);
        let pager = store.course_page().loaded().map(|p| PagerView::from(&p.pagination));

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Action::Exit,
            KeyCode::Char('r') => self.mount(store),

            // move around the grid
            KeyCode::Right | KeyCode::Char('l') if self.selected + 1 < count => self.selected += 1,
            KeyCode::Left | KeyCode::Char('h') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') if self.selected + COLUMNS < count => {
                self.selected += COLUMNS
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(COLUMNS)
            }

            // paging
            KeyCode::Char('n') | KeyCode::PageDown
                if pager.as_ref().is_some_and(|p| p.next_enabled) =>
            {
                self.go_to_page(store, self.page + 1)
            }
            KeyCode::Char('p') | KeyCode::PageUp
                if pager.as_ref().is_some_and(|p| p.prev_enabled) =>
            {
                self.go_to_page(store, self.page.saturating_sub(1).max(1))
            }
            KeyCode::Char(n @ '1'..='9') => {
                let n = n.to_digit(10).unwrap_or(1);
                if pager.is_some_and(|p| p.pages.iter().any(|(p, _)| *p == n)) {
                    self.go_to_page(store, n);
                }
            }

            KeyCode::Enter => {
                if let Some(c) = self.selected_course(store) {
                    return Action::OpenExplorer(c.id.clone());
                }
            }
            KeyCode::Char('e') => {
                if !store.role().can_author_quizzes() {
                    return Action::Flash(error_text("Only instructors can edit courses."));
                }
                if let Some(c) = self.selected_course(store) {
                    return Action::OpenEditor(c.id.clone());
                }
            }
            _ => (),
        };

        Action::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn middle_page_enables_both_directions() {
        let pagination = Pagination {
            total_count: 25,
            total_pages: 3,
            current_page: 2,
            has_next_page: true,
            has_prev_page: true,
            limit: 9,
        };

        assert_eq!(
            PagerView::from(&pagination),
            PagerView {
                prev_enabled: true,
                next_enabled: true,
                pages: vec![(1, false), (2, true), (3, false)],
            }
        );
    }

    #[test]
    fn first_page_disables_prev() {
        let pagination = Pagination {
            total_count: 5,
            total_pages: 1,
            current_page: 1,
            has_next_page: false,
            has_prev_page: false,
            limit: 9,
        };
        let view = PagerView::from(&pagination);

        assert!(!view.prev_enabled && !view.next_enabled);
        assert_eq!(view.pages, vec![(1, true)]);
    }
}
