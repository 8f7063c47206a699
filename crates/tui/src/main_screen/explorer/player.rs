//! The "player": details of the selected video, and what you can do with it.
//!
//! Videos aren't played in the terminal. `o` hands the URL to the system's default handler.
use lms_client::{
    modules::Module,
    quiz::{QuizKey, VideoQuiz},
};
use ratatui::{
    prelude::Rect,
    style::Stylize,
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{
    quiz::{quiz_affordance, Affordance},
    state::Selection,
};
use crate::{store::Store, styles};

/// Which quiz a key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSlot {
    Video,
    Module,
}

impl QuizSlot {
    pub fn key(self, sel: &Selection) -> QuizKey {
        match self {
            QuizSlot::Video => QuizKey::Video(sel.video.id.clone()),
            QuizSlot::Module => QuizKey::Module(sel.module_id.clone()),
        }
    }

    fn hotkey(self) -> char {
        match self {
            QuizSlot::Video => 't',
            QuizSlot::Module => 'm',
        }
    }
}

/// The quiz, if there is one, and what to offer the user.
/// `None` while the sweep is still running.
pub fn quiz_for<'a>(
    store: &'a Store,
    sel: &Selection,
    slot: QuizSlot,
) -> Option<(Option<&'a VideoQuiz>, Option<Affordance>)> {
    if !store.quizzes_loaded() {
        return None;
    }
    let quiz = store.quiz(&slot.key(sel));
    Some((quiz, quiz_affordance(store.role(), quiz.is_some())))
}

fn quiz_line(store: &Store, sel: &Selection, slot: QuizSlot, label: &str) -> Line<'static> {
    let head = Span::raw(format!("{label} quiz: "));
    match quiz_for(store, sel, slot) {
        None => vec![head, "checking...".italic()].into(),
        Some((_, None)) => vec![head, "none".gray()].into(),
        Some((_, Some(a))) => vec![
            head,
            Span::styled(format!("[{}] {}", slot.hotkey(), a.label()), styles::active()),
        ]
        .into(),
    }
}

fn module_details(module: &Module, label: &str) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw(""), Line::from(format!("{label}: {}", module.name).bold())];
    if let Some(d) = module.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::raw(d.to_string()));
    }

    let mut stats = vec![];
    if let Some(n) = module.enrolled_users {
        stats.push(format!("{n} enrolled"));
    }
    if let Some(r) = module.rating {
        stats.push(format!("rated {r:.1}"));
    }
    if module.completed {
        stats.push("completed".to_string());
    }
    if !stats.is_empty() {
        lines.push(Line::from(stats.join(" · ").gray()));
    }

    lines
}

pub fn draw(
    selection: Option<&Selection>,
    modules: &[Module],
    store: &Store,
    frame: &mut Frame,
    area: Rect,
) {
    let Some(sel) = selection else {
        frame.render_widget(
            Paragraph::new("Select something to play from the tree on the left.")
                .style(styles::disabled()),
            area,
        );
        return;
    };
    let terms = store.tenant().terminology();

    let mut lines = vec![
        Line::from(sel.breadcrumb.parts().collect::<Vec<_>>().join(" › ").gray()),
        Line::raw(""),
        Line::from(sel.video.label().to_string().bold()),
        Line::from(sel.video.url.clone().blue().underlined()),
    ];
    if let Some(pos) = sel.position().filter(|_| sel.playlist.len() > 1) {
        lines.push(Line::from(
            format!("Video {} of {}", pos + 1, sel.playlist.len()).italic(),
        ));
    }

    lines.push(Line::raw(""));
    lines.push(quiz_line(store, sel, QuizSlot::Video, "Video"));
    lines.push(quiz_line(store, sel, QuizSlot::Module, terms.module));

    if let Some(module) = modules.iter().find(|m| m.id == sel.module_id) {
        lines.extend(module_details(module, terms.module));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(
        "o open video · n/p next/previous · t video quiz · m module quiz".gray(),
    ));

    frame.render_widget(
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }),
        area,
    );
}

/// The quiz to open, if the user is offered to take one
pub fn can_take(found: Option<(Option<&VideoQuiz>, Option<Affordance>)>) -> Option<&VideoQuiz> {
    match found {
        Some((Some(q), Some(Affordance::TakeQuiz))) => Some(q),
        _ => None,
    }
}
