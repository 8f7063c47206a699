//! Quiz affordances, and the modal for taking one
use crossterm::event::{KeyCode, KeyEvent};
use lms_client::{quiz::VideoQuiz, Role};
use ratatui::{
    prelude::Rect,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{styles, widgets::centered_rect};

/// What the player offers for a quiz slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    TakeQuiz,
    CreateQuiz,
}

impl Affordance {
    pub fn label(self) -> &'static str {
        match self {
            Affordance::TakeQuiz => "Take Quiz",
            Affordance::CreateQuiz => "Create Quiz",
        }
    }
}

/// Anyone can take an existing quiz, but only authors are offered to create a missing one.
pub fn quiz_affordance(role: Role, has_quiz: bool) -> Option<Affordance> {
    match (has_quiz, role.can_author_quizzes()) {
        (true, _) => Some(Affordance::TakeQuiz),
        (false, true) => Some(Affordance::CreateQuiz),
        (false, false) => None,
    }
}

/// Result of a key press in the modal
#[derive(Debug, PartialEq, Eq)]
pub enum ModalOutcome {
    Open,
    Close,
}

/// Taking a quiz, one question at a time
#[derive(Debug)]
pub struct QuizModal {
    title: String,
    quiz: VideoQuiz,
    current: usize,
    /// Chosen option key, per question
    answers: Vec<Option<String>>,
    submitted: bool,
}

impl QuizModal {
    pub fn new(title: impl Into<String>, quiz: VideoQuiz) -> Self {
        Self {
            title: title.into(),
            answers: vec![None; quiz.questions.len()],
            quiz,
            current: 0,
            submitted: false,
        }
    }

    fn choose(&mut self, key: &str) {
        if self.submitted {
            return;
        }
        let Some(q) = self.quiz.questions.get(self.current) else {
            return;
        };
        if q.options.contains_key(key) {
            self.answers[self.current] = Some(key.to_string());
        }
    }

    pub fn score(&self) -> Option<usize> {
        self.submitted.then(|| self.quiz.score(&self.answers))
    }

    /// The option of the current question keyed by this letter, ignoring case
    fn option_for(&self, c: char) -> Option<String> {
        let q = self.quiz.questions.get(self.current)?;
        q.options
            .keys()
            .find(|k| {
                let mut chars = k.chars();
                chars.next().is_some_and(|k| k.eq_ignore_ascii_case(&c)) && chars.next().is_none()
            })
            .cloned()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        // option letters take priority over the movement keys
        if let KeyCode::Char(c) = key.code {
            if let Some(option) = self.option_for(c).filter(|_| !self.submitted) {
                self.choose(&option);
                return ModalOutcome::Open;
            }
        }

        let last = self.quiz.questions.len().saturating_sub(1);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ModalOutcome::Close,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => {
                self.current = (self.current + 1).min(last)
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                self.current = self.current.saturating_sub(1)
            }
            KeyCode::Enter if !self.submitted => self.submitted = true,
            KeyCode::Enter => return ModalOutcome::Close,
            KeyCode::Char(c @ '1'..='9') => {
                // pick options by position too
                let idx = c as usize - '1' as usize;
                let key = self
                    .quiz
                    .questions
                    .get(self.current)
                    .and_then(|q| q.options.keys().nth(idx).cloned());
                if let Some(key) = key {
                    self.choose(&key);
                }
            }
            _ => (),
        };

        ModalOutcome::Open
    }

    fn body(&self) -> Text<'static> {
        let Some(q) = self.quiz.questions.get(self.current) else {
            return Text::raw("This quiz has no questions.");
        };
        let chosen = self.answers[self.current].as_deref();

        let mut lines = vec![
            Line::from(
                format!(
                    "Question {} of {}",
                    self.current + 1,
                    self.quiz.questions.len()
                )
                .gray(),
            ),
            Line::raw(""),
            Line::from(q.question.clone().bold()),
            Line::raw(""),
        ];

        for (key, text) in &q.options {
            let picked = chosen == Some(key.as_str());
            let style = match (self.submitted, picked, *key == q.correct_option) {
                (true, _, true) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                (true, true, false) => Style::default().fg(Color::Red),
                (false, true, _) => styles::active(),
                _ => Style::default(),
            };
            let marker = if picked { "(•)" } else { "( )" };
            lines.push(Line::from(Span::styled(format!("{marker} {key}. {text}"), style)));
        }

        lines.push(Line::raw(""));
        if let Some(score) = self.score() {
            lines.push(Line::from(format!("Correct answer: {}", q.correct_option).bold()));
            if !q.explanation.is_empty() {
                lines.push(Line::raw(q.explanation.clone()));
            }
            lines.push(Line::raw(""));
            lines.push(Line::from(
                format!("Score: {score} / {}", self.quiz.questions.len()).bold(),
            ));
            lines.push(Line::from("←/→ review answers · Enter/Esc close".gray()));
        } else {
            let answered = self.answers.iter().filter(|a| a.is_some()).count();
            lines.push(Line::from(
                format!("{answered} answered · A-Z or 1-9 choose · ←/→ move · Enter submit · Esc close")
                    .gray(),
            ));
        }

        lines.into()
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let area = centered_rect(70, 70, area);
        let title = self.quiz.title.clone().unwrap_or_else(|| self.title.clone());

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(self.body()).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(styles::focused())
                    .title(format!(" {title} ")),
            ),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use lms_client::quiz::QuizQuestion;
    use pretty_assertions::assert_eq;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn quiz() -> VideoQuiz {
        let question = |q: &str, correct: &str| QuizQuestion {
            question: q.to_string(),
            options: [("A", "yes"), ("B", "no")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            correct_option: correct.to_string(),
            explanation: String::new(),
        };

        VideoQuiz {
            id: "q1".to_string(),
            title: None,
            questions: vec![question("first?", "A"), question("second?", "B")],
        }
    }

    #[test]
    fn affordance_by_role() {
        assert_eq!(
            quiz_affordance(Role::Instructor, false),
            Some(Affordance::CreateQuiz)
        );
        assert_eq!(quiz_affordance(Role::Admin, false), Some(Affordance::CreateQuiz));
        assert_eq!(quiz_affordance(Role::Learner, false), None);

        for role in [Role::Learner, Role::Instructor, Role::Admin] {
            assert_eq!(quiz_affordance(role, true), Some(Affordance::TakeQuiz));
        }
    }

    #[test]
    fn answering_and_submitting() {
        let mut modal = QuizModal::new("Fractions", quiz());

        modal.handle_key(key('a'));
        modal.handle_key(key('n'));
        modal.handle_key(key('a'));
        // not an option for this question
        modal.handle_key(key('z'));
        assert_eq!(modal.score(), None);

        assert_eq!(
            modal.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            ModalOutcome::Open
        );
        assert_eq!(modal.score(), Some(1));

        // answers are locked once submitted
        modal.handle_key(key('b'));
        assert_eq!(modal.score(), Some(1));
        assert_eq!(
            modal.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            ModalOutcome::Close
        );
    }

    #[test]
    fn choosing_by_position() {
        let mut modal = QuizModal::new("Fractions", quiz());
        modal.handle_key(key('2'));
        modal.handle_key(key('l'));
        modal.handle_key(key('2'));
        modal.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert_eq!(modal.score(), Some(1));
    }

    #[test]
    fn option_letters_beat_movement_keys() {
        let mut quiz = quiz();
        quiz.questions[0].options = [("p", "lower p"), ("Q", "upper q")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        quiz.questions[0].correct_option = "p".to_string();
        let mut modal = QuizModal::new("Fractions", quiz);

        assert_eq!(modal.handle_key(key('q')), ModalOutcome::Open);
        assert_eq!(modal.answers[0].as_deref(), Some("Q"));
        modal.handle_key(key('P'));
        assert_eq!(modal.answers[0].as_deref(), Some("p"));

        // no option N on this question, so it moves on
        modal.handle_key(key('n'));
        modal.handle_key(key('b'));
        modal.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(modal.score(), Some(2));

        assert_eq!(modal.handle_key(key('q')), ModalOutcome::Close);
    }
}
