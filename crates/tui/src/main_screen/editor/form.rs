//! Editable course fields, their validation, and turning them into an update.
use camino::Utf8Path;
use lms_client::course::{Course, CourseStatus, CourseUpdate, CoverImage, ImageError};
use log::{debug, info};
use thiserror::Error;

use crate::widgets::TextInput;

pub const BOARDS: [&str; 3] = ["CBSE", "ICSE", "State Board"];
pub const MEDIUMS: [&str; 4] = ["English", "Hindi", "Marathi", "Semi-English"];

/// Board that has no medium
const NO_MEDIUM_BOARD: &str = "CBSE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Basic,
    Curriculum,
    Cover,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Basic, Step::Curriculum, Step::Cover];

    pub fn index(self) -> usize {
        match self {
            Step::Basic => 0,
            Step::Curriculum => 1,
            Step::Cover => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Basic => "Basic info",
            Step::Curriculum => "Curriculum",
            Step::Cover => "Cover image",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            Step::Basic => &[Field::Title, Field::Status, Field::Grade],
            Step::Curriculum => &[Field::Board, Field::Medium],
            Step::Cover => &[Field::CoverPath],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Status,
    Board,
    Grade,
    Medium,
    CoverPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("Grade must be a whole number from 1 to 12.")]
    GradeOutOfRange,
}

/// A grade is a whole number from 1 to 12
pub fn parse_grade(s: &str) -> Option<u8> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|g| (1..=12).contains(g))
}

#[derive(Debug)]
pub struct CourseForm {
    step: Step,
    pub title: TextInput,
    pub status: CourseStatus,
    board: Option<String>,
    pub grade: TextInput,
    medium: Vec<String>,
    /// Cursor in [`MEDIUMS`]
    pub medium_cursor: usize,
    pub cover_path: TextInput,
    cover: Option<CoverImage>,
    /// `data:` URL of the staged cover
    preview: Option<String>,
}

impl Default for CourseForm {
    fn default() -> Self {
        Self {
            step: Step::Basic,
            title: TextInput::default(),
            status: CourseStatus::default(),
            board: None,
            grade: TextInput::default(),
            medium: vec![],
            medium_cursor: 0,
            cover_path: TextInput::default(),
            cover: None,
            preview: None,
        }
    }
}

impl CourseForm {
    /// Pre-fill from the course as it is now
    pub fn from_course(course: &Course) -> Self {
        let mut form = Self {
            title: TextInput::new(course.title.clone().unwrap_or_else(|| course.name.clone())),
            status: course.status,
            grade: TextInput::new(course.grade.clone().unwrap_or_default()),
            ..Default::default()
        };
        form.medium = course.medium.clone();
        form.set_board(course.board.as_deref().filter(|b| !b.trim().is_empty()));
        form
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    pub fn medium(&self) -> &[String] {
        &self.medium
    }

    pub fn cover(&self) -> Option<&CoverImage> {
        self.cover.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// The rule for leaving the first step, and for submitting
    pub fn validate(&self) -> Result<u8, ValidationError> {
        if self.title.value().trim().is_empty() {
            return Err(ValidationError::TitleRequired);
        }
        parse_grade(self.grade.value()).ok_or(ValidationError::GradeOutOfRange)
    }

    pub fn next_step(&mut self) -> Result<(), ValidationError> {
        self.step = match self.step {
            Step::Basic => {
                self.validate()?;
                Step::Curriculum
            }
            Step::Curriculum | Step::Cover => Step::Cover,
        };
        Ok(())
    }

    pub fn prev_step(&mut self) {
        self.step = match self.step {
            Step::Basic | Step::Curriculum => Step::Basic,
            Step::Cover => Step::Curriculum,
        };
    }

    pub fn cycle_status(&mut self, delta: isize) {
        let all = CourseStatus::ALL;
        let idx = all.iter().position(|s| *s == self.status).unwrap_or(0);
        self.status = all[cycle(idx, delta, all.len())];
    }

    pub fn set_board(&mut self, board: Option<&str>) {
        self.board = board.map(str::to_string);
        if self.board.as_deref() == Some(NO_MEDIUM_BOARD) {
            self.medium.clear();
        }
    }

    /// Step through no board, then each of [`BOARDS`]
    pub fn cycle_board(&mut self, delta: isize) {
        let idx = self
            .board
            .as_deref()
            .and_then(|b| BOARDS.iter().position(|x| *x == b))
            .map_or(0, |i| i + 1);
        let next = cycle(idx, delta, BOARDS.len() + 1);
        self.set_board(next.checked_sub(1).map(|i| BOARDS[i]));
    }

    /// Whether mediums can be picked for the current board
    pub fn has_medium(&self) -> bool {
        self.board.as_deref() != Some(NO_MEDIUM_BOARD)
    }

    pub fn toggle_medium(&mut self, medium: &str) {
        if !self.has_medium() {
            return;
        }
        if let Some(i) = self.medium.iter().position(|m| m == medium) {
            self.medium.remove(i);
        } else {
            self.medium.push(medium.to_string());
        }
    }

    /// Stage the image at the typed path
    pub fn attach_cover(&mut self) -> Result<&CoverImage, ImageError> {
        let path = Utf8Path::new(self.cover_path.value().trim());
        let cover = CoverImage::load(path.as_std_path())?;
        info!(
            "staged cover {} ({}, {} bytes)",
            cover.file_name,
            cover.mime,
            cover.bytes.len()
        );

        self.preview = Some(cover.data_url());
        Ok(self.cover.insert(cover))
    }

    /// The update to send, if the form is valid
    pub fn to_update(&self) -> Result<CourseUpdate, ValidationError> {
        let grade = self.validate()?;
        let update = CourseUpdate {
            title: Some(self.title.value().trim().to_string()),
            status: Some(self.status),
            grade: Some(grade),
            board: self.board.clone(),
            medium: self.medium.clone(),
            cover: self.cover.clone(),
        };
        debug!("built update {:?}", update);
        Ok(update)
    }
}

fn cycle(idx: usize, delta: isize, len: usize) -> usize {
    (idx as isize + delta).rem_euclid(len as isize) as usize
}
