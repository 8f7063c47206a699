use std::{fmt, fs, path::Path};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::{
    blocking::multipart::{Form, Part},
    Method,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{de, tenant::Tenant, Client, Result};

/// Default number of courses per page
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Largest cover image we'll upload
pub const MAX_COVER_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl CourseStatus {
    pub const ALL: [CourseStatus; 3] = [
        CourseStatus::Draft,
        CourseStatus::Published,
        CourseStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Published => "published",
            CourseStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    pub title: Option<String>,
    pub subjectname: Option<String>,
    pub coursename: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default, alias = "visibility")]
    pub is_public: bool,
    pub tenant_id: Option<String>,

    /// Curriculum metadata, only meaningful for the default tenant
    pub board: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub medium: Vec<String>,

    #[serde(alias = "coverImage")]
    pub cover_img: Option<String>,
    /// Aggregate progress, as a percentage
    pub progress: Option<f64>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Display name, resolved for the tenant when fetched
    #[serde(skip)]
    pub name: String,
}

impl Course {
    pub(crate) fn resolve(mut self, tenant: &Tenant) -> Self {
        let generic = self.title.as_deref().or(self.coursename.as_deref());
        self.name = tenant.pick_name(self.subjectname.as_deref(), generic);
        self
    }

    /// Board / grade / medium labels, in display order
    pub fn curriculum_chips(&self) -> Vec<String> {
        let mut chips = vec![];
        if let Some(b) = self.board.as_ref().filter(|b| !b.is_empty()) {
            chips.push(b.clone());
        }
        if let Some(g) = &self.grade {
            chips.push(format!("Grade {g}"));
        }
        chips.extend(self.medium.iter().cloned());
        chips
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub total_count: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u32,
}

impl Pagination {
    /// Used when the server doesn't paginate: everything fits on one page.
    fn single(count: usize, limit: u32) -> Self {
        Self {
            total_count: count as u64,
            total_pages: 1,
            current_page: 1,
            has_next_page: false,
            has_prev_page: false,
            limit,
        }
    }
}

/// One page of the course listing
#[derive(Clone, Debug)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub pagination: Pagination,
}

/// A cover image staged for upload
#[derive(Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image is too large ({:.1} MB). The maximum size is 5 MB.", megabytes(.0))]
    TooLarge(u64),

    #[error("Please choose an image file (got {}).", .0)]
    NotAnImage(String),

    #[error("Couldn't read image: {}", .0)]
    IOError(#[from] std::io::Error),
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

impl CoverImage {
    /// Load an image from disk, rejecting anything too large or not an image.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let size = fs::metadata(path)?.len();
        if size > MAX_COVER_BYTES {
            return Err(ImageError::TooLarge(size));
        }

        let mime = mime_guess::from_path(path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !mime.starts_with("image/") {
            return Err(ImageError::NotAnImage(mime));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cover".to_string());

        Ok(Self {
            file_name,
            mime,
            bytes: fs::read(path)?,
        })
    }

    /// A `data:` URL for previewing the image
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

impl fmt::Debug for CoverImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverImage")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A sparse course update. Fields that are `None` or empty are left untouched on the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub status: Option<CourseStatus>,
    pub grade: Option<u8>,
    pub board: Option<String>,
    pub medium: Vec<String>,
    pub cover: Option<CoverImage>,
}

impl CourseUpdate {
    /// The text fields that will be sent, in order. `medium` appears once per value.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let present = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut fields = vec![];
        if let Some(t) = present(&self.title) {
            fields.push(("title", t));
        }
        if let Some(s) = self.status {
            fields.push(("status", s.to_string()));
        }
        if let Some(g) = self.grade {
            fields.push(("grade", g.to_string()));
        }
        if let Some(b) = present(&self.board) {
            fields.push(("board", b));
        }
        for m in self.medium.iter().filter(|m| !m.trim().is_empty()) {
            fields.push(("medium[]", m.clone()));
        }
        fields
    }

    fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (k, v) in self.text_fields() {
            form = form.text(k, v);
        }
        if let Some(cover) = self.cover {
            form = form.part(
                "coverImg",
                Part::bytes(cover.bytes)
                    .file_name(cover.file_name)
                    .mime_str(&cover.mime)?,
            );
        }
        Ok(form)
    }
}

#[derive(Deserialize)]
struct PageResp {
    #[serde(default)]
    courses: Vec<Course>,
}

/// `/courses` returns either a bare list or `{ courses: [...] }` under `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum CourseList {
    List(Vec<Course>),
    Wrapped(PageResp),
}

impl Client {
    /// Get one page of courses. Pages are 1-indexed.
    pub fn courses(&self, page: u32, limit: u32) -> Result<CoursePage> {
        let (page, limit) = (page.max(1).to_string(), limit.max(1));
        let env = self.get_envelope::<CourseList>(
            &["courses"],
            &[("page", &page), ("limit", &limit.to_string())],
        )?;
        let pagination = env.pagination;
        let courses = match env.into_data()? {
            CourseList::List(cs) => cs,
            CourseList::Wrapped(r) => r.courses,
        };

        let tenant = self.tenant();
        let courses: Vec<_> = courses.into_iter().map(|c| c.resolve(&tenant)).collect();
        let pagination = pagination.unwrap_or_else(|| Pagination::single(courses.len(), limit));
        debug!("got {} courses, {:?}", courses.len(), pagination);

        Ok(CoursePage {
            courses,
            pagination,
        })
    }

    pub fn course(&self, course_id: &str) -> Result<Course> {
        Ok(self
            .get::<Course>(&["courses", course_id], &[])?
            .resolve(&self.tenant()))
    }

    /// Send a sparse multipart update
    pub fn update_course(&self, course_id: &str, update: CourseUpdate) -> Result<()> {
        info!("updating course {course_id}: {:?}", update.text_fields());
        let segments = ["courses", course_id];
        let req = self
            .request(Method::PUT, &segments)
            .multipart(update.into_form()?);
        self.execute(&segments, req)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_sends_present_fields() {
        let update = CourseUpdate {
            title: Some("Algebra".into()),
            board: Some("  ".into()),
            grade: Some(7),
            medium: vec!["English".into(), "".into(), "Hindi".into()],
            ..Default::default()
        };

        assert_eq!(
            update.text_fields(),
            vec![
                ("title", "Algebra".to_string()),
                ("grade", "7".to_string()),
                ("medium[]", "English".to_string()),
                ("medium[]", "Hindi".to_string()),
            ]
        );
        assert!(CourseUpdate::default().text_fields().is_empty());
    }

    #[test]
    fn course_names_resolve_per_tenant() {
        let json = r#"{"_id": "c1", "title": "Maths 101", "subjectname": "Mathematics", "grade": 7, "medium": "English"}"#;
        let course: Course = serde_json::from_str(json).unwrap();

        assert_eq!(course.clone().resolve(&Tenant::default()).name, "Mathematics");
        assert_eq!(course.clone().resolve(&Tenant::new("acme")).name, "Maths 101");
        assert_eq!(course.grade.as_deref(), Some("7"));
        assert_eq!(course.medium, vec!["English"]);
        assert_eq!(course.status, CourseStatus::Draft);
    }

    #[test]
    fn data_url_preview() {
        let img = CoverImage {
            file_name: "a.png".into(),
            mime: "image/png".into(),
            bytes: b"hi".to_vec(),
        };
        assert_eq!(img.data_url(), "data:image/png;base64,aGk=");
    }
}
