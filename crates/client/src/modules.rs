//! The module → topic → subtopic → video hierarchy of a course
use log::debug;
use serde::Deserialize;

use crate::{de, tenant::Tenant, Client, Result};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "videoUrl")]
    pub url: String,
    pub title: Option<String>,
}

impl VideoItem {
    /// The title, or the URL when there isn't one
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.url)
    }
}

/// The leaf level of the hierarchy. Activating one always plays a video.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Subtopic {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
}

impl Topic {
    pub fn is_expandable(&self) -> bool {
        !self.subtopics.is_empty()
    }
}

/// A top-level unit of a course. Called a chapter for the default tenant.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: Option<String>,
    pub chaptername: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    #[serde(default, alias = "isCompleted")]
    pub completed: bool,
    #[serde(default, deserialize_with = "de::count_or_list")]
    pub enrolled_users: Option<u64>,
    pub rating: Option<f32>,

    /// Display name, resolved for the tenant when fetched
    #[serde(skip)]
    pub name: String,
}

impl Module {
    pub(crate) fn resolve(mut self, tenant: &Tenant) -> Self {
        self.name = tenant.pick_name(self.chaptername.as_deref(), self.title.as_deref());
        self
    }

    pub fn is_expandable(&self) -> bool {
        !self.topics.is_empty()
    }

    /// Case-insensitive substring match on name and description. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }

    /// Every video reachable from this module, in tree order
    pub fn all_videos(&self) -> impl Iterator<Item = &VideoItem> {
        self.videos.iter().chain(self.topics.iter().flat_map(|t| {
            t.videos
                .iter()
                .chain(t.subtopics.iter().flat_map(|s| s.videos.iter()))
        }))
    }
}

/// A node of the hierarchy that a default video can be resolved from
pub trait VideoSource {
    /// A video attached directly to this node, outside of any list
    fn direct_video(&self) -> Option<VideoItem> {
        None
    }
    fn subtopics(&self) -> &[Subtopic] {
        &[]
    }
    fn videos(&self) -> &[VideoItem];
    fn topics(&self) -> &[Topic] {
        &[]
    }
}

impl VideoSource for Module {
    fn direct_video(&self) -> Option<VideoItem> {
        let url = self.video_url.as_ref().filter(|u| !u.trim().is_empty())?;
        Some(VideoItem {
            id: self.id.clone(),
            url: url.clone(),
            title: Some(self.name.clone()),
        })
    }
    fn videos(&self) -> &[VideoItem] {
        &self.videos
    }
    fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl VideoSource for Topic {
    fn subtopics(&self) -> &[Subtopic] {
        &self.subtopics
    }
    fn videos(&self) -> &[VideoItem] {
        &self.videos
    }
}

impl VideoSource for Subtopic {
    fn videos(&self) -> &[VideoItem] {
        &self.videos
    }
}

/// Where [`locate_first_video`] found its video, relative to the node searched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedVideo {
    pub video: VideoItem,
    /// Index of the topic it came from, if any
    pub topic: Option<usize>,
    /// Index of the subtopic it came from, within that topic (or the node itself)
    pub subtopic: Option<usize>,
}

/// Find the video to play when a node is activated.
///
/// In order: the node's own video, the first video of its first subtopic, the first of its
/// own videos, then the same search depth-first through its topics.
pub fn resolve_first_video<N: VideoSource + ?Sized>(node: &N) -> Option<VideoItem> {
    locate_first_video(node).map(|l| l.video)
}

/// Like [`resolve_first_video`], but also says which child the video came from.
pub fn locate_first_video<N: VideoSource + ?Sized>(node: &N) -> Option<LocatedVideo> {
    let here = |video: VideoItem, subtopic| LocatedVideo {
        video,
        topic: None,
        subtopic,
    };

    if let Some(v) = node.direct_video() {
        return Some(here(v, None));
    }
    if let Some(v) = node.subtopics().first().and_then(|s| s.videos.first()) {
        return Some(here(v.clone(), Some(0)));
    }
    if let Some(v) = node.videos().first() {
        return Some(here(v.clone(), None));
    }
    node.topics().iter().enumerate().find_map(|(i, t)| {
        locate_first_video(t).map(|l| LocatedVideo {
            topic: Some(i),
            ..l
        })
    })
}

impl Client {
    /// Get the full module tree for a course, with names resolved for the current tenant
    pub fn course_modules(&self, course_id: &str) -> Result<Vec<Module>> {
        let tenant = self.tenant();
        let modules = self
            .get::<Vec<Module>>(&["courses", course_id, "modules"], &[])?
            .into_iter()
            .map(|m| m.resolve(&tenant))
            .collect::<Vec<_>>();
        debug!("course {course_id} has {} modules", modules.len());

        Ok(modules)
    }
}
