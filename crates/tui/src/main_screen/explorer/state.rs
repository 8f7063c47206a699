//! Expand/collapse and selection state for the course explorer.
//!
//! All of the click rules live in [`ExplorerState::activate`], so they can be tested without a
//! terminal.
use std::collections::HashSet;

use lms_client::modules::{locate_first_video, resolve_first_video, Module, Subtopic, Topic, VideoItem, VideoSource};

/// A row of the explorer tree, by position in the module list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Module(usize),
    Topic(usize, usize),
    Subtopic(usize, usize, usize),
}

/// The first module, which is where the tree cursor starts
impl Default for NodeId {
    fn default() -> Self {
        NodeId::Module(0)
    }
}

impl NodeId {
    /// The ids from the root down to this node, as the tree widget wants them
    pub fn path(self) -> Vec<NodeId> {
        match self {
            NodeId::Module(_) => vec![self],
            NodeId::Topic(m, _) => vec![NodeId::Module(m), self],
            NodeId::Subtopic(m, t, _) => vec![NodeId::Module(m), NodeId::Topic(m, t), self],
        }
    }
}

/// Display names of where the selected video came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    pub module: String,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
}

impl Breadcrumb {
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.module.as_str())
            .chain(self.topic.as_deref())
            .chain(self.subtopic.as_deref())
    }
}

/// The video being played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub video: VideoItem,
    pub breadcrumb: Breadcrumb,
    pub module_id: String,
    /// Videos under the activated node, which can be stepped through
    pub playlist: Vec<VideoItem>,
}

impl Selection {
    pub fn position(&self) -> Option<usize> {
        self.playlist.iter().position(|v| v.id == self.video.id)
    }
}

/// What an activation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Expanded,
    Collapsed,
    Selected,
    /// The node has nothing under it to play
    NothingToPlay,
    /// The node doesn't exist (any more)
    Invalid,
}

#[derive(Debug, Default)]
pub struct ExplorerState {
    expanded_modules: HashSet<String>,
    expanded_topics: HashSet<String>,
    selection: Option<Selection>,
    query: String,
}

impl ExplorerState {
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Modules shown at the top level, with their index. Search never hides anything deeper.
    pub fn visible_modules<'a>(
        &'a self,
        modules: &'a [Module],
    ) -> impl Iterator<Item = (usize, &'a Module)> + 'a {
        modules
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.matches_search(&self.query))
    }

    pub fn is_expanded(&self, modules: &[Module], node: NodeId) -> bool {
        match node {
            NodeId::Module(m) => modules
                .get(m)
                .is_some_and(|m| self.expanded_modules.contains(&m.id)),
            NodeId::Topic(m, t) => topic(modules, m, t)
                .is_some_and(|t| self.expanded_topics.contains(&t.id)),
            NodeId::Subtopic(..) => false,
        }
    }

    /// Whether a row should be highlighted as playing.
    ///
    /// This compares display names, not ids, so siblings with the same name light up together.
    pub fn is_active(&self, modules: &[Module], node: NodeId) -> bool {
        let Some(crumb) = self.selection.as_ref().map(|s| &s.breadcrumb) else {
            return false;
        };

        match node {
            NodeId::Module(m) => modules.get(m).is_some_and(|m| m.name == crumb.module),
            NodeId::Topic(m, t) => match (modules.get(m), topic(modules, m, t)) {
                (Some(m), Some(t)) => {
                    m.name == crumb.module && crumb.topic.as_deref() == Some(t.name.as_str())
                }
                _ => false,
            },
            NodeId::Subtopic(m, t, s) => {
                match (modules.get(m), topic(modules, m, t), subtopic(modules, m, t, s)) {
                    (Some(m), Some(t), Some(s)) => {
                        m.name == crumb.module
                            && crumb.topic.as_deref() == Some(t.name.as_str())
                            && crumb.subtopic.as_deref() == Some(s.name.as_str())
                    }
                    _ => false,
                }
            }
        }
    }

    /// Handle a click / enter on a row
    pub fn activate(&mut self, modules: &[Module], node: NodeId) -> Transition {
        match node {
            NodeId::Module(m) => match modules.get(m) {
                Some(module) => self.activate_module(module),
                None => Transition::Invalid,
            },
            NodeId::Topic(m, t) => match (modules.get(m), topic(modules, m, t)) {
                (Some(module), Some(topic)) => self.activate_topic(topic, module),
                _ => Transition::Invalid,
            },
            NodeId::Subtopic(m, t, s) => {
                match (modules.get(m), topic(modules, m, t), subtopic(modules, m, t, s)) {
                    (Some(module), Some(topic), Some(subtopic)) => {
                        self.activate_subtopic(subtopic, module, topic)
                    }
                    _ => Transition::Invalid,
                }
            }
        }
    }

    fn activate_module(&mut self, module: &Module) -> Transition {
        if module.is_expandable() {
            return toggle(&mut self.expanded_modules, &module.id);
        }

        self.select_from(
            module,
            module_playlist(module),
            Breadcrumb {
                module: module.name.clone(),
                ..Default::default()
            },
            &module.id,
        )
    }

    fn activate_topic(&mut self, topic: &Topic, module: &Module) -> Transition {
        if topic.is_expandable() {
            return toggle(&mut self.expanded_topics, &topic.id);
        }

        self.select_from(
            topic,
            topic_playlist(topic),
            Breadcrumb {
                module: module.name.clone(),
                topic: Some(topic.name.clone()),
                subtopic: None,
            },
            &module.id,
        )
    }

    /// Subtopics are leaves: they always play, and never expand.
    fn activate_subtopic(&mut self, subtopic: &Subtopic, module: &Module, topic: &Topic) -> Transition {
        self.select_from(
            subtopic,
            subtopic.videos.clone(),
            Breadcrumb {
                module: module.name.clone(),
                topic: Some(topic.name.clone()),
                subtopic: Some(subtopic.name.clone()),
            },
            &module.id,
        )
    }

    fn select_from<N: VideoSource>(
        &mut self,
        node: &N,
        mut playlist: Vec<VideoItem>,
        breadcrumb: Breadcrumb,
        module_id: &str,
    ) -> Transition {
        let Some(video) = resolve_first_video(node) else {
            return Transition::NothingToPlay;
        };
        if !playlist.iter().any(|v| v.id == video.id) {
            playlist.insert(0, video.clone());
        }

        self.selection = Some(Selection {
            video,
            breadcrumb,
            module_id: module_id.to_string(),
            playlist,
        });
        Transition::Selected
    }

    /// Expand the first module and its first topic, and select the module's first video,
    /// so there's something on screen when the course loads.
    pub fn auto_expand(&mut self, modules: &[Module]) {
        let Some(module) = modules.first() else {
            return;
        };

        let first_topic = module.topics.first();
        if module.is_expandable() {
            self.expanded_modules.insert(module.id.clone());
        }
        if let Some(t) = first_topic.filter(|t| t.is_expandable()) {
            self.expanded_topics.insert(t.id.clone());
        }

        let Some(found) = locate_first_video(module) else {
            log::debug!("first module has nothing to play");
            return;
        };
        let topic = found.topic.and_then(|t| module.topics.get(t));
        let subtopic = topic
            .zip(found.subtopic)
            .and_then(|(t, s)| t.subtopics.get(s));

        let mut playlist = module_playlist(module);
        if !playlist.iter().any(|v| v.id == found.video.id) {
            playlist.insert(0, found.video.clone());
        }
        self.selection = Some(Selection {
            video: found.video,
            breadcrumb: Breadcrumb {
                module: module.name.clone(),
                topic: topic.map(|t| t.name.clone()),
                subtopic: subtopic.map(|s| s.name.clone()),
            },
            module_id: module.id.clone(),
            playlist,
        });
    }

    /// Step through the playlist of the current selection
    pub fn step(&mut self, delta: isize) -> bool {
        let Some(sel) = self.selection.as_mut() else {
            return false;
        };
        let Some(pos) = sel.position() else {
            return false;
        };

        let next = pos as isize + delta;
        match usize::try_from(next).ok().and_then(|i| sel.playlist.get(i)) {
            Some(v) => {
                sel.video = v.clone();
                true
            }
            None => false,
        }
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) -> Transition {
    if set.remove(id) {
        Transition::Collapsed
    } else {
        set.insert(id.to_string());
        Transition::Expanded
    }
}

fn topic(modules: &[Module], m: usize, t: usize) -> Option<&Topic> {
    modules.get(m)?.topics.get(t)
}

fn subtopic(modules: &[Module], m: usize, t: usize, s: usize) -> Option<&Subtopic> {
    topic(modules, m, t)?.subtopics.get(s)
}

fn module_playlist(module: &Module) -> Vec<VideoItem> {
    module.all_videos().cloned().collect()
}

fn topic_playlist(topic: &Topic) -> Vec<VideoItem> {
    topic
        .videos
        .iter()
        .chain(topic.subtopics.iter().flat_map(|s| s.videos.iter()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn video(id: &str) -> VideoItem {
        VideoItem {
            id: id.to_string(),
            url: format!("https://videos.example/{id}.mp4"),
            title: Some(id.to_string()),
        }
    }

    fn subtopic(id: &str, videos: &[&str]) -> Subtopic {
        Subtopic {
            id: id.to_string(),
            name: format!("Subtopic {id}"),
            videos: videos.iter().map(|v| video(v)).collect(),
        }
    }

    fn topic(id: &str, subtopics: Vec<Subtopic>, videos: &[&str]) -> Topic {
        Topic {
            id: id.to_string(),
            name: format!("Topic {id}"),
            subtopics,
            videos: videos.iter().map(|v| video(v)).collect(),
        }
    }

    fn module(id: &str, topics: Vec<Topic>, videos: &[&str]) -> Module {
        let mut m: Module = serde_json::from_value(serde_json::json!({ "_id": id })).unwrap();
        m.name = format!("Module {id}");
        m.description = Some(format!("All about {id}"));
        m.topics = topics;
        m.videos = videos.iter().map(|v| video(v)).collect();
        m
    }

    fn tree() -> Vec<Module> {
        vec![
            module(
                "m1",
                vec![
                    topic("t1", vec![subtopic("s1", &["s1v1", "s1v2"])], &["t1v1"]),
                    topic("t2", vec![], &["t2v1"]),
                ],
                &[],
            ),
            module("m2", vec![], &["m2v1", "m2v2"]),
            module("m3", vec![], &[]),
        ]
    }

    #[test]
    fn leaf_module_selects_first_listed_video() {
        let modules = tree();
        let mut state = ExplorerState::default();

        assert_eq!(state.activate(&modules, NodeId::Module(1)), Transition::Selected);
        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "m2v1");
        assert_eq!(sel.breadcrumb.parts().collect::<Vec<_>>(), vec!["Module m2"]);
        assert!(!state.is_expanded(&modules, NodeId::Module(1)));
    }

    #[test]
    fn expandable_module_toggles_without_changing_selection() {
        let modules = tree();
        let mut state = ExplorerState::default();
        state.activate(&modules, NodeId::Module(1));
        let before = state.selection().cloned();

        assert_eq!(state.activate(&modules, NodeId::Module(0)), Transition::Expanded);
        assert!(state.is_expanded(&modules, NodeId::Module(0)));
        assert_eq!(state.selection().cloned(), before);

        assert_eq!(state.activate(&modules, NodeId::Module(0)), Transition::Collapsed);
        assert!(!state.is_expanded(&modules, NodeId::Module(0)));
    }

    #[test]
    fn topic_without_subtopics_plays() {
        let modules = tree();
        let mut state = ExplorerState::default();

        assert_eq!(state.activate(&modules, NodeId::Topic(0, 1)), Transition::Selected);
        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "t2v1");
        assert_eq!(sel.breadcrumb.topic.as_deref(), Some("Topic t2"));
        assert_eq!(sel.breadcrumb.subtopic, None);
    }

    #[test]
    fn topic_with_subtopics_toggles() {
        let modules = tree();
        let mut state = ExplorerState::default();

        assert_eq!(state.activate(&modules, NodeId::Topic(0, 0)), Transition::Expanded);
        assert!(state.is_expanded(&modules, NodeId::Topic(0, 0)));
        assert!(state.selection().is_none());
    }

    #[test]
    fn subtopics_always_play_and_never_expand() {
        let modules = tree();
        let mut state = ExplorerState::default();

        for _ in 0..2 {
            assert_eq!(
                state.activate(&modules, NodeId::Subtopic(0, 0, 0)),
                Transition::Selected
            );
            assert!(!state.is_expanded(&modules, NodeId::Subtopic(0, 0, 0)));
        }

        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "s1v1");
        assert_eq!(
            sel.breadcrumb.parts().collect::<Vec<_>>(),
            vec!["Module m1", "Topic t1", "Subtopic s1"]
        );
    }

    #[test]
    fn empty_module_keeps_selection() {
        let modules = tree();
        let mut state = ExplorerState::default();
        state.activate(&modules, NodeId::Module(1));

        assert_eq!(
            state.activate(&modules, NodeId::Module(2)),
            Transition::NothingToPlay
        );
        assert_eq!(state.selection().unwrap().video.id, "m2v1");
        assert_eq!(state.activate(&modules, NodeId::Module(9)), Transition::Invalid);
    }

    #[test]
    fn auto_expand_opens_first_branch() {
        let modules = tree();
        let mut state = ExplorerState::default();
        state.auto_expand(&modules);

        assert!(state.is_expanded(&modules, NodeId::Module(0)));
        assert!(state.is_expanded(&modules, NodeId::Topic(0, 0)));
        assert!(!state.is_expanded(&modules, NodeId::Topic(0, 1)));

        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "s1v1");
        assert!(state.is_active(&modules, NodeId::Module(0)));
        assert!(state.is_active(&modules, NodeId::Topic(0, 0)));
        assert!(state.is_active(&modules, NodeId::Subtopic(0, 0, 0)));
        assert!(!state.is_active(&modules, NodeId::Topic(0, 1)));
    }

    #[test]
    fn auto_expand_breadcrumb_follows_the_chosen_video() {
        let modules = vec![module(
            "m1",
            vec![topic("t1", vec![subtopic("s1", &["s1v1"])], &[])],
            &["mv1"],
        )];
        let mut state = ExplorerState::default();
        state.auto_expand(&modules);

        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "mv1");
        assert_eq!(sel.breadcrumb.parts().collect::<Vec<_>>(), vec!["Module m1"]);
        assert!(state.is_active(&modules, NodeId::Module(0)));
        assert!(!state.is_active(&modules, NodeId::Topic(0, 0)));
        assert!(!state.is_active(&modules, NodeId::Subtopic(0, 0, 0)));
    }

    #[test]
    fn auto_expand_breadcrumb_skips_empty_first_topic() {
        let modules = vec![module(
            "m1",
            vec![topic("t1", vec![], &[]), topic("t2", vec![], &["t2v1"])],
            &[],
        )];
        let mut state = ExplorerState::default();
        state.auto_expand(&modules);

        let sel = state.selection().unwrap();
        assert_eq!(sel.video.id, "t2v1");
        assert_eq!(
            sel.breadcrumb.parts().collect::<Vec<_>>(),
            vec!["Module m1", "Topic t2"]
        );
        assert!(!state.is_active(&modules, NodeId::Topic(0, 0)));
        assert!(state.is_active(&modules, NodeId::Topic(0, 1)));
    }

    #[test]
    fn auto_expand_on_flat_course() {
        let modules = vec![module("m2", vec![], &["m2v1"])];
        let mut state = ExplorerState::default();
        state.auto_expand(&modules);

        assert!(!state.is_expanded(&modules, NodeId::Module(0)));
        assert_eq!(state.selection().unwrap().video.id, "m2v1");

        let mut empty = ExplorerState::default();
        empty.auto_expand(&[]);
        assert!(empty.selection().is_none());
    }

    #[test]
    fn same_named_siblings_are_both_active() {
        let mut modules = tree();
        modules[1].name = "Same".to_string();
        modules[2].name = "Same".to_string();
        let mut state = ExplorerState::default();
        state.activate(&modules, NodeId::Module(1));

        assert!(state.is_active(&modules, NodeId::Module(1)));
        assert!(state.is_active(&modules, NodeId::Module(2)));
    }

    #[test]
    fn node_paths_start_at_the_module() {
        assert_eq!(NodeId::default(), NodeId::Module(0));
        assert_eq!(
            NodeId::Subtopic(1, 2, 3).path(),
            vec![NodeId::Module(1), NodeId::Topic(1, 2), NodeId::Subtopic(1, 2, 3)]
        );
    }

    #[test]
    fn search_filters_top_level_only() {
        let modules = tree();
        let mut state = ExplorerState::default();

        state.set_query("M2");
        let shown: Vec<_> = state.visible_modules(&modules).map(|(i, _)| i).collect();
        assert_eq!(shown, vec![1]);

        state.set_query("about m1");
        let shown: Vec<_> = state.visible_modules(&modules).map(|(i, _)| i).collect();
        assert_eq!(shown, vec![0]);

        state.set_query("");
        assert_eq!(state.visible_modules(&modules).count(), 3);
    }

    #[test]
    fn stepping_through_playlist() {
        let modules = tree();
        let mut state = ExplorerState::default();
        state.activate(&modules, NodeId::Module(1));

        assert!(!state.step(-1));
        assert!(state.step(1));
        assert_eq!(state.selection().unwrap().video.id, "m2v2");
        assert!(!state.step(1));
    }
}
