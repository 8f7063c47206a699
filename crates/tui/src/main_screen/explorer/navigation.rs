use lms_client::modules::Module;
use log::warn;
use ratatui::{
    prelude::Rect,
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::Block,
    Frame,
};
use tui_tree_widget::{Tree, TreeItem, TreeState};

use super::state::{ExplorerState, NodeId};
use crate::styles;

/// The module tree on the left of the explorer
#[derive(Debug, Default)]
pub struct Navigation {
    tree_state: TreeState<NodeId>,
    /// What was last drawn, so key presses move over the same rows the user sees
    view_tree: Vec<TreeItem<'static, NodeId>>,
}

impl Navigation {
    /// The row under the cursor
    pub fn selected(&self) -> Option<NodeId> {
        self.tree_state.selected().last().copied()
    }

    pub fn key_down(&mut self) {
        self.tree_state.key_down(&self.view_tree);
    }

    pub fn key_up(&mut self) {
        self.tree_state.key_up(&self.view_tree);
    }

    /// Put the cursor on the first visible module
    pub fn select_first(&mut self, state: &ExplorerState, modules: &[Module]) {
        if let Some((i, _)) = state.visible_modules(modules).next() {
            self.tree_state.select(vec![NodeId::Module(i)]);
        }
    }

    pub fn draw(
        &mut self,
        state: &ExplorerState,
        modules: &[Module],
        frame: &mut Frame,
        area: Rect,
        title: &str,
    ) {
        self.view_tree = build_tree(state, modules);

        // expansion lives in ExplorerState, the widget just mirrors it
        self.tree_state.close_all();
        for (m, module) in state.visible_modules(modules) {
            if !state.is_expanded(modules, NodeId::Module(m)) {
                continue;
            }
            self.tree_state.open(vec![NodeId::Module(m)]);
            for t in 0..module.topics.len() {
                let topic = NodeId::Topic(m, t);
                if state.is_expanded(modules, topic) {
                    self.tree_state.open(topic.path());
                }
            }
        }

        let block = Block::default().title(Line::from(title.to_string().bold()));
        match Tree::new(self.view_tree.clone()) {
            Ok(tree) => frame.render_stateful_widget(
                tree.block(block)
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                    .highlight_symbol(">> "),
                area,
                &mut self.tree_state,
            ),
            Err(e) => warn!("error building module tree: {}", e),
        }
    }
}

/// Label for a row, highlighted if it's on the path to what's playing.
fn label(state: &ExplorerState, modules: &[Module], node: NodeId, name: &str) -> Line<'static> {
    let style = if state.is_active(modules, node) {
        styles::active()
    } else {
        Style::default()
    };
    Line::from(Span::styled(name.to_string(), style))
}

fn branch(
    id: NodeId,
    text: Line<'static>,
    children: Vec<TreeItem<'static, NodeId>>,
) -> TreeItem<'static, NodeId> {
    if children.is_empty() {
        return TreeItem::new_leaf(id, text);
    }
    match TreeItem::new(id, text.clone(), children) {
        Ok(item) => item,
        Err(e) => {
            warn!("duplicate rows under {:?}: {}", id, e);
            TreeItem::new_leaf(id, text)
        }
    }
}

fn build_tree(state: &ExplorerState, modules: &[Module]) -> Vec<TreeItem<'static, NodeId>> {
    state
        .visible_modules(modules)
        .map(|(m, module)| {
            let topics = module
                .topics
                .iter()
                .enumerate()
                .map(|(t, topic)| {
                    let subtopics = topic
                        .subtopics
                        .iter()
                        .enumerate()
                        .map(|(s, sub)| {
                            let id = NodeId::Subtopic(m, t, s);
                            TreeItem::new_leaf(id, label(state, modules, id, &sub.name))
                        })
                        .collect();
                    let id = NodeId::Topic(m, t);
                    branch(id, label(state, modules, id, &topic.name), subtopics)
                })
                .collect();

            let id = NodeId::Module(m);
            let mut text = label(state, modules, id, &module.name);
            if module.completed {
                text.spans.push(" ✓".green());
            }
            branch(id, text, topics)
        })
        .collect()
}
