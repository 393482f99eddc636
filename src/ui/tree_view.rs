use std::collections::HashSet;

use crate::astronomicon::TreeNode;

/// One visible line of a tree
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    pub path: Vec<usize>,
    pub depth: usize,
    pub node: &'a TreeNode,
    pub expanded: bool,
}

/// Expansion and selection state over a rendered tree. Children are only
/// listed once their parent is expanded; the root starts expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeView {
    root: TreeNode,
    expanded: HashSet<Vec<usize>>,
    selected: usize,
}

impl TreeView {
    pub fn new(root: TreeNode) -> Self {
        Self {
            root,
            expanded: HashSet::from([Vec::new()]),
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::new();
        let mut path = Vec::new();
        self.collect(&self.root, &mut path, &mut rows);
        rows
    }

    fn collect<'a>(&self, node: &'a TreeNode, path: &mut Vec<usize>, rows: &mut Vec<Row<'a>>) {
        let expanded = node.allow_expand() && self.expanded.contains(path);
        rows.push(Row {
            path: path.clone(),
            depth: path.len(),
            node,
            expanded,
        });
        if expanded {
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                self.collect(child, path, rows);
                path.pop();
            }
        }
    }

    pub fn select_next(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.selected = (self.selected + 1).min(last);
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Expands or collapses the selected node; leaves are left alone
    pub fn toggle_selected(&mut self) {
        let Some(row) = self.rows().into_iter().nth(self.selected) else {
            return;
        };
        if !row.node.allow_expand() {
            return;
        }
        let path = row.path;
        if !self.expanded.remove(&path) {
            self.expanded.insert(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astronomicon::render;
    use serde_json::json;

    fn labels(view: &TreeView) -> Vec<String> {
        view.rows().iter().map(|r| r.node.label.clone()).collect()
    }

    fn view() -> TreeView {
        TreeView::new(render(
            "Ships",
            &json!([{"symbol": "S-1", "nav": {"status": "DOCKED"}}, {"symbol": "S-2"}]),
        ))
    }

    #[test]
    fn root_starts_expanded() {
        let view = view();
        assert_eq!(labels(&view), vec!["[] Ships", "{} S-1", "{} S-2"]);
        assert_eq!(view.rows()[1].depth, 1);
        assert_eq!(view.rows()[1].path, vec![0]);
    }

    #[test]
    fn expand_and_collapse() {
        let mut view = view();
        view.select_next();
        view.toggle_selected();
        assert_eq!(
            labels(&view),
            vec!["[] Ships", "{} S-1", r#"symbol="S-1""#, "{} nav", "{} S-2"]
        );
        assert!(view.rows()[1].expanded);

        view.toggle_selected();
        assert_eq!(labels(&view), vec!["[] Ships", "{} S-1", "{} S-2"]);
    }

    #[test]
    fn leaves_do_not_toggle() {
        let mut view = view();
        view.select_next();
        view.toggle_selected();
        view.select_next();
        let before = labels(&view);
        view.toggle_selected();
        assert_eq!(labels(&view), before);
    }

    #[test]
    fn selection_is_clamped() {
        let mut view = view();
        view.select_previous();
        assert_eq!(view.selected(), 0);
        for _ in 0..10 {
            view.select_next();
        }
        assert_eq!(view.selected(), 2);
    }
}
