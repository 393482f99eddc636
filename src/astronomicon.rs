use std::fmt;

use serde_json::Value;

/// Charts arbitrary JSON payloads (ships, contracts, anything else the API returns)
/// into display trees. Rendering is a pure function of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Leaf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Leaves are never expandable, even an empty object or array may be
    pub fn allow_expand(&self) -> bool {
        self.kind != NodeKind::Leaf
    }
}

pub fn render(root_label: &str, value: &Value) -> TreeNode {
    chart(root_label, value)
}

fn chart(name: &str, value: &Value) -> TreeNode {
    match value {
        Value::Object(map) => TreeNode {
            label: format!("{{}} {}", name),
            kind: NodeKind::Object,
            children: map.iter().map(|(key, value)| chart(key, value)).collect(),
        },
        Value::Array(items) => TreeNode {
            label: format!("[] {}", name),
            kind: NodeKind::Array,
            children: items
                .iter()
                .enumerate()
                .map(|(index, item)| chart(&element_name(index, item), item))
                .collect(),
        },
        scalar => TreeNode {
            label: if name.is_empty() {
                scalar.to_string()
            } else {
                format!("{}={}", name, scalar)
            },
            kind: NodeKind::Leaf,
            children: Vec::new(),
        },
    }
}

/// Array elements are named by their `name`, else their `symbol`, else their index
fn element_name(index: usize, item: &Value) -> String {
    ["name", "symbol"]
        .iter()
        .find_map(|key| item.as_object()?.get(*key))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| index.to_string())
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(node: &TreeNode, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "{}{}", "  ".repeat(depth), node.label)?;
            for child in &node.children {
                write_node(child, depth + 1, f)?;
            }
            Ok(())
        }
        write_node(self, 0, f)
    }
}
