//! Generates an ASCII representation of an expanded navigation tree.

use super::catalog::TreeNode;
use crate::utils::file_detection::icon_for;

/// A utility struct for rendering a [`TreeNode`] as text.
///
/// Children appear in the order the catalog listed them (folders first,
/// then files, each by name). Collapsed folders render without children.
pub struct TreeGenerator;

impl TreeGenerator {
    pub fn render(root: &TreeNode) -> String {
        let mut result = format!("{}/\n", root.name);
        Self::render_children(&root.children, &mut result, "");
        result
    }

    fn render_children(children: &[TreeNode], result: &mut String, prefix: &str) {
        for (i, node) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };
            let icon = icon_for(node.is_directory, &node.name);

            result.push_str(&format!("{prefix}{connector}{icon} {}\n", node.name));

            if !node.children.is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(&node.children, result, &new_prefix);
            }
        }
    }
}
