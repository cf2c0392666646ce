//! Dense row index over the visible nodes of a [`FileTree`].
//!
//! Row `n` of a virtualized list maps to `rows[n]`. Rows are assigned in
//! depth-first pre-order, children in discovery order, skipping every node
//! below a closed directory. The index is a pure projection: rebuild it after
//! any tree rebuild or collapse toggle.

use crate::file_tree::{FileNode, FileTree, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeIndex {
    rows: Vec<NodeId>,
}

impl TreeIndex {
    /// Maps visible nodes to rows without touching the tree.
    pub fn flatten(tree: &FileTree) -> Self {
        let mut rows = Vec::new();
        walk(tree, |id, hidden| {
            if !hidden {
                rows.push(id);
            }
        });
        Self { rows }
    }

    /// Like [`TreeIndex::flatten`], and also records each node's derived `hidden` flag.
    ///
    /// The root's own flag is the traversal seed and is left as is.
    pub fn flatten_into(tree: &mut FileTree) -> Self {
        let mut visits = Vec::with_capacity(tree.len());
        walk(tree, |id, hidden| visits.push((id, hidden)));

        let mut rows = Vec::new();
        for (id, hidden) in visits {
            if id != NodeId::ROOT {
                if let Some(node) = tree.node_mut(id) {
                    node.hidden = hidden;
                }
            }
            if !hidden {
                rows.push(id);
            }
        }
        Self { rows }
    }

    /// Number of visible rows.
    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn node_at(&self, row: usize) -> Option<NodeId> {
        self.rows.get(row).copied()
    }

    /// Resolves a row straight to its node.
    pub fn resolve<'a>(&self, tree: &'a FileTree, row: usize) -> Option<&'a FileNode> {
        tree.node(self.node_at(row)?)
    }

    pub fn row_of(&self, id: NodeId) -> Option<usize> {
        self.rows.iter().position(|row| *row == id)
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }
}

/// Pre-order walk reporting each node with whether it is hidden.
fn walk<F>(tree: &FileTree, mut visit: F)
where
    F: FnMut(NodeId, bool),
{
    let mut pending = vec![(NodeId::ROOT, tree.root().hidden)];
    while let Some((id, hidden)) = pending.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        visit(id, hidden);
        let children_hidden = hidden || node.is_closed;
        pending.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (*child, children_hidden)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::TreeIndex;
    use crate::file_tree::{FileTree, NodeId};
    use crate::song::Song;

    fn sample_tree() -> FileTree {
        let songs = vec![
            Song::new("/m/a/1.mp3"),
            Song::new("/m/a/2.mp3"),
            Song::new("/m/b/3.mp3"),
        ];
        FileTree::build(&songs)
    }

    fn row_names(tree: &FileTree, index: &TreeIndex) -> Vec<String> {
        (0..index.node_count())
            .map(|row| {
                index
                    .resolve(tree, row)
                    .expect("row should resolve")
                    .name
                    .clone()
            })
            .collect()
    }

    #[test]
    fn test_open_tree_lists_every_node_in_preorder() {
        let tree = sample_tree();
        let index = TreeIndex::flatten(&tree);
        assert_eq!(index.node_count(), tree.len());
        assert_eq!(
            row_names(&tree, &index),
            vec!["/", "m", "a", "1.mp3", "2.mp3", "b", "3.mp3"]
        );
        assert_eq!(index.node_at(0), Some(NodeId::ROOT));
        assert_eq!(index.node_at(99), None);
    }

    #[test]
    fn test_closed_directory_hides_descendants_but_not_itself() {
        let mut tree = sample_tree();
        let a = tree.find_path("/m/a").expect("a node");
        tree.set_closed(a, true);
        let index = TreeIndex::flatten(&tree);
        assert_eq!(row_names(&tree, &index), vec!["/", "m", "a", "b", "3.mp3"]);
        assert_eq!(index.row_of(a), Some(2));
        assert_eq!(index.node_count(), 5);
    }

    #[test]
    fn test_closed_node_under_closed_ancestor_is_hidden() {
        let mut tree = sample_tree();
        let m = tree.find_path("/m").expect("m node");
        let a = tree.find_path("/m/a").expect("a node");
        tree.set_closed(a, true);
        tree.set_closed(m, true);
        let index = TreeIndex::flatten(&tree);
        assert_eq!(row_names(&tree, &index), vec!["/", "m"]);
        assert_eq!(index.row_of(a), None);
    }

    #[test]
    fn test_hidden_root_suppresses_everything() {
        let mut tree = sample_tree();
        tree.set_root_hidden(true);
        let index = TreeIndex::flatten(&tree);
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 0);
    }

    #[test]
    fn test_flatten_into_records_hidden_flags() {
        let mut tree = sample_tree();
        let a = tree.find_path("/m/a").expect("a node");
        tree.toggle_closed(a);
        let index = TreeIndex::flatten_into(&mut tree);
        assert_eq!(index, TreeIndex::flatten(&tree));

        let song = tree.find_path("/m/a/1.mp3").expect("song node");
        assert!(tree.node(song).is_some_and(|node| node.hidden));
        assert!(tree.node(a).is_some_and(|node| !node.hidden));

        tree.toggle_closed(a);
        TreeIndex::flatten_into(&mut tree);
        assert!(tree.node(song).is_some_and(|node| !node.hidden));
        assert!(!tree.root().hidden);
    }

    #[test]
    fn test_empty_tree_has_root_row_only() {
        let tree = FileTree::default();
        let index = TreeIndex::flatten(&tree);
        assert_eq!(index.rows(), &[NodeId::ROOT]);
    }
}
