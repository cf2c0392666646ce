//! Storage-browser tree synthesized from song paths.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Directories
//! and files share one node type; a node is a file when it carries a song.
//! The tree is rebuilt from scratch whenever the working song list changes.

use std::collections::BTreeSet;

use crate::song::Song;

const PATH_SEPARATOR: char = '/';
const ROOT_NAME: &str = "/";

/// Index of a node inside its [`FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// One directory or file in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    /// Path segment, or `/` for the root.
    pub name: String,
    /// Children in discovery order.
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Depth from the root (root = 0).
    pub level: usize,
    /// User collapse state.
    pub is_closed: bool,
    /// Derived: some ancestor is closed. The root's flag seeds flattening.
    pub hidden: bool,
    pub song: Option<Song>,
}

impl FileNode {
    fn new(name: &str, parent: Option<NodeId>, level: usize) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
            parent,
            level,
            is_closed: false,
            hidden: false,
            song: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.song.is_some()
    }
}

/// Arena-backed directory hierarchy built from song paths.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTree {
    nodes: Vec<FileNode>,
}

impl Default for FileTree {
    fn default() -> Self {
        Self {
            nodes: vec![FileNode::new(ROOT_NAME, None, 0)],
        }
    }
}

impl FileTree {
    /// Builds a tree holding every song under its path.
    ///
    /// Empty segments (leading, trailing or doubled separators) are skipped.
    /// Directory nodes are shared between songs with a common prefix.
    pub fn build<'a, I>(songs: I) -> Self
    where
        I: IntoIterator<Item = &'a Song>,
    {
        let mut tree = Self::default();
        for song in songs {
            tree.add_song(song);
        }
        tree
    }

    fn add_song(&mut self, song: &Song) {
        let mut current = NodeId::ROOT;
        let mut last_segment = None;
        for segment in song
            .path
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
        {
            current = self.child_named(current, segment);
            last_segment = Some(segment);
        }

        if last_segment.is_some_and(|segment| segment == song.file) {
            self.nodes[current.0].song = Some(song.clone());
        }
    }

    /// Existing child with `name`, or a freshly appended one.
    fn child_named(&mut self, parent: NodeId, name: &str) -> NodeId {
        let existing = self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name);
        if let Some(child) = existing {
            return child;
        }

        let child = NodeId(self.nodes.len());
        let level = self.nodes[parent.0].level + 1;
        self.nodes.push(FileNode::new(name, Some(parent), level));
        self.nodes[parent.0].children.push(child);
        child
    }

    pub fn root(&self) -> &FileNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut FileNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Finds a child of `parent` by segment name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Resolves an absolute path to its node, if present.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        path.split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .try_fold(NodeId::ROOT, |current, segment| {
                self.find_child(current, segment)
            })
    }

    /// Flips a node's collapse state. Returns the new state.
    pub fn toggle_closed(&mut self, id: NodeId) -> Option<bool> {
        let node = self.node_mut(id)?;
        node.is_closed = !node.is_closed;
        Some(node.is_closed)
    }

    pub fn set_closed(&mut self, id: NodeId, is_closed: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.is_closed = is_closed;
                true
            }
            None => false,
        }
    }

    /// Suppresses (or restores) the root row and everything below it.
    pub fn set_root_hidden(&mut self, hidden: bool) {
        self.nodes[NodeId::ROOT.0].hidden = hidden;
    }

    /// Absolute path of a node; the root is `/`.
    pub fn node_path(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.parent.is_some() {
                segments.push(node.name.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        Some(format!("{}{}", PATH_SEPARATOR, segments.join("/")))
    }

    /// Songs at or below a node, in pre-order.
    pub fn songs_under(&self, id: NodeId) -> Vec<&Song> {
        let mut songs = Vec::new();
        let mut pending = vec![id];
        while let Some(node_id) = pending.pop() {
            let Some(node) = self.node(node_id) else {
                continue;
            };
            if let Some(song) = &node.song {
                songs.push(song);
            }
            pending.extend(node.children.iter().rev().copied());
        }
        songs
    }

    /// Paths of every closed node, for carrying collapse state across a rebuild.
    pub fn closed_paths(&self) -> BTreeSet<String> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.nodes[id.0].is_closed)
            .filter_map(|id| self.node_path(id))
            .collect()
    }

    /// Closes every node whose path is in `paths`. Returns how many matched.
    pub fn apply_closed_paths(&mut self, paths: &BTreeSet<String>) -> usize {
        let mut applied = 0;
        for path in paths {
            if let Some(id) = self.find_path(path) {
                self.nodes[id.0].is_closed = true;
                applied += 1;
            }
        }
        applied
    }
}
