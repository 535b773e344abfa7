//! Folder tree reconstruction
//!
//! Bitwarden folders are flat records whose names encode a path
//! (`Work/Email`). This module rebuilds the hierarchy as an arena of nodes
//! and then walks it breadth-first so a destination group can be created for
//! every folder, parents before children.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]; the root is
//! always index 0 and carries no folder id.

pub mod placement;

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;

use tracing::debug;

use crate::models::SourceFolder;
pub use placement::{fold_segments, plan_insert, split_folder_name, Placement, FOLDER_DELIMITER};

/// Mapping from source folder id (`None` = root) to a destination group handle
pub type FolderMap<H> = HashMap<Option<String>, H>;

/// Index of a node inside a [`FolderTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct FolderNode {
    id: Option<String>,
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed folder hierarchy
#[derive(Debug, Clone)]
pub struct FolderTree {
    nodes: Vec<FolderNode>,
}

impl Default for FolderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTree {
    /// The root node
    pub const ROOT: NodeId = NodeId(0);

    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![FolderNode {
                id: None,
                name: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Build a tree from a folder listing.
    ///
    /// Folders are inserted in ascending order of their raw name so a parent
    /// path is always present before anything nested under it, whatever
    /// order the source listed them in. Root records are ignored.
    pub fn from_folders(folders: &[SourceFolder]) -> Self {
        let mut sorted: Vec<&SourceFolder> = folders.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tree = Self::new();
        for folder in sorted {
            let Some(id) = folder.id.as_deref() else {
                continue;
            };

            let segments = split_folder_name(&folder.name);
            if tree.insert(segments, id).is_none() {
                debug!("Folder {} has no usable name segments, not creating it", id);
            }
        }
        tree
    }

    /// Insert a folder with the given path segments.
    ///
    /// Returns the node that now represents the folder, or `None` when
    /// nothing was attached (empty path, or the same folder inserted twice).
    pub fn insert(&mut self, segments: Vec<String>, id: &str) -> Option<NodeId> {
        let mut current = Self::ROOT;
        let mut segments = segments;

        loop {
            let step = {
                let siblings: Vec<(&str, Option<&str>)> = self.nodes[current.0]
                    .children
                    .iter()
                    .map(|child| {
                        let node = &self.nodes[child.0];
                        (node.name.as_deref().unwrap_or_default(), node.id.as_deref())
                    })
                    .collect();
                plan_insert(&segments, &siblings, Some(id))
            };

            match step {
                Placement::Skip => return None,
                Placement::Attach(name) => return Some(self.attach(current, name, id)),
                Placement::Descend { child, rest } => {
                    current = self.nodes[current.0].children[child];
                    segments = rest;
                }
                Placement::Retry(folded) => segments = folded,
            }
        }
    }

    fn attach(&mut self, parent: NodeId, name: String, id: &str) -> NodeId {
        let node = NodeId(self.nodes.len());
        self.nodes.push(FolderNode {
            id: Some(id.to_string()),
            name: Some(name),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(node);
        node
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| n.name.as_deref())
    }

    pub fn folder_id(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| n.id.as_deref())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Names from the root down to `node`, root excluded
    pub fn path(&self, node: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(name) = self.name(current) {
                path.push(name);
            }
            cursor = self.parent(current);
        }
        path.reverse();
        path
    }

    /// Non-root nodes in level order
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let result: Result<(), Infallible> = self.try_walk_breadth_first((), |node, _| {
            order.push(node);
            Ok(())
        });
        match result {
            Ok(()) => order,
            Err(never) => match never {},
        }
    }

    /// Visit every non-root node in level order, threading a value from
    /// parent to child. `visit` receives the node and its parent's value and
    /// returns the value for the node; the root's value is `root`.
    pub fn try_walk_breadth_first<V, E, F>(&self, root: V, mut visit: F) -> Result<(), E>
    where
        V: Clone,
        F: FnMut(NodeId, &V) -> Result<V, E>,
    {
        let mut queue: VecDeque<(NodeId, V)> = self
            .children(Self::ROOT)
            .iter()
            .map(|child| (*child, root.clone()))
            .collect();

        while let Some((node, parent_value)) = queue.pop_front() {
            let value = visit(node, &parent_value)?;
            queue.extend(self.children(node).iter().map(|child| (*child, value.clone())));
        }

        Ok(())
    }
}

/// Create destination groups for a folder listing.
///
/// `create_group(parent, name)` is called once per folder node in
/// breadth-first order, so the parent handle always exists already. The
/// returned map holds every created group under its folder id plus the root
/// handle under `None`. Folders whose names collapse to nothing are absent.
pub fn build_groups<H, E, F>(
    folders: &[SourceFolder],
    root: H,
    mut create_group: F,
) -> Result<FolderMap<H>, E>
where
    H: Clone,
    F: FnMut(&H, &str) -> Result<H, E>,
{
    let tree = FolderTree::from_folders(folders);

    let mut groups: FolderMap<H> = HashMap::with_capacity(tree.len());
    groups.insert(None, root.clone());

    tree.try_walk_breadth_first(root, |node, parent| {
        let name = tree.name(node).unwrap_or_default();
        let handle = create_group(parent, name)?;
        groups.insert(tree.folder_id(node).map(str::to_string), handle.clone());
        Ok(handle)
    })?;

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str) -> SourceFolder {
        SourceFolder::new(id, name)
    }

    fn child_names(tree: &FolderTree, node: NodeId) -> Vec<&str> {
        tree.children(node)
            .iter()
            .filter_map(|c| tree.name(*c))
            .collect()
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = FolderTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.folder_id(FolderTree::ROOT), None);
        assert!(tree.breadth_first().is_empty());
    }

    #[test]
    fn test_nested_folders_share_parent() {
        let tree = FolderTree::from_folders(&[
            folder("e", "Work/Email"),
            folder("w", "Work"),
            folder("p", "Personal"),
        ]);

        assert_eq!(child_names(&tree, FolderTree::ROOT), vec!["Personal", "Work"]);
        let work = tree.children(FolderTree::ROOT)[1];
        assert_eq!(tree.folder_id(work), Some("w"));
        assert_eq!(child_names(&tree, work), vec!["Email"]);
    }

    #[test]
    fn test_missing_parent_keeps_compound_name() {
        let tree = FolderTree::from_folders(&[folder("e", "Work/Email")]);
        assert_eq!(child_names(&tree, FolderTree::ROOT), vec!["Work/Email"]);
    }

    #[test]
    fn test_missing_middle_level_folds_under_existing_parent() {
        let tree = FolderTree::from_folders(&[folder("a", "A"), folder("c", "A/B/C")]);
        let a = tree.children(FolderTree::ROOT)[0];
        assert_eq!(child_names(&tree, a), vec!["B/C"]);
        assert_eq!(tree.path(tree.children(a)[0]), vec!["A", "B/C"]);
    }

    #[test]
    fn test_root_record_and_empty_names_are_ignored() {
        let tree = FolderTree::from_folders(&[
            SourceFolder::root(),
            folder("slash", "///"),
            folder("w", "/Work/"),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(child_names(&tree, FolderTree::ROOT), vec!["Work"]);
    }

    #[test]
    fn test_reinserting_same_folder_is_noop() {
        let mut tree = FolderTree::new();
        assert!(tree.insert(vec!["Work".to_string()], "w").is_some());
        assert!(tree.insert(vec!["Work".to_string()], "w").is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_breadth_first_is_level_order() {
        let tree = FolderTree::from_folders(&[
            folder("a", "A"),
            folder("ab", "A/B"),
            folder("abc", "A/B/C"),
            folder("z", "Z"),
        ]);
        let order: Vec<&str> = tree
            .breadth_first()
            .into_iter()
            .filter_map(|n| tree.folder_id(n))
            .collect();
        assert_eq!(order, vec!["a", "z", "ab", "abc"]);
    }

    #[test]
    fn test_build_groups_maps_ids_to_handles() {
        let folders = [folder("w", "Work"), folder("e", "Work/Email")];
        let groups = build_groups(&folders, "root".to_string(), |parent, name| {
            Ok::<_, Infallible>(format!("{parent}>{name}"))
        })
        .unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&None], "root");
        assert_eq!(groups[&Some("w".to_string())], "root>Work");
        assert_eq!(groups[&Some("e".to_string())], "root>Work>Email");
    }

    #[test]
    fn test_build_groups_stops_on_first_error() {
        let folders = [folder("a", "A"), folder("b", "B")];
        let mut calls = 0;
        let result = build_groups(&folders, 0u32, |_, name| {
            calls += 1;
            if name == "A" {
                Err(format!("cannot create {name}"))
            } else {
                Ok(1)
            }
        });
        assert_eq!(result.unwrap_err(), "cannot create A");
        assert_eq!(calls, 1);
    }
}
