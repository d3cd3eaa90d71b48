//! Depth-first traversal of the folder tree.

use crate::db::TreeStore;
use crate::error::{BkmError, Result};
use crate::models::{Bookmark, Folder};
use serde::Serialize;
use std::collections::HashSet;

/// A folder with its bookmarks and its subfolders, each ordered by title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub folder: Folder,
    pub bookmarks: Vec<Bookmark>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Folders in this subtree, this one included
    pub fn folder_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::folder_count).sum::<usize>()
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
            + self
                .children
                .iter()
                .map(TreeNode::bookmark_count)
                .sum::<usize>()
    }
}

/// The whole store: root-level folders plus bookmarks filed at the root
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Forest {
    pub folders: Vec<TreeNode>,
    pub bookmarks: Vec<Bookmark>,
}

impl Forest {
    pub fn folder_count(&self) -> usize {
        self.folders.iter().map(TreeNode::folder_count).sum()
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len() + self.folders.iter().map(TreeNode::bookmark_count).sum::<usize>()
    }
}

/// Cached child count that disagrees with the walked tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub folder_id: usize,
    pub title: String,
    pub cached: usize,
    pub actual: usize,
}

/// Deepest folder nesting the walker follows; root-level folders are level 1
pub const MAX_DEPTH: usize = 512;

pub fn walk(store: &TreeStore, folder: &Folder) -> Result<TreeNode> {
    let mut visited = HashSet::new();
    walk_inner(store, folder.clone(), 1, &mut visited)
}

pub fn walk_id(store: &TreeStore, id: usize) -> Result<Option<TreeNode>> {
    match store.get_folder(id)? {
        Some(folder) => walk(store, &folder).map(Some),
        None => Ok(None),
    }
}

pub fn walk_all(store: &TreeStore) -> Result<Forest> {
    let mut visited = HashSet::new();
    let mut folders = Vec::new();
    for folder in store.list_root_folders()? {
        folders.push(walk_inner(store, folder, 1, &mut visited)?);
    }
    Ok(Forest {
        folders,
        bookmarks: store.list_root_bookmarks()?,
    })
}

fn walk_inner(
    store: &TreeStore,
    folder: Folder,
    depth: usize,
    visited: &mut HashSet<usize>,
) -> Result<TreeNode> {
    if !visited.insert(folder.id) {
        return Err(BkmError::CycleDetected(folder.id));
    }
    if depth > MAX_DEPTH {
        return Err(BkmError::TooDeep {
            folder: folder.id,
            limit: MAX_DEPTH,
        });
    }

    let mut children = Vec::new();
    for child in store.list_child_folders(folder.id)? {
        children.push(walk_inner(store, child, depth + 1, visited)?);
    }
    let bookmarks = store.list_folder_bookmarks(folder.id)?;

    Ok(TreeNode {
        folder,
        bookmarks,
        children,
    })
}

/// Compare every cached child count against the tree actually stored
pub fn check_consistency(store: &TreeStore) -> Result<Vec<CountMismatch>> {
    let forest = walk_all(store)?;
    let mut mismatches = Vec::new();
    let mut stack: Vec<&TreeNode> = forest.folders.iter().collect();
    while let Some(node) = stack.pop() {
        if node.folder.child_folder_count != node.children.len() {
            mismatches.push(CountMismatch {
                folder_id: node.folder.id,
                title: node.folder.title.clone(),
                cached: node.folder.child_folder_count,
                actual: node.children.len(),
            });
        }
        stack.extend(node.children.iter());
    }
    mismatches.sort_by_key(|m| m.folder_id);
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> TreeStore {
        let store = TreeStore::init_in_memory().unwrap();
        let it = store.create_folder("IT", None).unwrap();
        let dev = store.create_folder("Development", Some(it)).unwrap();
        let ops = store.create_folder("Ops", Some(it)).unwrap();
        store
            .create_bookmark("GoLang", "https://golang.org/", Some(dev))
            .unwrap();
        store
            .create_bookmark("Rust", "https://www.rust-lang.org/", Some(dev))
            .unwrap();
        store
            .create_bookmark("Grafana", "https://grafana.test", Some(ops))
            .unwrap();
        store.create_folder("Music", None).unwrap();
        store
            .create_bookmark("Loose", "https://loose.test", None)
            .unwrap();
        store
    }

    #[test]
    fn test_walk_pre_order_by_title() {
        let store = sample_store();
        let it = store.list_root_folders().unwrap()[0].clone();
        assert_eq!(it.title, "IT");

        let node = walk(&store, &it).unwrap();
        let child_titles: Vec<&str> = node
            .children
            .iter()
            .map(|c| c.folder.title.as_str())
            .collect();
        assert_eq!(child_titles, vec!["Development", "Ops"]);
        assert_eq!(node.children[0].bookmarks.len(), 2);
        assert_eq!(node.children[0].bookmarks[0].title, "GoLang");
        assert!(node.bookmarks.is_empty());
        assert_eq!(node.folder_count(), 3);
        assert_eq!(node.bookmark_count(), 3);
    }

    #[test]
    fn test_walk_id_missing() {
        let store = sample_store();
        assert!(walk_id(&store, 0).unwrap().is_none());
        assert!(walk_id(&store, 404).unwrap().is_none());
    }

    #[test]
    fn test_walk_all() {
        let store = sample_store();
        let forest = walk_all(&store).unwrap();

        let roots: Vec<&str> = forest
            .folders
            .iter()
            .map(|n| n.folder.title.as_str())
            .collect();
        assert_eq!(roots, vec!["IT", "Music"]);
        assert_eq!(forest.bookmarks.len(), 1);
        assert_eq!(forest.folder_count(), 4);
        assert_eq!(forest.bookmark_count(), 4);
    }

    #[test]
    fn test_check_consistency_clean() {
        let store = sample_store();
        assert!(check_consistency(&store).unwrap().is_empty());
    }

    #[test]
    fn test_walk_empty_store() {
        let store = TreeStore::init_in_memory().unwrap();
        let forest = walk_all(&store).unwrap();
        assert_eq!(forest, Forest::default());
    }

    #[test]
    fn test_walk_refuses_nesting_beyond_max_depth() {
        let store = TreeStore::init_in_memory().unwrap();
        let mut parent = None;
        for level in 1..=MAX_DEPTH {
            let title = format!("level {}", level);
            parent = Some(store.create_folder(&title, parent).unwrap());
        }
        assert_eq!(walk_all(&store).unwrap().folder_count(), MAX_DEPTH);

        let deepest = store.create_folder("too deep", parent).unwrap();
        let err = walk_all(&store).unwrap_err();
        assert!(matches!(
            err,
            BkmError::TooDeep { folder, limit } if folder == deepest && limit == MAX_DEPTH
        ));
    }
}
