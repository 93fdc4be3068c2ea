//! Recursive three-way reconciliation of directory trees.

use std::collections::BTreeSet;

use bstr::{BString, ByteSlice, ByteVec};
use git_hash::ObjectId;
use git_object::{Tree, TreeEntry, TreeEntryKind};
use git_odb::ObjectStore;

use crate::{blob_merge::merge_blob, ConflictTag, MergeError};

const MAX_DEPTH: usize = 1000;

/// Recursively merge three (possibly absent) trees into one, persisting the
/// result via `store`. `path` accumulates the slash-separated path from the
/// root for conflict reporting.
pub fn merge_trees(
    store: &dyn ObjectStore,
    base: Option<ObjectId>,
    left: Option<ObjectId>,
    right: Option<ObjectId>,
) -> Result<ObjectId, MergeError> {
    merge_trees_at_depth(store, base, left, right, &BString::from(""), 0)
}

fn merge_trees_at_depth(
    store: &dyn ObjectStore,
    base: Option<ObjectId>,
    left: Option<ObjectId>,
    right: Option<ObjectId>,
    path: &BString,
    depth: usize,
) -> Result<ObjectId, MergeError> {
    if depth > MAX_DEPTH {
        return Err(MergeError::DepthExceeded { limit: MAX_DEPTH });
    }

    // Dedup: if two of the three inputs are equal, the merge of all three
    // takes the third without touching the store.
    if left == right {
        if let Some(oid) = left {
            return Ok(oid);
        }
    }
    if base == left {
        if let Some(oid) = right {
            return Ok(oid);
        }
    }
    if base == right {
        if let Some(oid) = left {
            return Ok(oid);
        }
    }

    let base_tree = load_optional(store, base)?;
    let left_tree = load_optional(store, left)?;
    let right_tree = load_optional(store, right)?;

    let mut names: BTreeSet<&[u8]> = BTreeSet::new();
    for tree in [&base_tree, &left_tree, &right_tree].into_iter().flatten() {
        for entry in tree.iter() {
            names.insert(entry.name.as_bytes());
        }
    }

    let mut merged = Tree::new();

    for name in names {
        let entry_path = child_path(path, name);
        let b = base_tree.as_ref().and_then(|t| find(t, name));
        let l = left_tree.as_ref().and_then(|t| find(t, name));
        let r = right_tree.as_ref().and_then(|t| find(t, name));

        if let Some(entry) = merge_entry(
            store,
            name,
            b,
            l,
            r,
            &entry_path,
            depth,
        )? {
            merged.entries.push(entry);
        }
    }

    Ok(store.save_tree(&merged)?)
}

fn merge_entry(
    store: &dyn ObjectStore,
    name: &[u8],
    b: Option<&TreeEntry>,
    l: Option<&TreeEntry>,
    r: Option<&TreeEntry>,
    path: &BString,
    depth: usize,
) -> Result<Option<TreeEntry>, MergeError> {
    match (b, l, r) {
        (None, None, None) => unreachable!("name only present if in at least one tree"),

        (None, None, Some(r)) => Ok(Some(r.clone())),
        (None, Some(l), None) => Ok(Some(l.clone())),

        (None, Some(l), Some(r)) => {
            if l == r {
                Ok(Some(l.clone()))
            } else {
                Err(conflict(path, ConflictTag::AddedDifferently))
            }
        }

        (Some(_), None, None) => Ok(None),

        (Some(b), None, Some(r)) => {
            if r == b {
                Ok(None)
            } else {
                Err(conflict(path, ConflictTag::DeleteVsModify))
            }
        }

        (Some(b), Some(l), None) => {
            if l == b {
                Ok(None)
            } else {
                Err(conflict(path, ConflictTag::DeleteVsModify))
            }
        }

        (Some(_), Some(l), Some(r)) if l == r => Ok(Some(l.clone())),

        (Some(b), Some(l), Some(r)) if l == b => Ok(Some(r.clone())),
        (Some(b), Some(l), Some(r)) if r == b => Ok(Some(l.clone())),

        (Some(b), Some(l), Some(r)) => {
            if l.kind != r.kind || l.kind != b.kind {
                return Err(conflict(path, ConflictTag::TypeMismatch));
            }

            match l.kind {
                TreeEntryKind::Tree => {
                    let merged_oid = merge_trees_at_depth(
                        store,
                        Some(b.target),
                        Some(l.target),
                        Some(r.target),
                        path,
                        depth + 1,
                    )?;
                    Ok(Some(TreeEntry {
                        kind: TreeEntryKind::Tree,
                        name: BString::from(name),
                        target: merged_oid,
                    }))
                }
                TreeEntryKind::Blob => {
                    let merged_oid =
                        merge_blob(store, path, b.target, l.target, r.target)?;
                    Ok(Some(TreeEntry {
                        kind: TreeEntryKind::Blob,
                        name: BString::from(name),
                        target: merged_oid,
                    }))
                }
            }
        }
    }
}

fn load_optional(store: &dyn ObjectStore, oid: Option<ObjectId>) -> Result<Option<Tree>, MergeError> {
    match oid {
        Some(oid) => Ok(Some(store.load_tree(oid)?)),
        None => Ok(None),
    }
}

fn find<'a>(tree: &'a Tree, name: &[u8]) -> Option<&'a TreeEntry> {
    tree.iter().find(|e| e.name.as_bytes() == name)
}

fn child_path(parent: &BString, name: &[u8]) -> BString {
    if parent.is_empty() {
        BString::from(name)
    } else {
        let mut p = parent.clone();
        p.push_byte(b'/');
        p.extend_from_slice(name);
        p
    }
}

fn conflict(path: &BString, tag: ConflictTag) -> MergeError {
    MergeError::Conflict {
        path: path.clone(),
        tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_odb::MemoryObjectStore;

    fn blob_entry(store: &MemoryObjectStore, name: &str, data: &[u8]) -> TreeEntry {
        TreeEntry {
            kind: TreeEntryKind::Blob,
            name: BString::from(name),
            target: store.save_blob(data).unwrap(),
        }
    }

    fn tree_of(entries: Vec<TreeEntry>) -> Tree {
        Tree { entries }
    }

    #[test]
    fn merge_identical_trees_is_idempotent() {
        let store = MemoryObjectStore::new();
        let entry = blob_entry(&store, "a.txt", b"content\n");
        let tree_oid = store.save_tree(&tree_of(vec![entry])).unwrap();

        let merged = merge_trees(&store, Some(tree_oid), Some(tree_oid), Some(tree_oid)).unwrap();
        assert_eq!(merged, tree_oid);
    }

    #[test]
    fn unchanged_left_takes_right() {
        let store = MemoryObjectStore::new();
        let base_entry = blob_entry(&store, "a.txt", b"base\n");
        let base_oid = store.save_tree(&tree_of(vec![base_entry])).unwrap();

        let right_entry = blob_entry(&store, "a.txt", b"changed\n");
        let right_oid = store.save_tree(&tree_of(vec![right_entry])).unwrap();

        let merged = merge_trees(&store, Some(base_oid), Some(base_oid), Some(right_oid)).unwrap();
        assert_eq!(merged, right_oid);
    }

    #[test]
    fn unchanged_right_takes_left() {
        let store = MemoryObjectStore::new();
        let base_entry = blob_entry(&store, "a.txt", b"base\n");
        let base_oid = store.save_tree(&tree_of(vec![base_entry])).unwrap();

        let left_entry = blob_entry(&store, "a.txt", b"changed\n");
        let left_oid = store.save_tree(&tree_of(vec![left_entry])).unwrap();

        let merged = merge_trees(&store, Some(base_oid), Some(left_oid), Some(base_oid)).unwrap();
        assert_eq!(merged, left_oid);
    }

    #[test]
    fn delete_vs_unchanged_drops_entry() {
        let store = MemoryObjectStore::new();
        let base_entry = blob_entry(&store, "a.txt", b"base\n");
        let base_oid = store.save_tree(&tree_of(vec![base_entry])).unwrap();
        let empty_oid = store.save_tree(&Tree::new()).unwrap();

        let merged = merge_trees(&store, Some(base_oid), Some(empty_oid), Some(base_oid)).unwrap();
        let merged_tree = store.load_tree(merged).unwrap();
        assert!(merged_tree.is_empty());
    }

    #[test]
    fn delete_vs_modify_conflicts() {
        let store = MemoryObjectStore::new();
        let base_entry = blob_entry(&store, "a.txt", b"base\n");
        let base_oid = store.save_tree(&tree_of(vec![base_entry])).unwrap();
        let empty_oid = store.save_tree(&Tree::new()).unwrap();

        let right_entry = blob_entry(&store, "a.txt", b"right change\n");
        let right_oid = store.save_tree(&tree_of(vec![right_entry])).unwrap();

        let err = merge_trees(&store, Some(base_oid), Some(empty_oid), Some(right_oid)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::Conflict {
                tag: ConflictTag::DeleteVsModify,
                ..
            }
        ));
    }

    #[test]
    fn added_differently_conflicts() {
        let store = MemoryObjectStore::new();
        let empty_oid = store.save_tree(&Tree::new()).unwrap();

        let left_entry = blob_entry(&store, "new.txt", b"left\n");
        let left_oid = store.save_tree(&tree_of(vec![left_entry])).unwrap();

        let right_entry = blob_entry(&store, "new.txt", b"right\n");
        let right_oid = store.save_tree(&tree_of(vec![right_entry])).unwrap();

        let err = merge_trees(&store, Some(empty_oid), Some(left_oid), Some(right_oid)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::Conflict {
                tag: ConflictTag::AddedDifferently,
                ..
            }
        ));
    }

    #[test]
    fn type_mismatch_conflicts() {
        let store = MemoryObjectStore::new();
        let base_entry = blob_entry(&store, "thing", b"base\n");
        let base_oid = store.save_tree(&tree_of(vec![base_entry])).unwrap();

        let left_entry = blob_entry(&store, "thing", b"left\n");
        let left_oid = store.save_tree(&tree_of(vec![left_entry])).unwrap();

        let inner_oid = store.save_tree(&Tree::new()).unwrap();
        let right_entry = TreeEntry {
            kind: TreeEntryKind::Tree,
            name: BString::from("thing"),
            target: inner_oid,
        };
        let right_oid = store.save_tree(&tree_of(vec![right_entry])).unwrap();

        let err = merge_trees(&store, Some(base_oid), Some(left_oid), Some(right_oid)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::Conflict {
                tag: ConflictTag::TypeMismatch,
                ..
            }
        ));
    }

    #[test]
    fn recurses_into_nested_trees() {
        let store = MemoryObjectStore::new();

        let base_inner = store
            .save_tree(&tree_of(vec![blob_entry(&store, "f.txt", b"base\n")]))
            .unwrap();
        let base_oid = store
            .save_tree(&tree_of(vec![TreeEntry {
                kind: TreeEntryKind::Tree,
                name: BString::from("dir"),
                target: base_inner,
            }]))
            .unwrap();

        let left_inner = store
            .save_tree(&tree_of(vec![blob_entry(&store, "f.txt", b"left\n")]))
            .unwrap();
        let left_oid = store
            .save_tree(&tree_of(vec![TreeEntry {
                kind: TreeEntryKind::Tree,
                name: BString::from("dir"),
                target: left_inner,
            }]))
            .unwrap();

        let merged = merge_trees(&store, Some(base_oid), Some(left_oid), Some(base_oid)).unwrap();
        assert_eq!(merged, left_oid);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let store = MemoryObjectStore::new();
        let leaf = store.save_tree(&Tree::new()).unwrap();

        // Force a genuine three-way merge (not the dedup fast path) by
        // making left and right diverge right at the leaf while keeping
        // every ancestor directory identical on both sides.
        let left_leaf_entry = blob_entry(&store, "f.txt", b"left\n");
        let left_leaf = store.save_tree(&tree_of(vec![left_leaf_entry])).unwrap();
        let right_leaf_entry = blob_entry(&store, "f.txt", b"right\n");
        let right_leaf = store.save_tree(&tree_of(vec![right_leaf_entry])).unwrap();

        let mut left_current = left_leaf;
        let mut right_current = right_leaf;
        let mut base_current = leaf;
        for _ in 0..(MAX_DEPTH + 5) {
            left_current = store
                .save_tree(&tree_of(vec![TreeEntry {
                    kind: TreeEntryKind::Tree,
                    name: BString::from("d"),
                    target: left_current,
                }]))
                .unwrap();
            right_current = store
                .save_tree(&tree_of(vec![TreeEntry {
                    kind: TreeEntryKind::Tree,
                    name: BString::from("d"),
                    target: right_current,
                }]))
                .unwrap();
            base_current = store
                .save_tree(&tree_of(vec![TreeEntry {
                    kind: TreeEntryKind::Tree,
                    name: BString::from("d"),
                    target: base_current,
                }]))
                .unwrap();
        }

        let err = merge_trees(
            &store,
            Some(base_current),
            Some(left_current),
            Some(right_current),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::DepthExceeded { .. }));
    }
}
