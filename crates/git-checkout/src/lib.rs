//! Working-directory materialization for the merge engine.
//!
//! `FilesystemCheckout` recursively walks a tree, writing blob contents to
//! files and creating directories as needed, then removes any working-tree
//! entries that no longer appear in the tree. Grounded on the recursive
//! tree-checkout routine used by this codebase's CLI merge command; unlike
//! that routine, no index is rebuilt and no executable bit is applied, since
//! `TreeEntryKind` carries no mode information to materialize.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_object::TreeEntryKind;
use git_odb::{ObjectStore, OdbError};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collaborator that materializes a merged tree into a real directory.
pub trait Checkout {
    fn materialize(&self, tree: ObjectId) -> Result<(), CheckoutError>;
}

/// Checkout backed by an `ObjectStore` and a real filesystem directory.
pub struct FilesystemCheckout<'a> {
    store: &'a dyn ObjectStore,
    work_tree: PathBuf,
}

impl<'a> FilesystemCheckout<'a> {
    pub fn new(store: &'a dyn ObjectStore, work_tree: impl AsRef<Path>) -> Self {
        Self {
            store,
            work_tree: work_tree.as_ref().to_path_buf(),
        }
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn write_tree_recursive(
        &self,
        tree_oid: ObjectId,
        prefix: &Path,
        written: &mut HashSet<PathBuf>,
    ) -> Result<(), CheckoutError> {
        let tree = self.store.load_tree(tree_oid)?;

        for entry in tree.iter() {
            let name = entry.name.to_str_lossy();
            let rel_path = prefix.join(name.as_ref());
            let abs_path = self.work_tree.join(&rel_path);

            match entry.kind {
                TreeEntryKind::Tree => {
                    fs::create_dir_all(&abs_path).map_err(|source| CheckoutError::Io {
                        path: abs_path.clone(),
                        source,
                    })?;
                    written.insert(rel_path.clone());
                    self.write_tree_recursive(entry.target, &rel_path, written)?;
                }
                TreeEntryKind::Blob => {
                    if let Some(parent) = abs_path.parent() {
                        fs::create_dir_all(parent).map_err(|source| CheckoutError::Io {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                    }
                    let data = self.store.open_blob(entry.target)?;
                    fs::write(&abs_path, &data).map_err(|source| CheckoutError::Io {
                        path: abs_path.clone(),
                        source,
                    })?;
                    written.insert(rel_path);
                }
            }
        }

        Ok(())
    }

    /// Remove working-tree entries under `dir` that aren't in `written`.
    fn prune_stale(&self, dir: &Path, written: &HashSet<PathBuf>) -> Result<(), CheckoutError> {
        let read_dir = match fs::read_dir(dir) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(CheckoutError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        for entry in read_dir {
            let entry = entry.map_err(|source| CheckoutError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let abs_path = entry.path();
            let rel_path = abs_path
                .strip_prefix(&self.work_tree)
                .unwrap_or(&abs_path)
                .to_path_buf();

            let file_type = entry.file_type().map_err(|source| CheckoutError::Io {
                path: abs_path.clone(),
                source,
            })?;

            if file_type.is_dir() {
                if written.contains(&rel_path) {
                    self.prune_stale(&abs_path, written)?;
                } else {
                    fs::remove_dir_all(&abs_path).map_err(|source| CheckoutError::Io {
                        path: abs_path.clone(),
                        source,
                    })?;
                }
            } else if !written.contains(&rel_path) {
                fs::remove_file(&abs_path).map_err(|source| CheckoutError::Io {
                    path: abs_path.clone(),
                    source,
                })?;
            }
        }

        Ok(())
    }
}

impl<'a> Checkout for FilesystemCheckout<'a> {
    fn materialize(&self, tree: ObjectId) -> Result<(), CheckoutError> {
        fs::create_dir_all(&self.work_tree).map_err(|source| CheckoutError::Io {
            path: self.work_tree.clone(),
            source,
        })?;

        let mut written = HashSet::new();
        self.write_tree_recursive(tree, Path::new(""), &mut written)?;
        self.prune_stale(&self.work_tree, &written)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_object::{Tree, TreeEntry};
    use git_odb::MemoryObjectStore;

    fn blob(store: &MemoryObjectStore, data: &[u8]) -> ObjectId {
        store.save_blob(data).unwrap()
    }

    #[test]
    fn materialize_writes_files_and_directories() {
        let store = MemoryObjectStore::new();
        let readme = blob(&store, b"hello\n");
        let nested = blob(&store, b"nested content\n");

        let subtree = Tree {
            entries: vec![TreeEntry {
                kind: TreeEntryKind::Blob,
                name: "inner.txt".into(),
                target: nested,
            }],
        };
        let subtree_oid = store.save_tree(&subtree).unwrap();

        let root = Tree {
            entries: vec![
                TreeEntry {
                    kind: TreeEntryKind::Blob,
                    name: "README.md".into(),
                    target: readme,
                },
                TreeEntry {
                    kind: TreeEntryKind::Tree,
                    name: "sub".into(),
                    target: subtree_oid,
                },
            ],
        };
        let root_oid = store.save_tree(&root).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let checkout = FilesystemCheckout::new(&store, dir.path());
        checkout.materialize(root_oid).unwrap();

        assert_eq!(
            fs::read(dir.path().join("README.md")).unwrap(),
            b"hello\n"
        );
        assert_eq!(
            fs::read(dir.path().join("sub/inner.txt")).unwrap(),
            b"nested content\n"
        );
    }

    #[test]
    fn materialize_removes_stale_entries() {
        let store = MemoryObjectStore::new();
        let dir = tempfile::tempdir().unwrap();

        fs::write(dir.path().join("stale.txt"), b"old\n").unwrap();
        fs::create_dir(dir.path().join("stale_dir")).unwrap();
        fs::write(dir.path().join("stale_dir/a.txt"), b"old\n").unwrap();

        let keep = blob(&store, b"keep\n");
        let root = Tree {
            entries: vec![TreeEntry {
                kind: TreeEntryKind::Blob,
                name: "keep.txt".into(),
                target: keep,
            }],
        };
        let root_oid = store.save_tree(&root).unwrap();

        let checkout = FilesystemCheckout::new(&store, dir.path());
        checkout.materialize(root_oid).unwrap();

        assert!(dir.path().join("keep.txt").exists());
        assert!(!dir.path().join("stale.txt").exists());
        assert!(!dir.path().join("stale_dir").exists());
    }

    #[test]
    fn materialize_overwrites_changed_blob() {
        let store = MemoryObjectStore::new();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), b"old content\n").unwrap();

        let new_blob = blob(&store, b"new content\n");
        let root = Tree {
            entries: vec![TreeEntry {
                kind: TreeEntryKind::Blob,
                name: "f.txt".into(),
                target: new_blob,
            }],
        };
        let root_oid = store.save_tree(&root).unwrap();

        let checkout = FilesystemCheckout::new(&store, dir.path());
        checkout.materialize(root_oid).unwrap();

        assert_eq!(fs::read(dir.path().join("f.txt")).unwrap(), b"new content\n");
    }
}
