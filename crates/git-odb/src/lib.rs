//! Object store for the merge engine.
//!
//! Provides the `ObjectStore` trait used by the merge driver and its
//! collaborators, plus a concurrency-safe in-memory implementation. Disk
//! layout and compression are out of scope; objects live purely as
//! content-addressed bytes in memory.

use std::collections::HashMap;
use std::sync::RwLock;

use git_hash::ObjectId;
use git_object::{Commit, Object, ObjectType, Tree};

#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("object {0} is not a commit")]
    NotACommit(ObjectId),

    #[error("object {0} is not a tree")]
    NotATree(ObjectId),

    #[error("object {0} is not a blob")]
    NotABlob(ObjectId),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),
}

/// Storage and retrieval of the three object kinds the merge engine needs.
///
/// Writes are idempotent: saving the same content twice yields the same OID
/// and does not error.
pub trait ObjectStore: Send + Sync {
    fn load_commit(&self, oid: ObjectId) -> Result<Commit, OdbError>;
    fn load_tree(&self, oid: ObjectId) -> Result<Tree, OdbError>;
    fn open_blob(&self, oid: ObjectId) -> Result<Vec<u8>, OdbError>;
    fn save_tree(&self, tree: &Tree) -> Result<ObjectId, OdbError>;
    fn save_blob(&self, data: &[u8]) -> Result<ObjectId, OdbError>;
    fn save_commit(&self, commit: &Commit) -> Result<ObjectId, OdbError>;
    fn contains(&self, oid: ObjectId) -> bool;
}

/// In-memory object store backed by a map guarded by a single `RwLock`.
///
/// Concurrent readers proceed in parallel; writers take an exclusive lock
/// just long enough to insert. Objects are never removed.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Object>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, oid: ObjectId) -> Result<Object, OdbError> {
        self.objects
            .read()
            .unwrap()
            .get(&oid)
            .cloned()
            .ok_or(OdbError::NotFound(oid))
    }

    fn put(&self, obj: Object) -> ObjectId {
        let oid = obj.compute_oid();
        self.objects.write().unwrap().entry(oid).or_insert(obj);
        oid
    }
}

impl ObjectStore for MemoryObjectStore {
    fn load_commit(&self, oid: ObjectId) -> Result<Commit, OdbError> {
        match self.get(oid)? {
            Object::Commit(c) => Ok(c),
            _ => Err(OdbError::NotACommit(oid)),
        }
    }

    fn load_tree(&self, oid: ObjectId) -> Result<Tree, OdbError> {
        match self.get(oid)? {
            Object::Tree(t) => Ok(t),
            _ => Err(OdbError::NotATree(oid)),
        }
    }

    fn open_blob(&self, oid: ObjectId) -> Result<Vec<u8>, OdbError> {
        match self.get(oid)? {
            Object::Blob(b) => Ok(b.data),
            _ => Err(OdbError::NotABlob(oid)),
        }
    }

    fn save_tree(&self, tree: &Tree) -> Result<ObjectId, OdbError> {
        Ok(self.put(Object::Tree(tree.clone())))
    }

    fn save_blob(&self, data: &[u8]) -> Result<ObjectId, OdbError> {
        Ok(self.put(Object::Blob(git_object::Blob::new(data.to_vec()))))
    }

    fn save_commit(&self, commit: &Commit) -> Result<ObjectId, OdbError> {
        Ok(self.put(Object::Commit(commit.clone())))
    }

    fn contains(&self, oid: ObjectId) -> bool {
        self.objects.read().unwrap().contains_key(&oid)
    }
}

/// The object type stored, useful for diagnostics.
pub fn object_type_of(obj: &Object) -> ObjectType {
    obj.object_type()
}
