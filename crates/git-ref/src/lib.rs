//! Reference system for the merge engine.
//!
//! A reference is either direct (points straight at an object) or symbolic
//! (points at another reference, chasing down to a direct one). `RefStore`
//! abstracts resolution and atomic update so the merge driver can advance
//! HEAD and branches without caring whether the backing store lives in
//! memory or on disk.

mod error;
mod lockfile;
mod loose_files;
mod name;
mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use git_hash::ObjectId;

pub use error::RefError;
pub use name::RefName;
pub use store::RefStore;

const HEAD: &str = "HEAD";

/// A git reference — either direct (points to an OID) or symbolic (points to another ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Direct { name: RefName, target: ObjectId },
    Symbolic { name: RefName, target: RefName },
}

impl Reference {
    pub fn name(&self) -> &RefName {
        match self {
            Reference::Direct { name, .. } => name,
            Reference::Symbolic { name, .. } => name,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Symbolic { .. })
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Reference::Direct { .. })
    }

    pub fn target_oid(&self) -> Option<ObjectId> {
        match self {
            Reference::Direct { target, .. } => Some(*target),
            Reference::Symbolic { .. } => None,
        }
    }

    pub fn symbolic_target(&self) -> Option<&RefName> {
        match self {
            Reference::Symbolic { target, .. } => Some(target),
            Reference::Direct { .. } => None,
        }
    }
}

/// Maximum depth for following symbolic ref chains before declaring a loop.
const MAX_SYMREF_DEPTH: usize = 10;

/// Try parsing `name` as a literal hex OID, the third form `resolve` accepts
/// alongside symbolic names and `HEAD`.
fn literal_oid(name: &RefName) -> Option<ObjectId> {
    ObjectId::from_hex(name.as_str()).ok()
}

/// Reference store backed by an in-memory map. Used by tests and by callers
/// that don't need refs to survive the process.
#[derive(Default)]
pub struct MemoryRefStore {
    refs: RwLock<HashMap<String, Reference>>,
}

impl MemoryRefStore {
    pub fn new() -> Self {
        Self {
            refs: RwLock::new(HashMap::new()),
        }
    }

    /// Seed HEAD as a symbolic ref to `branch`, with `branch` pointing at `oid`.
    pub fn init_branch(&self, branch: &RefName, oid: ObjectId) -> Result<(), RefError> {
        self.refs.write().unwrap().insert(
            branch.to_string(),
            Reference::Direct {
                name: branch.clone(),
                target: oid,
            },
        );
        let head_name = RefName::new(HEAD)?;
        self.refs.write().unwrap().insert(
            HEAD.to_string(),
            Reference::Symbolic {
                name: head_name,
                target: branch.clone(),
            },
        );
        Ok(())
    }

    /// Seed HEAD as a symbolic ref to `branch` without creating `branch`
    /// itself, the state of a freshly initialized repository with no
    /// commits yet (an "unborn" branch).
    pub fn init_unborn(&self, branch: &RefName) -> Result<(), RefError> {
        let head_name = RefName::new(HEAD)?;
        self.refs.write().unwrap().insert(
            HEAD.to_string(),
            Reference::Symbolic {
                name: head_name,
                target: branch.clone(),
            },
        );
        Ok(())
    }

    fn resolve_chain(&self, name: &RefName, depth: usize) -> Result<Option<ObjectId>, RefError> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(RefError::SymrefLoop(name.to_string()));
        }
        match self.refs.read().unwrap().get(name.as_str()).cloned() {
            Some(Reference::Direct { target, .. }) => Ok(Some(target)),
            Some(Reference::Symbolic { target, .. }) => self.resolve_chain(&target, depth + 1),
            None => Ok(literal_oid(name)),
        }
    }
}

impl RefStore for MemoryRefStore {
    fn resolve(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        if let Some(found) = self.refs.read().unwrap().get(name.as_str()).cloned() {
            return Ok(Some(found));
        }
        Ok(literal_oid(name).map(|target| Reference::Direct {
            name: name.clone(),
            target,
        }))
    }

    fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        self.resolve_chain(name, 0)
    }

    fn head_ref(&self) -> Result<Reference, RefError> {
        let name = RefName::new(HEAD)?;
        self.resolve(&name)?.ok_or(RefError::NotFound(HEAD.into()))
    }

    fn update_ref(&self, name: &RefName, oid: ObjectId) -> Result<(), RefError> {
        self.refs.write().unwrap().insert(
            name.to_string(),
            Reference::Direct {
                name: name.clone(),
                target: oid,
            },
        );
        Ok(())
    }

    fn update_head(&self, oid: ObjectId) -> Result<(), RefError> {
        let head = self.head_ref()?;
        match head {
            Reference::Symbolic { target, .. } => self.update_ref(&target, oid),
            Reference::Direct { name, .. } => self.update_ref(&name, oid),
        }
    }
}

/// Files-backend ref store: loose refs stored as individual files, HEAD at
/// the repository root, atomic updates via lock file rename.
pub struct FilesRefStore {
    git_dir: PathBuf,
}

impl FilesRefStore {
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn resolve_chain(&self, name: &RefName, depth: usize) -> Result<Option<ObjectId>, RefError> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(RefError::SymrefLoop(name.to_string()));
        }
        match loose_files::read_loose_ref(&self.git_dir, name)? {
            Some(Reference::Direct { target, .. }) => Ok(Some(target)),
            Some(Reference::Symbolic { target, .. }) => self.resolve_chain(&target, depth + 1),
            None => Ok(literal_oid(name)),
        }
    }
}

impl RefStore for FilesRefStore {
    fn resolve(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        if let Some(found) = loose_files::read_loose_ref(&self.git_dir, name)? {
            return Ok(Some(found));
        }
        Ok(literal_oid(name).map(|target| Reference::Direct {
            name: name.clone(),
            target,
        }))
    }

    fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        self.resolve_chain(name, 0)
    }

    fn head_ref(&self) -> Result<Reference, RefError> {
        let name = RefName::new(HEAD)?;
        self.resolve(&name)?.ok_or(RefError::NotFound(HEAD.into()))
    }

    fn update_ref(&self, name: &RefName, oid: ObjectId) -> Result<(), RefError> {
        loose_files::write_loose_ref(&self.git_dir, name, &oid)
    }

    fn update_head(&self, oid: ObjectId) -> Result<(), RefError> {
        let head = self.head_ref()?;
        match head {
            Reference::Symbolic { target, .. } => self.update_ref(&target, oid),
            Reference::Direct { name, .. } => self.update_ref(&name, oid),
        }
    }
}
