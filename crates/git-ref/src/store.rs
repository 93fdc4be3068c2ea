use git_hash::ObjectId;

use crate::error::RefError;
use crate::name::RefName;
use crate::Reference;

/// Trait for pluggable reference storage backends.
pub trait RefStore: Send + Sync {
    /// Resolve a ref name to a Reference (may be Direct or Symbolic).
    fn resolve(&self, name: &RefName) -> Result<Option<Reference>, RefError>;

    /// Resolve a ref name to its final OID, following symbolic ref chains.
    fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError>;

    /// Return HEAD's current target: symbolic (points at a branch) or direct (detached).
    fn head_ref(&self) -> Result<Reference, RefError>;

    /// Atomically update a ref to point directly at `oid`.
    fn update_ref(&self, name: &RefName, oid: ObjectId) -> Result<(), RefError>;

    /// Atomically update HEAD.
    ///
    /// If HEAD is symbolic, updates the branch it points at and leaves HEAD's
    /// symbolic target unchanged. If HEAD is detached, updates HEAD directly.
    fn update_head(&self, oid: ObjectId) -> Result<(), RefError>;
}
