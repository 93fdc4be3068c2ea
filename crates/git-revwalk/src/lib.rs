//! Ancestry queries over the first-parent line of commits.
//!
//! `common_ancestor` walks only first parents — the lowest common ancestor
//! of two branch tips in the usual case, traded for the full merge-base DAG
//! search a general-purpose revision walker would perform. This matches the
//! ancestry semantics the merge engine actually needs: whether one tip is
//! reachable from another along its mainline history.

use std::collections::HashSet;

use git_hash::ObjectId;
use git_odb::{ObjectStore, OdbError};

#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error(transparent)]
    Odb(#[from] OdbError),
}

/// Collect the first-parent ancestry of `start`, including `start` itself.
fn first_parent_chain(
    store: &dyn ObjectStore,
    start: ObjectId,
) -> Result<HashSet<ObjectId>, RevWalkError> {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(oid) = current {
        if !seen.insert(oid) {
            break;
        }
        current = store.load_commit(oid)?.parent;
    }
    Ok(seen)
}

/// Find the common ancestor of two commits by walking first parents only.
///
/// Returns `a` unchanged when `a == b`. Otherwise collects `a`'s first-parent
/// ancestry and walks `b`'s first-parent chain until it lands on a commit
/// already in that set, returning the first such commit. Returns `None` if
/// the two commits share no ancestor along their first-parent lines.
pub fn common_ancestor(
    store: &dyn ObjectStore,
    a: ObjectId,
    b: ObjectId,
) -> Result<Option<ObjectId>, RevWalkError> {
    if a == b {
        return Ok(Some(a));
    }

    let ancestors_of_a = first_parent_chain(store, a)?;

    let mut current = Some(b);
    while let Some(oid) = current {
        if ancestors_of_a.contains(&oid) {
            return Ok(Some(oid));
        }
        current = store.load_commit(oid)?.parent;
    }

    Ok(None)
}

/// Is `ancestor` reachable from `descendant` by following first parents?
pub fn is_ancestor(
    store: &dyn ObjectStore,
    ancestor: ObjectId,
    descendant: ObjectId,
) -> Result<bool, RevWalkError> {
    Ok(common_ancestor(store, ancestor, descendant)? == Some(ancestor))
}
