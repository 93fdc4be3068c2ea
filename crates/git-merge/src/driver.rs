//! Orchestrates a merge: classify, dispatch, commit, advance the ref,
//! materialize the working directory.

use git_checkout::Checkout;
use git_object::Commit;
use git_odb::ObjectStore;
use git_ref::{RefName, RefStore};

use crate::classify::{classify, MergeResult};
use crate::tree_merge::merge_trees;
use crate::MergeError;

/// Resolve the commit author string the way this codebase's CLI resolves
/// commit identity: environment variables, falling back to a fixed
/// placeholder when unset.
pub fn resolve_author() -> String {
    let name = std::env::var("GIT_AUTHOR_NAME").unwrap_or_else(|_| "Unknown".to_string());
    let email = std::env::var("GIT_AUTHOR_EMAIL").unwrap_or_else(|_| "unknown@unknown".to_string());
    format!("{name} <{email}>")
}

/// Merge `target_ref` into the current branch.
///
/// `target_ref` may name a branch, `HEAD`, or a literal OID; it is resolved
/// through the reference store before anything else. `timestamp` is supplied
/// by the caller rather than read from the clock, so tests stay
/// deterministic; a real caller passes the current Unix time.
pub fn merge(
    store: &dyn ObjectStore,
    refs: &dyn RefStore,
    checkout: &dyn Checkout,
    target_ref: &RefName,
    timestamp: i64,
) -> Result<MergeResult, MergeError> {
    let target = refs
        .resolve_to_oid(target_ref)?
        .ok_or_else(|| MergeError::UnresolvedTarget(target_ref.to_string()))?;

    let head_ref = refs.head_ref()?;
    let head = refs.resolve_to_oid(head_ref.name())?;

    let head = match head {
        Some(head) => head,
        None => {
            // Empty repository: fast-forward onto target unconditionally.
            refs.update_head(target)?;
            let tree = store.load_commit(target)?.tree;
            checkout.materialize(tree)?;
            return Ok(MergeResult::FastForward);
        }
    };

    let result = classify(store, head, target)?;

    match result {
        MergeResult::Disjoint | MergeResult::UpToDate => Ok(result),

        MergeResult::FastForward => {
            let tree = store.load_commit(target)?.tree;
            checkout.materialize(tree)?;
            refs.update_head(target)?;
            Ok(result)
        }

        MergeResult::ThreeWay => {
            let base = git_revwalk::common_ancestor(store, head, target)?
                .expect("three-way classification implies a common ancestor");

            let base_commit = store.load_commit(base)?;
            let head_commit = store.load_commit(head)?;
            let target_commit = store.load_commit(target)?;

            let merged_tree = merge_trees(
                store,
                Some(base_commit.tree),
                Some(head_commit.tree),
                Some(target_commit.tree),
            )?;

            let merge_commit = Commit {
                tree: merged_tree,
                parent: Some(head),
                second_parent: Some(target),
                author: resolve_author(),
                timestamp,
                message: format!("Merge {target_ref}"),
            };
            let merge_oid = store.save_commit(&merge_commit)?;

            // Materialize before advancing the reference: if checkout fails,
            // HEAD has not moved and the repository is unchanged except for
            // the now-unreferenced (harmless) merge commit object.
            checkout.materialize(merged_tree)?;
            refs.update_head(merge_oid)?;

            Ok(result)
        }
    }
}
