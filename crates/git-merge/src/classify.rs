//! Maps a (HEAD, target) commit pair to how their histories relate.

use git_hash::ObjectId;
use git_odb::ObjectStore;
use git_revwalk::common_ancestor;

use crate::MergeError;

/// How the current branch relates to a merge target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    /// The two histories share no common ancestor.
    Disjoint,
    /// HEAD already contains target; nothing to do.
    UpToDate,
    /// Target is strictly ahead of HEAD; HEAD can simply advance.
    FastForward,
    /// The histories diverged; a merge commit is required.
    ThreeWay,
}

/// Classify the relationship between `head` and `target` by consulting the
/// ancestry oracle. The equality against `target` is checked before the
/// equality against `head`, so two identical commits classify as up-to-date.
pub fn classify(
    store: &dyn ObjectStore,
    head: ObjectId,
    target: ObjectId,
) -> Result<MergeResult, MergeError> {
    match common_ancestor(store, head, target)? {
        None => Ok(MergeResult::Disjoint),
        Some(ancestor) if ancestor == target => Ok(MergeResult::UpToDate),
        Some(ancestor) if ancestor == head => Ok(MergeResult::FastForward),
        Some(_) => Ok(MergeResult::ThreeWay),
    }
}
