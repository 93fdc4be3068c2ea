//! Merge engine: ancestry classification, recursive tree merge, three-way
//! text merge, and the driver that ties them to the ref store and working
//! directory.
//!
//! Given a target commit, the driver classifies its relationship to HEAD
//! (disjoint, up to date, fast-forward, or diverged), reconciles trees
//! recursively for the diverged case, and creates a merge commit. Rename
//! detection, pluggable strategies, and conflict-style formatting are out of
//! scope; only the `Merge`-style three-token conflict marker is produced.

mod blob_merge;
mod classify;
mod error;
mod tree_merge;

pub mod driver;

pub use blob_merge::merge_blob;
pub use classify::{classify, MergeResult};
pub use driver::merge;
pub use error::{ConflictTag, MergeError};
pub use tree_merge::merge_trees;
