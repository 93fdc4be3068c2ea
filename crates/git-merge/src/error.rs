use bstr::BString;

/// Reason a tree or blob merge could not be resolved automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictTag {
    /// The same path was added on both sides with different content.
    AddedDifferently,
    /// One side deleted the path, the other modified it.
    DeleteVsModify,
    /// One side holds a tree and the other a blob at the same path.
    TypeMismatch,
    /// A blob involved in a three-way text merge is not valid UTF-8.
    NotText,
    /// Both sides edited the same region of a text blob differently.
    Overlap,
}

impl ConflictTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddedDifferently => "added-differently",
            Self::DeleteVsModify => "delete-vs-modify",
            Self::TypeMismatch => "type-mismatch",
            Self::NotText => "not-text",
            Self::Overlap => "overlap",
        }
    }
}

impl std::fmt::Display for ConflictTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("merge conflict in {path}: {tag}")]
    Conflict { path: BString, tag: ConflictTag },

    #[error("tree recursion exceeded depth limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("cannot resolve merge target '{0}'")]
    UnresolvedTarget(String),

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Ref(#[from] git_ref::RefError),

    #[error(transparent)]
    Checkout(#[from] git_checkout::CheckoutError),

    #[error(transparent)]
    RevWalk(#[from] git_revwalk::RevWalkError),
}
