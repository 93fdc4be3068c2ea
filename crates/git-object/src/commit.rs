use git_hash::ObjectId;

use crate::ObjectError;

/// A git commit object.
///
/// A commit has zero, one, or two parents: zero for a root commit, one for an
/// ordinary commit, two for a merge commit (`parent` is the first parent,
/// `second_parent` the parent contributed by the merged-in side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// OID of the root tree.
    pub tree: ObjectId,
    /// First parent commit OID (absent for a root commit).
    pub parent: Option<ObjectId>,
    /// Second parent commit OID (present only for merge commits).
    pub second_parent: Option<ObjectId>,
    /// Author identity, formatted as `"Name <email>"`.
    pub author: String,
    /// Commit timestamp, Unix seconds.
    pub timestamp: i64,
    /// Commit message.
    pub message: String,
}

impl Commit {
    /// Parse commit content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parent: Option<ObjectId> = None;
        let mut second_parent: Option<ObjectId> = None;
        let mut author: Option<String> = None;
        let mut timestamp: Option<i64> = None;

        let mut pos = 0;
        let data = content;

        loop {
            if pos >= data.len() {
                break;
            }
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());
            let line = &data[pos..line_end];

            let space_pos = line
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;
            let key = &line[..space_pos];
            let value = &line[space_pos + 1..];

            match key {
                b"tree" => {
                    let hex = std::str::from_utf8(value)
                        .map_err(|_| ObjectError::InvalidHeader("non-UTF8 tree OID".into()))?;
                    tree = Some(ObjectId::from_hex(hex)?);
                }
                b"parent" => {
                    let hex = std::str::from_utf8(value)
                        .map_err(|_| ObjectError::InvalidHeader("non-UTF8 parent OID".into()))?;
                    let oid = ObjectId::from_hex(hex)?;
                    if parent.is_none() {
                        parent = Some(oid);
                    } else {
                        second_parent = Some(oid);
                    }
                }
                b"author" => {
                    let text = std::str::from_utf8(value)
                        .map_err(|_| ObjectError::InvalidHeader("non-UTF8 author".into()))?;
                    let space = text.rfind(' ').ok_or_else(|| {
                        ObjectError::InvalidHeader("malformed author line".into())
                    })?;
                    author = Some(text[..space].to_string());
                    timestamp = Some(text[space + 1..].parse().map_err(|_| {
                        ObjectError::InvalidHeader("invalid author timestamp".into())
                    })?);
                }
                _ => {
                    return Err(ObjectError::InvalidHeader(format!(
                        "unexpected commit header: {}",
                        String::from_utf8_lossy(key)
                    )));
                }
            }

            pos = line_end + 1;
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let timestamp = timestamp.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let message = String::from_utf8(data[pos..].to_vec())
            .map_err(|_| ObjectError::InvalidHeader("non-UTF8 message".into()))?;

        Ok(Self {
            tree,
            parent,
            second_parent,
            author,
            timestamp,
            message,
        })
    }

    /// Serialize commit content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        if let Some(parent) = self.parent {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }
        if let Some(second_parent) = self.second_parent {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(second_parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(self.author.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.timestamp.to_string().as_bytes());
        out.push(b'\n');

        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());

        out
    }

    /// Is this a merge commit? (two parents)
    pub fn is_merge(&self) -> bool {
        self.second_parent.is_some()
    }

    /// Is this a root commit? (no parents)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
