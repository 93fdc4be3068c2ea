//! Three-way textual merge of blob contents.
//!
//! Diffs base→left and base→right with the Myers line diff, then interleaves
//! the two change sets: non-overlapping regions are taken directly, and
//! overlapping regions that disagree are reported as a conflict rather than
//! rendered with markers, since the engine only needs to observe success or
//! failure of the reduction.

use bstr::BString;
use git_diff::{diff, split_lines, Edit, EditOp};
use git_hash::ObjectId;
use git_odb::ObjectStore;

use crate::{ConflictTag, MergeError};

const CONFLICT_MARKER_START: &str = "<<<<<<<";
const CONFLICT_MARKER_MID: &str = "=======";
const CONFLICT_MARKER_END: &str = ">>>>>>>";

/// Three-way merge the three blobs' contents and persist the result.
pub fn merge_blob(
    store: &dyn ObjectStore,
    path: &BString,
    base: ObjectId,
    left: ObjectId,
    right: ObjectId,
) -> Result<ObjectId, MergeError> {
    let base_bytes = store.open_blob(base)?;
    let left_bytes = store.open_blob(left)?;
    let right_bytes = store.open_blob(right)?;

    let (base_text, left_text, right_text) = (
        std::str::from_utf8(&base_bytes),
        std::str::from_utf8(&left_bytes),
        std::str::from_utf8(&right_bytes),
    );

    let (base_text, left_text, right_text) = match (base_text, left_text, right_text) {
        (Ok(b), Ok(l), Ok(r)) => (b, l, r),
        _ => {
            return Err(MergeError::Conflict {
                path: path.clone(),
                tag: ConflictTag::NotText,
            })
        }
    };

    let merged = merge_text(base_text, left_text, right_text).map_err(|tag| {
        MergeError::Conflict {
            path: path.clone(),
            tag,
        }
    })?;

    Ok(store.save_blob(merged.as_bytes())?)
}

/// Region-based three-way merge over UTF-8 text. Returns the merged text, or
/// `ConflictTag::Overlap` if left and right edit the same base lines
/// differently.
fn merge_text(base: &str, left: &str, right: &str) -> Result<String, ConflictTag> {
    if left == right {
        return Ok(left.to_string());
    }
    if base == left {
        return Ok(right.to_string());
    }
    if base == right {
        return Ok(left.to_string());
    }

    let base_lines = split_lines(base.as_bytes());
    let left_lines = split_lines(left.as_bytes());
    let right_lines = split_lines(right.as_bytes());

    let edits_left = diff(&base_lines, &left_lines, false);
    let edits_right = diff(&base_lines, &right_lines, false);

    let regions_left = collect_regions(&edits_left);
    let regions_right = collect_regions(&edits_right);

    let mut output = Vec::new();
    let mut base_pos = 0;
    let mut li = 0;
    let mut ri = 0;
    let mut conflicted = false;

    while li < regions_left.len() || ri < regions_right.len() {
        let l = regions_left.get(li);
        let r = regions_right.get(ri);

        match (l, r) {
            (Some(l), Some(r)) => {
                let l_end = l.base_start + l.base_len;
                let r_end = r.base_start + r.base_len;

                if l_end <= r.base_start {
                    emit_base(&mut output, &base_lines, base_pos, l.base_start);
                    emit(&mut output, &left_lines, l.new_start, l.new_len);
                    base_pos = l_end;
                    li += 1;
                } else if r_end <= l.base_start {
                    emit_base(&mut output, &base_lines, base_pos, r.base_start);
                    emit(&mut output, &right_lines, r.new_start, r.new_len);
                    base_pos = r_end;
                    ri += 1;
                } else {
                    let overlap_start = l.base_start.min(r.base_start);
                    let overlap_end = l_end.max(r_end);
                    emit_base(&mut output, &base_lines, base_pos, overlap_start);

                    let left_content = collect(&left_lines, l.new_start, l.new_len);
                    let right_content = collect(&right_lines, r.new_start, r.new_len);

                    if left_content == right_content {
                        output.extend_from_slice(&left_content);
                    } else {
                        conflicted = true;
                        emit_conflict(&mut output, &left_content, &right_content);
                    }

                    base_pos = overlap_end;
                    li += 1;
                    ri += 1;
                }
            }
            (Some(l), None) => {
                let l_end = l.base_start + l.base_len;
                emit_base(&mut output, &base_lines, base_pos, l.base_start);
                emit(&mut output, &left_lines, l.new_start, l.new_len);
                base_pos = l_end;
                li += 1;
            }
            (None, Some(r)) => {
                let r_end = r.base_start + r.base_len;
                emit_base(&mut output, &base_lines, base_pos, r.base_start);
                emit(&mut output, &right_lines, r.new_start, r.new_len);
                base_pos = r_end;
                ri += 1;
            }
            (None, None) => unreachable!(),
        }
    }

    emit_base(&mut output, &base_lines, base_pos, base_lines.len());

    if conflicted {
        return Err(ConflictTag::Overlap);
    }

    String::from_utf8(output).map_err(|_| ConflictTag::NotText)
}

/// A contiguous region of change relative to the base.
struct ChangeRegion {
    base_start: usize,
    base_len: usize,
    new_start: usize,
    new_len: usize,
}

fn collect_regions(edits: &[Edit]) -> Vec<ChangeRegion> {
    let mut regions = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        if edits[i].op == EditOp::Equal {
            i += 1;
            continue;
        }

        let base_start = edits[i].old_index;
        let new_start = edits[i].new_index;
        let mut base_end = base_start;
        let mut new_end = new_start;

        while i < edits.len() && edits[i].op != EditOp::Equal {
            match edits[i].op {
                EditOp::Delete => base_end = edits[i].old_index + 1,
                EditOp::Insert => new_end = edits[i].new_index + 1,
                EditOp::Equal => unreachable!(),
            }
            i += 1;
        }

        regions.push(ChangeRegion {
            base_start,
            base_len: base_end - base_start,
            new_start,
            new_len: new_end - new_start,
        });
    }

    regions
}

fn emit_base(output: &mut Vec<u8>, lines: &[&[u8]], from: usize, to: usize) {
    for line in &lines[from.min(lines.len())..to.min(lines.len())] {
        output.extend_from_slice(line);
    }
}

fn emit(output: &mut Vec<u8>, lines: &[&[u8]], start: usize, count: usize) {
    let end = (start + count).min(lines.len());
    for line in &lines[start.min(lines.len())..end] {
        output.extend_from_slice(line);
    }
}

fn collect(lines: &[&[u8]], start: usize, count: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    emit(&mut buf, lines, start, count);
    buf
}

fn emit_conflict(output: &mut Vec<u8>, left: &[u8], right: &[u8]) {
    output.extend_from_slice(CONFLICT_MARKER_START.as_bytes());
    output.extend_from_slice(b" left\n");
    output.extend_from_slice(left);
    output.extend_from_slice(CONFLICT_MARKER_MID.as_bytes());
    output.push(b'\n');
    output.extend_from_slice(right);
    output.extend_from_slice(CONFLICT_MARKER_END.as_bytes());
    output.extend_from_slice(b" right\n");
}
