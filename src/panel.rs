//! In-place update of the managed forecast region inside the panel document.
//!
//! The region looks like
//!
//! ```text
//! #Weather Forecast
//!
//! <table>
//!
//! *Last updated <stamp>*
//! ```
//!
//! Only the table and the stamp are replaced. Everything before the header
//! and after the trailer line is kept byte for byte.

use crate::error::PatchError;

pub const REGION_HEADER: &str = "#Weather Forecast\n\n";

pub const TRAILER_PREFIX: &str = "\n\n*Last updated ";

const TRAILER_SUFFIX: &str = "*\n";

/// Byte offsets of the managed region within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedRegion {
    /// Start of the header literal.
    pub start: usize,
    /// First byte of the table, just after the header.
    pub body_start: usize,
    /// Start of the trailer prefix, just after the table.
    pub body_end: usize,
    /// One past the trailer's closing newline.
    pub end: usize,
}

impl ManagedRegion {
    /// Find the region. The header is the first occurrence; the trailer is the
    /// last `*Last updated ...*` line after a non-empty body.
    pub fn locate(document: &str) -> Result<Self, PatchError> {
        let start = document.find(REGION_HEADER).ok_or(PatchError::MissingHeader)?;
        let body_start = start + REGION_HEADER.len();

        let candidates: Vec<usize> = document[body_start..]
            .match_indices(TRAILER_PREFIX)
            .map(|(offset, _)| body_start + offset)
            .filter(|&at| at > body_start)
            .collect();

        candidates
            .into_iter()
            .rev()
            .find_map(|body_end| {
                trailer_end(document, body_end).map(|end| Self {
                    start,
                    body_start,
                    body_end,
                    end,
                })
            })
            .ok_or(PatchError::MissingTrailer)
    }
}

/// End of a well-formed trailer line starting at `at`, if there is one.
fn trailer_end(document: &str, at: usize) -> Option<usize> {
    let stamp_start = at + TRAILER_PREFIX.len();
    let line_len = document[stamp_start..].find('\n')?;
    let line = &document[stamp_start..stamp_start + line_len];
    // At least one character of stamp before the closing `*`.
    if line.len() >= 2 && line.ends_with('*') {
        Some(stamp_start + line_len + 1)
    } else {
        None
    }
}

/// Replace the table and stamp of the managed region.
///
/// Fails without producing a document if the region cannot be found, or if
/// the replacement would leave a document whose region can no longer be found.
pub fn patch(document: &str, table: &str, updated: &str) -> Result<String, PatchError> {
    let region = ManagedRegion::locate(document)?;

    let mut patched = String::with_capacity(document.len() + table.len());
    patched.push_str(&document[..region.body_start]);
    patched.push_str(table);
    patched.push_str(TRAILER_PREFIX);
    patched.push_str(updated);
    patched.push_str(TRAILER_SUFFIX);
    patched.push_str(&document[region.end..]);

    ManagedRegion::locate(&patched)?;
    Ok(patched)
}
