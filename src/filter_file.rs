//! Rewrites the generated part of a filter file.
//!
//! A filter file is split at the first [`USER_SECTION_MARKER`]. Everything
//! before it is ours and gets replaced on every update, everything from the
//! marker on belongs to the user and is kept as is.

use std::io::ErrorKind;
use std::path::Path;

pub const USER_SECTION_MARKER: &str = "#==";

/// Replaces everything ahead of the user section of `path` with `blocks`.
///
/// A missing file is created. A file without the marker is kept whole, after
/// the new blocks.
pub fn update_filter_file(path: &Path, blocks: &[&str]) -> std::io::Result<()> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };

    // Filter files may not be UTF-8.
    let marker = USER_SECTION_MARKER.as_bytes();
    let user_section = match content.windows(marker.len()).position(|w| w == marker) {
        Some(index) => &content[index..],
        None => &content[..],
    };

    let mut updated = blocks.concat().into_bytes();
    updated.extend_from_slice(user_section);

    std::fs::write(path, updated)?;
    tracing::debug!(
        "Wrote {} generated blocks to {}",
        blocks.len(),
        path.display()
    );

    Ok(())
}
