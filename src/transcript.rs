//! Reading agent transcripts.
//!
//! The stop gate treats a transcript as opaque text: tool invocations and
//! their output are searched with regexes, so no JSONL structure is parsed.

use crate::error::{Error, Result};
use std::path::Path;

/// Read a transcript file as text.
///
/// Invalid UTF-8 is replaced rather than rejected, since command output
/// embedded in transcripts is not guaranteed to be clean.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or cannot be read.
pub fn read_transcript(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
