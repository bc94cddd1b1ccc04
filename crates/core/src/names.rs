//! Sequential output file names.
//!
//! Outputs are numbered `<prefix>001.wav`, `<prefix>002.wav`, ... in the
//! output directory. A new run takes the number after the highest one
//! already present, so earlier exports are never overwritten.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Prefix used when the caller does not choose one.
pub const DEFAULT_PREFIX: &str = "spoken_messages_";

/// Parse the three-digit number out of `<prefix>NNN.wav`.
fn output_number(file_name: &str, prefix: &str) -> Option<u32> {
    let digits = file_name.strip_prefix(prefix)?.strip_suffix(".wav")?;
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next free output path in `dir`.
///
/// Files that do not match `<prefix>NNN.wav` are ignored. A missing
/// directory counts as empty and yields `<prefix>001.wav`.
pub fn next_output_path(dir: &Path, prefix: &str) -> Result<PathBuf> {
    let mut highest = 0;
    if dir.exists() {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list output directory: {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(n) = output_number(&name.to_string_lossy(), prefix) {
                highest = highest.max(n);
            }
        }
    }
    Ok(dir.join(format!("{}{:03}.wav", prefix, highest + 1)))
}
