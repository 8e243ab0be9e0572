//! Deterministic output paths: `{dest}/{prefix-}{NNN}.png`.

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Minimum width of the numeric part of a filename.
pub const SEQUENCE_WIDTH: usize = 3;

/// Extension of every saved asset.
pub const OUTPUT_EXTENSION: &str = "png";

/// Left-pads the string form of `sequence` with `'0'` to [`SEQUENCE_WIDTH`].
///
/// Longer values are kept whole, never truncated.
pub fn pad_sequence(sequence: impl Display) -> String {
    format!("{:0>width$}", sequence.to_string(), width = SEQUENCE_WIDTH)
}

/// Builds the output path for one asset.
///
/// An empty `prefix` adds nothing; otherwise it is followed by `-`.
pub fn format_output_path(
    dest_dir: impl AsRef<Path>,
    prefix: &str,
    sequence: impl Display,
) -> PathBuf {
    let stem = if prefix.is_empty() {
        pad_sequence(sequence)
    } else {
        format!("{prefix}-{}", pad_sequence(sequence))
    };
    dest_dir.as_ref().join(format!("{stem}.{OUTPUT_EXTENSION}"))
}

/// Creates the destination directory (and parents) if missing.
pub fn ensure_output_dir(dest_dir: impl AsRef<Path>) -> std::io::Result<()> {
    std::fs::create_dir_all(dest_dir)
}
