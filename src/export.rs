//! Output delivery: derived filenames and buffer saves

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Derive an output path by appending `suffix` to the input's file stem,
/// keeping the `.pdf` extension: `report.pdf` + `_rotated` →
/// `report_rotated.pdf`.
#[must_use]
pub fn derive_output_name(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}{suffix}.pdf"))
}

/// Output path for one part of a split: `_part{N}` (1-based) when the split
/// produced several documents, `_split` when it produced exactly one.
#[must_use]
pub fn split_output_name(input: &Path, part: usize, parts: usize) -> PathBuf {
    if parts == 1 {
        derive_output_name(input, "_split")
    } else {
        derive_output_name(input, &format!("_part{}", part + 1))
    }
}

/// Write one serialized document to disk.
pub fn save_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    Ok(())
}

/// Human-readable byte size: `B` below 1 KB, then one-decimal `KB`/`MB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    if bytes < 1024 {
        format!("{bytes} B")
    } else if (bytes as f64) < MB {
        format!("{:.1} KB", bytes as f64 / KB)
    } else {
        format!("{:.1} MB", bytes as f64 / MB)
    }
}
