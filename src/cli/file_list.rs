//! File list construction with recursive directory expansion.
//!
//! Given a mixed list of file and directory paths, [`create_file_list`] returns
//! a flat `Vec<PathBuf>` containing only regular files. Directories are walked
//! recursively using the [`walkdir`] crate, without following symlinks.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expand a mixed list of file and directory paths into a flat list of files.
///
/// - Non-directory paths are forwarded unchanged.
/// - Directories are walked recursively in file-name order; only entries
///   whose `file_type().is_file()` is true are kept.
/// - The first unreadable directory entry aborts the walk.
pub fn create_file_list<P: AsRef<Path>>(inputs: &[P]) -> io::Result<Vec<PathBuf>> {
    let mut result = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    e.io_error()
                        .map(|io| io::Error::new(io.kind(), io.to_string()))
                        .unwrap_or_else(|| io::Error::other(e.to_string()))
                })?;
                if entry.file_type().is_file() {
                    result.push(entry.into_path());
                }
            }
        } else {
            result.push(input.to_path_buf());
        }
    }
    Ok(result)
}
