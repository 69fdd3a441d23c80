//! Directory scanning: classify source files under the config root.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::reader::SourceFormat;

/// One config source file found under the root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// Config name: the file base name without its extension.
    pub name: String,
    /// Classified format, from the extension.
    pub format: SourceFormat,
}

/// The directory walk itself failed. Unlike per-file read errors, this is
/// fatal to the whole load pass.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Editor scratch files and office lock files ("~$Item.xlsx") never count
/// as config sources, on disk or in change events.
pub(crate) fn is_transient(file_name: &str) -> bool {
    file_name.contains('~') || file_name.contains('#')
}

/// Walks `root` recursively and returns every recognized source file.
///
/// Entries are visited in name order per directory, so results are
/// deterministic for a given tree. Unrecognized extensions, transient
/// files, and names on the exclude list are skipped silently; a duplicate
/// config name keeps its first occurrence and logs the one it shadows.
pub fn scan_dir(root: &Path, exclude: &HashSet<String>) -> Result<Vec<SourceFile>, ScanError> {
    let mut found = Vec::new();
    walk(root, exclude, &mut found)?;

    let mut names = HashSet::new();
    let mut unique = Vec::with_capacity(found.len());
    for file in found {
        if names.insert(file.name.clone()) {
            unique.push(file);
        } else {
            warn!(
                config = %file.name,
                path = %file.path.display(),
                "duplicate config name, keeping the first occurrence"
            );
        }
    }
    Ok(unique)
}

fn walk(dir: &Path, exclude: &HashSet<String>, out: &mut Vec<SourceFile>) -> Result<(), ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut entries: Vec<fs::DirEntry> =
        entries
            .collect::<Result<_, _>>()
            .map_err(|source| ScanError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, exclude, out)?;
            continue;
        }
        if let Some(file) = classify(path, exclude) {
            out.push(file);
        }
    }
    Ok(())
}

/// Classifies one path, or `None` when it is not a config source.
pub(crate) fn classify(path: PathBuf, exclude: &HashSet<String>) -> Option<SourceFile> {
    let file_name = path.file_name().and_then(OsStr::to_str)?;
    if is_transient(file_name) || exclude.contains(file_name) {
        return None;
    }
    let format = SourceFormat::from_extension(path.extension().and_then(OsStr::to_str)?)?;
    let name = path.file_stem().and_then(OsStr::to_str)?.to_string();
    Some(SourceFile { path, name, format })
}
