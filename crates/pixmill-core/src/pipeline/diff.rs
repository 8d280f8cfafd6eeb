//! The diff engine: which source files still need processing.
//!
//! The output tree is the only record of past work. A source is pending
//! when no artifact in the output tree maps back to it under the naming
//! contract in [`crate::layout`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directory-tree scanning and the pending-set computation.
pub struct DiffScanner;

impl DiffScanner {
    /// All regular files under `root`, recursively, sorted. A missing
    /// directory yields an empty listing so a first run with no prior
    /// output tree proceeds as "everything pending".
    pub fn list_files(root: &Path) -> Vec<PathBuf> {
        if !root.is_dir() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    /// Source files under `base_input_dir` with no corresponding artifact
    /// under `out_root`.
    ///
    /// Each output file is reduced to the source stem it came from by
    /// stripping its quality tag and extension plus the output base;
    /// quality variants of one source collapse into one entry. A source
    /// compares by its base-relative path with a `.png` extension
    /// stripped; other extensions are kept, so non-PNG sources only match
    /// an untagged output of the identical name.
    pub fn pending(base_input_dir: &Path, out_root: &Path) -> Vec<PathBuf> {
        let produced: HashSet<PathBuf> = Self::list_files(out_root)
            .iter()
            .filter_map(|path| path.strip_prefix(out_root).ok())
            .map(Self::produced_key)
            .collect();

        Self::list_files(base_input_dir)
            .into_iter()
            .filter(|source| {
                source
                    .strip_prefix(base_input_dir)
                    .map(Self::source_key)
                    .is_ok_and(|key| !produced.contains(&key))
            })
            .collect()
    }

    /// Reduce an output-relative artifact path to its source stem: drop a
    /// trailing quality tag together with the extension. Untagged files
    /// keep their full name.
    fn produced_key(rel: &Path) -> PathBuf {
        let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
            return rel.to_path_buf();
        };
        match name.rfind('.') {
            Some(dot) if dot > 0 => {
                let stem = &name[..dot];
                match stem
                    .strip_suffix("-FULL")
                    .or_else(|| stem.strip_suffix("-50"))
                {
                    Some(stripped) => rel.with_file_name(stripped),
                    None => rel.to_path_buf(),
                }
            }
            _ => rel.to_path_buf(),
        }
    }

    /// Reduce a base-relative source path to its comparison key: strip a
    /// `.png` extension, keep everything else.
    fn source_key(rel: &Path) -> PathBuf {
        match rel.file_name().and_then(|n| n.to_str()) {
            Some(name) => match name.strip_suffix(".png") {
                Some(stripped) => rel.with_file_name(stripped),
                None => rel.to_path_buf(),
            },
            None => rel.to_path_buf(),
        }
    }
}
