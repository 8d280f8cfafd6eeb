//! Output-tree audits: completeness and dimensional correctness.
//!
//! Both audits read the source and output trees independently of the
//! pipeline and report violations without correcting anything.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::ImageCodec;
use crate::layout::{self, Quality};
use crate::pipeline::diff::DiffScanner;

/// Pixel dimensions implied by each quality tag.
const LOSSY_DIMENSIONS: (u32, u32) = (1280, 720);
const FULL_DIMENSIONS: (u32, u32) = (1920, 1080);

/// A single finding from the dimension audit.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionIssue {
    /// Artifact dimensions don't match what its quality tag implies
    Mismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    /// Artifact could not be probed at all
    Unreadable { path: PathBuf, message: String },
}

/// Source files with zero artifacts in the output tree.
///
/// Compares extension-stripped stems on both sides (the output side also
/// has its quality tag stripped), so any one quality variant counts as
/// converted. Returns base-relative stems.
pub fn files_not_converted(base_input_dir: &Path, out_root: &Path) -> Vec<PathBuf> {
    let converted: HashSet<PathBuf> = DiffScanner::list_files(out_root)
        .iter()
        .filter_map(|path| path.strip_prefix(out_root).ok())
        .map(|rel| strip_tag(&drop_extension(rel)))
        .collect();

    DiffScanner::list_files(base_input_dir)
        .iter()
        .filter_map(|path| path.strip_prefix(base_input_dir).ok())
        .map(drop_extension)
        .filter(|stem| !converted.contains(stem))
        .collect()
}

/// Check every tagged artifact against the dimensions its tag implies:
/// `-50` artifacts must be exactly 1280x720, `-FULL` artifacts exactly
/// 1920x1080. Untagged files are not audited.
pub fn files_not_full_hd<C: ImageCodec>(codec: &C, out_root: &Path) -> Vec<DimensionIssue> {
    let mut issues = Vec::new();
    for artifact in DiffScanner::list_files(out_root) {
        let Some(name) = artifact.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let expected = match layout::quality_of(name) {
            Some(Quality::Lossy) => LOSSY_DIMENSIONS,
            Some(Quality::Full) => FULL_DIMENSIONS,
            None => continue,
        };
        match codec.dimensions_of(&artifact) {
            Ok((width, height)) if (width, height) != expected => {
                issues.push(DimensionIssue::Mismatch {
                    path: artifact,
                    width,
                    height,
                    expected_width: expected.0,
                    expected_height: expected.1,
                });
            }
            Ok(_) => {}
            Err(err) => {
                issues.push(DimensionIssue::Unreadable {
                    path: artifact,
                    message: err.to_string(),
                });
            }
        }
    }
    issues
}

fn drop_extension(rel: &Path) -> PathBuf {
    match rel.file_name().and_then(|n| n.to_str()) {
        Some(name) => match name.rfind('.') {
            Some(dot) if dot > 0 => rel.with_file_name(&name[..dot]),
            _ => rel.to_path_buf(),
        },
        None => rel.to_path_buf(),
    }
}

fn strip_tag(stem_path: &Path) -> PathBuf {
    match stem_path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            let stripped = name
                .strip_suffix("-FULL")
                .or_else(|| name.strip_suffix("-50"))
                .unwrap_or(name);
            stem_path.with_file_name(stripped)
        }
        None => stem_path.to_path_buf(),
    }
}
