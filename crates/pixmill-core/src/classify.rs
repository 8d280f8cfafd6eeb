//! Artifact classification and the sort pass.
//!
//! Produced artifacts are partitioned by quality tag and copied into two
//! destination trees, with the tag stripped from the destination filename
//! and commas replaced by underscores for the downstream consumer. A
//! separate reconciliation report recomputes which artifacts have not yet
//! reached their destination, so partial-copy failures are visible.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::layout::{self, Quality};
use crate::pipeline::diff::DiffScanner;

/// Artifact paths (relative to the output root) partitioned by quality
/// tag. Untagged files land in neither bucket.
#[derive(Debug, Default, Serialize)]
pub struct Classified {
    /// `-50` artifacts, headed for the copy tree
    pub copy: Vec<PathBuf>,
    /// `-FULL` artifacts, headed for the store tree
    pub store: Vec<PathBuf>,
}

/// Result of one sort pass.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SortSummary {
    pub copied: usize,
    pub failed: usize,
}

/// Artifacts that have not reached their destination tree.
#[derive(Debug, Default, Serialize)]
pub struct NotCopied {
    /// `-50` artifacts missing from the copy tree
    pub copy_over: Vec<PathBuf>,
    /// `-FULL` artifacts missing from the store tree
    pub store: Vec<PathBuf>,
}

impl NotCopied {
    pub fn is_empty(&self) -> bool {
        self.copy_over.is_empty() && self.store.is_empty()
    }
}

/// Partition every artifact under `out_root` by quality tag.
pub fn classify(out_root: &Path) -> Classified {
    let mut classified = Classified::default();
    for file in DiffScanner::list_files(out_root) {
        let Ok(rel) = file.strip_prefix(out_root) else {
            continue;
        };
        let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match layout::quality_of(name) {
            Some(Quality::Lossy) => classified.copy.push(rel.to_path_buf()),
            Some(Quality::Full) => classified.store.push(rel.to_path_buf()),
            None => {}
        }
    }
    classified
}

/// The filename an artifact takes in its destination tree: quality tag
/// stripped, commas replaced with underscores.
pub fn destination_name(file_name: &str) -> String {
    layout::strip_quality_tag(file_name).replace(',', "_")
}

/// Copy one artifact into a destination tree, creating the destination
/// subdirectory if absent and silently overwriting an existing file.
/// Returns the destination path.
pub fn copy_artifact(out_root: &Path, dest_root: &Path, artifact_rel: &Path) -> Result<PathBuf> {
    let name = artifact_rel
        .file_name()
        .and_then(|n| n.to_str())
        .map(destination_name)
        .unwrap_or_default();
    let parent = artifact_rel.parent().unwrap_or(Path::new(""));
    let dest_dir = dest_root.join(parent);
    let dest = dest_dir.join(name);

    std::fs::create_dir_all(&dest_dir)?;
    std::fs::copy(out_root.join(artifact_rel), &dest)?;
    tracing::info!(
        from = %artifact_rel.display(),
        to = %dest.display(),
        "copied artifact"
    );
    Ok(dest)
}

/// Classify the whole output tree and copy each bucket into its
/// destination. Copy failures are logged and counted, not propagated, so
/// one bad file never stops the pass.
pub fn sort_tree(out_root: &Path, copy_root: &Path, store_root: &Path) -> SortSummary {
    let classified = classify(out_root);
    let mut summary = SortSummary::default();
    let batches = [
        (copy_root, classified.copy),
        (store_root, classified.store),
    ];
    for (dest_root, artifacts) in batches {
        for artifact in artifacts {
            match copy_artifact(out_root, dest_root, &artifact) {
                Ok(_) => summary.copied += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::error!(artifact = %artifact.display(), "copy failed: {err}");
                }
            }
        }
    }
    summary
}

/// Recompute which artifacts are missing from their destination trees by
/// directly diffing the output tree against each destination. Independent
/// of any copy pass that just ran.
pub fn files_not_copied(out_root: &Path, copy_root: &Path, store_root: &Path) -> NotCopied {
    let copy_dest = relative_set(copy_root);
    let store_dest = relative_set(store_root);

    let mut report = NotCopied::default();
    let classified = classify(out_root);
    for artifact in classified.copy {
        if !reached(&artifact, &copy_dest) {
            report.copy_over.push(artifact);
        }
    }
    for artifact in classified.store {
        if !reached(&artifact, &store_dest) {
            report.store.push(artifact);
        }
    }
    report
}

fn relative_set(root: &Path) -> HashSet<PathBuf> {
    DiffScanner::list_files(root)
        .iter()
        .filter_map(|p| p.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .collect()
}

fn reached(artifact_rel: &Path, dest: &HashSet<PathBuf>) -> bool {
    let Some(name) = artifact_rel.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let expected = artifact_rel
        .parent()
        .unwrap_or(Path::new(""))
        .join(destination_name(name));
    dest.contains(&expected)
}
