//! The naming and layout contract tying source paths, artifact paths, and
//! classification together.
//!
//! An artifact lives at `{output_dir}/{stem}-{tag}.{ext}` where the tag is
//! `FULL` for full quality and the decimal quality value otherwise, and
//! `output_dir` mirrors the source file's directory under the output root.
//! The classifier and verifier parse the tag back out of filenames, so the
//! formatting here is load-bearing: no stage may produce a stem ending in
//! the literal `-50` or `-FULL`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// The two quality levels artifacts are produced at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Quality 100, tagged `FULL`
    Full,
    /// Quality 50, tagged `50`
    Lossy,
}

impl Quality {
    /// Numeric quality value passed to the encoder.
    pub fn value(self) -> u8 {
        match self {
            Quality::Full => 100,
            Quality::Lossy => 50,
        }
    }

    /// Filename tag. `FULL` for quality 100, the decimal value otherwise.
    pub fn tag(self) -> &'static str {
        match self {
            Quality::Full => "FULL",
            Quality::Lossy => "50",
        }
    }
}

/// Encoded artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Jpeg,
    Webp,
    Png,
}

impl ArtifactFormat {
    /// The file extension artifacts of this format carry.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Jpeg => "jpeg",
            ArtifactFormat::Webp => "webp",
            ArtifactFormat::Png => "png",
        }
    }
}

/// Map a source file to its output directory: strip the base input prefix
/// from the source's directory and re-root it under `out_root`.
///
/// A source outside `base_input_dir` means the run is misconfigured; the
/// resulting [`StageError::Layout`] is treated as fatal by the runner.
pub fn output_dir(
    out_root: &Path,
    base_input_dir: &Path,
    source: &Path,
) -> Result<PathBuf, StageError> {
    let dir = source.parent().unwrap_or(Path::new(""));
    let rel = dir
        .strip_prefix(base_input_dir)
        .map_err(|_| StageError::Layout {
            path: source.to_path_buf(),
            base: base_input_dir.to_path_buf(),
        })?;
    Ok(out_root.join(rel))
}

/// Render the artifact path for a (stem, quality, format) combination.
pub fn artifact_path(
    output_dir: &Path,
    stem: &str,
    quality: Quality,
    format: ArtifactFormat,
) -> PathBuf {
    output_dir.join(format!(
        "{stem}-{}.{}",
        quality.tag(),
        format.extension()
    ))
}

/// Remove a trailing `-50` or `-FULL` from a filename's stem, leaving the
/// extension in place. The inverse of [`artifact_path`]'s tag formatting.
/// Filenames without a tag pass through unchanged.
pub fn strip_quality_tag(filename: &str) -> String {
    let (stem, ext) = split_extension(filename);
    let stripped = stem
        .strip_suffix("-FULL")
        .or_else(|| stem.strip_suffix("-50"))
        .unwrap_or(stem);
    match ext {
        Some(ext) => format!("{stripped}.{ext}"),
        None => stripped.to_string(),
    }
}

/// Classify a filename by its quality tag. Returns `None` for files that
/// carry neither tag, so a file can match at most one bucket.
pub fn quality_of(filename: &str) -> Option<Quality> {
    let (stem, _) = split_extension(filename);
    if stem.ends_with("-FULL") {
        Some(Quality::Full)
    } else if stem.ends_with("-50") {
        Some(Quality::Lossy)
    } else {
        None
    }
}

fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], Some(&filename[dot + 1..])),
        _ => (filename, None),
    }
}
