//! Declarative stage descriptors and profile definitions.
//!
//! A profile binds a base input directory to an ordered stage chain. The
//! chain is data, not code: the executor interprets [`StageSpec`] values,
//! so chains can be declared in configuration and inspected in tests.

use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::{ArtifactFormat, Quality};

/// Fixed extraction geometry applied by [`StageSpec::Crop`]: a 1920x1080
/// region horizontally centered and vertically anchored one pixel above
/// the bottom edge (`top = height - 1081`).
pub const CROP_WIDTH: u32 = 1920;
pub const CROP_HEIGHT: u32 = 1080;
pub const CROP_BOTTOM_ANCHOR: u32 = 1081;

/// One operation in a transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum StageSpec {
    /// Scale to fit within the bounds, letterboxing to exactly
    /// `width`x`height`.
    Resize { width: u32, height: u32 },

    /// The fixed bottom-anchored 1920x1080 extraction.
    Crop,

    /// Bind the pending encode target. No I/O; a later [`StageSpec::Persist`]
    /// consumes it. Several encode/persist pairs against one decode fan
    /// out multiple artifacts.
    EncodeAs {
        format: ArtifactFormat,
        quality: Quality,
    },

    /// Encode the current image per the pending target and write it to the
    /// artifact path.
    Persist,
}

/// A named binding of a base input directory to a stage chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub base_input_dir: PathBuf,
    pub stages: Vec<StageSpec>,
}

impl Profile {
    /// Check chain legality: every persist must consume a pending encode,
    /// and every encode must eventually be persisted. Violations are
    /// configuration errors, caught before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::Validation(format!(
                "profile '{}' has an empty stage chain",
                self.name
            )));
        }
        let mut pending = false;
        for (index, stage) in self.stages.iter().enumerate() {
            match stage {
                StageSpec::EncodeAs { .. } => {
                    if pending {
                        return Err(ConfigError::Validation(format!(
                            "profile '{}', stage {index}: encode overwrites an unpersisted encode",
                            self.name
                        )));
                    }
                    pending = true;
                }
                StageSpec::Persist => {
                    if !pending {
                        return Err(ConfigError::Validation(format!(
                            "profile '{}', stage {index}: persist without a preceding encode",
                            self.name
                        )));
                    }
                    pending = false;
                }
                StageSpec::Resize { width, height } => {
                    if *width == 0 || *height == 0 {
                        return Err(ConfigError::Validation(format!(
                            "profile '{}', stage {index}: resize target must be non-zero",
                            self.name
                        )));
                    }
                }
                StageSpec::Crop => {}
            }
        }
        if pending {
            return Err(ConfigError::Validation(format!(
                "profile '{}': trailing encode is never persisted",
                self.name
            )));
        }
        Ok(())
    }
}

/// The unit threaded through stage execution: where output goes, what the
/// file is called, the decoded image being transformed, and the encode
/// target bound by the last `EncodeAs`.
///
/// Failure is not represented here: a failed stage returns `Err` and the
/// executor short-circuits, so a record in hand is always live.
pub struct TransformRecord {
    pub output_dir: PathBuf,
    pub stem: String,
    pub image: DynamicImage,
    pub pending_encode: Option<(ArtifactFormat, Quality)>,
}
