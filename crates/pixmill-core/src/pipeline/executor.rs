//! Stage execution: threads one source file through a profile's chain.

use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::codec::ImageCodec;
use crate::error::{ConfigError, StageError, StageResult};
use crate::layout;

use super::stage::{
    Profile, StageSpec, TransformRecord, CROP_BOTTOM_ANCHOR, CROP_HEIGHT, CROP_WIDTH,
};

/// An ordered stage chain bound to one profile, ready to execute against
/// source files.
///
/// Execution is strictly sequential within one file; the first failing
/// stage short-circuits the rest (no codec calls, no filesystem I/O for
/// the remainder of the chain). Failures never cross file boundaries;
/// that isolation is the runner's contract, built on `execute` returning
/// rather than panicking.
pub struct Pipeline<C> {
    profile: Profile,
    out_root: PathBuf,
    codec: C,
}

impl<C: ImageCodec> Pipeline<C> {
    /// Bind a validated profile to an output root and codec.
    pub fn new(profile: Profile, out_root: PathBuf, codec: C) -> Result<Self, ConfigError> {
        profile.validate()?;
        Ok(Self {
            profile,
            out_root,
            codec,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    /// Run the full chain against one source file. Returns the artifact
    /// paths written, in persist order.
    pub fn execute(&self, source: &Path) -> StageResult<Vec<PathBuf>> {
        let mut record = self.prep(source)?;
        let mut written = Vec::new();
        for stage in &self.profile.stages {
            record = self.apply(*stage, record, source, &mut written)?;
        }
        tracing::debug!(
            source = %source.display(),
            artifacts = written.len(),
            "pipeline complete"
        );
        Ok(written)
    }

    /// Entry step: decode the source and derive its output location.
    fn prep(&self, source: &Path) -> StageResult<TransformRecord> {
        let output_dir = layout::output_dir(&self.out_root, &self.profile.base_input_dir, source)?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StageError::Decode {
                path: source.to_path_buf(),
                message: "filename has no valid UTF-8 stem".to_string(),
            })?
            .to_string();
        let image = self.codec.decode(source).map_err(|e| StageError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(TransformRecord {
            output_dir,
            stem,
            image,
            pending_encode: None,
        })
    }

    fn apply(
        &self,
        stage: StageSpec,
        mut record: TransformRecord,
        source: &Path,
        written: &mut Vec<PathBuf>,
    ) -> StageResult<TransformRecord> {
        match stage {
            StageSpec::Resize { width, height } => {
                record.image = self.codec.resize_contain(&record.image, width, height);
                Ok(record)
            }
            StageSpec::Crop => {
                let (width, height) = record.image.dimensions();
                let top = height
                    .checked_sub(CROP_BOTTOM_ANCHOR)
                    .ok_or_else(|| StageError::Crop {
                        path: source.to_path_buf(),
                        message: format!("source is {width}x{height}, shorter than {CROP_BOTTOM_ANCHOR}px"),
                    })?;
                let left = width
                    .checked_sub(CROP_WIDTH)
                    .ok_or_else(|| StageError::Crop {
                        path: source.to_path_buf(),
                        message: format!("source is {width}x{height}, narrower than {CROP_WIDTH}px"),
                    })?
                    / 2;
                record.image = self
                    .codec
                    .extract(&record.image, left, top, CROP_WIDTH, CROP_HEIGHT)
                    .map_err(|e| StageError::Crop {
                        path: source.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(record)
            }
            StageSpec::EncodeAs { format, quality } => {
                record.pending_encode = Some((format, quality));
                Ok(record)
            }
            StageSpec::Persist => {
                // Guaranteed by Profile::validate, but a broken chain must
                // not silently drop an artifact.
                let (format, quality) =
                    record.pending_encode.take().ok_or_else(|| StageError::Encode {
                        path: source.to_path_buf(),
                        message: "persist reached with no pending encode".to_string(),
                    })?;
                let bytes = self
                    .codec
                    .encode(&record.image, format, quality)
                    .map_err(|e| StageError::Encode {
                        path: source.to_path_buf(),
                        message: e.to_string(),
                    })?;
                std::fs::create_dir_all(&record.output_dir).map_err(|e| StageError::Write {
                    path: source.to_path_buf(),
                    message: format!("creating {}: {e}", record.output_dir.display()),
                })?;
                let artifact =
                    layout::artifact_path(&record.output_dir, &record.stem, quality, format);
                std::fs::write(&artifact, bytes).map_err(|e| StageError::Write {
                    path: source.to_path_buf(),
                    message: format!("writing {}: {e}", artifact.display()),
                })?;
                tracing::debug!(artifact = %artifact.display(), "wrote artifact");
                written.push(artifact);
                Ok(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RasterCodec;
    use crate::layout::{ArtifactFormat, Quality};
    use image::DynamicImage;
    use std::path::PathBuf;

    fn write_png(path: &Path, width: u32, height: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        DynamicImage::new_rgb8(width, height).save(path).unwrap();
    }

    fn pipeline(base: &Path, out: &Path, stages: Vec<StageSpec>) -> Pipeline<RasterCodec> {
        Pipeline::new(
            Profile {
                name: "test".to_string(),
                base_input_dir: base.to_path_buf(),
                stages,
            },
            out.to_path_buf(),
            RasterCodec,
        )
        .unwrap()
    }

    #[test]
    fn fan_out_produces_one_artifact_per_persist() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("Zone1").join("shot.png");
        write_png(&source, 640, 480);

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Jpeg,
                    quality: Quality::Lossy,
                },
                StageSpec::Persist,
            ],
        );
        let written = p.execute(&source).unwrap();
        assert_eq!(
            written,
            vec![
                out.join("Zone1").join("shot-FULL.png"),
                out.join("Zone1").join("shot-50.jpeg"),
            ]
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn full_chain_scenario() {
        // In/Zone1/shot.png (2400x1400) through crop -> webp-full ->
        // 720p -> webp-lossy -> jpeg-lossy.
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("Zone1").join("shot.png");
        write_png(&source, 2400, 1400);

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::Crop,
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Webp,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
                StageSpec::Resize {
                    width: 1280,
                    height: 720,
                },
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Webp,
                    quality: Quality::Lossy,
                },
                StageSpec::Persist,
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Jpeg,
                    quality: Quality::Lossy,
                },
                StageSpec::Persist,
            ],
        );
        let written = p.execute(&source).unwrap();
        assert_eq!(written.len(), 3);

        let full = out.join("Zone1").join("shot-FULL.webp");
        let lossy_webp = out.join("Zone1").join("shot-50.webp");
        let lossy_jpeg = out.join("Zone1").join("shot-50.jpeg");
        assert_eq!(image::image_dimensions(&full).unwrap(), (1920, 1080));
        assert_eq!(image::image_dimensions(&lossy_webp).unwrap(), (1280, 720));
        assert_eq!(image::image_dimensions(&lossy_jpeg).unwrap(), (1280, 720));
    }

    #[test]
    fn crop_rejects_undersized_sources_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("tiny.png");
        write_png(&source, 800, 600);

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::Crop,
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Webp,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        );
        let err = p.execute(&source).unwrap_err();
        assert!(matches!(err, StageError::Crop { .. }));
        // Short-circuit: the failed chain must not have persisted anything.
        assert!(!out.exists());
    }

    #[test]
    fn crop_top_is_anchored_above_the_bottom_edge() {
        // 2400x1400: top = 1400 - 1081 = 319, so the extraction covers
        // rows 319..1399, one pixel short of the bottom.
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("shot.png");

        // Paint the row at y=319 white to confirm it lands at the top of
        // the crop.
        let mut img = image::RgbImage::new(2400, 1400);
        for x in 0..2400 {
            img.put_pixel(x, 319, image::Rgb([255, 255, 255]));
        }
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        DynamicImage::ImageRgb8(img).save(&source).unwrap();

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::Crop,
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        );
        let written = p.execute(&source).unwrap();
        let cropped = image::open(&written[0]).unwrap().to_rgb8();
        assert_eq!(cropped.dimensions(), (1920, 1080));
        assert_eq!(cropped.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
        assert_eq!(cropped.get_pixel(0, 1), &image::Rgb([0, 0, 0]));
    }

    #[test]
    fn unreadable_source_dies_at_prep() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("junk.png");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(&source, b"not an image").unwrap();

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        );
        let err = p.execute(&source).unwrap_err();
        assert!(matches!(err, StageError::Decode { .. }));
    }

    #[test]
    fn source_outside_base_is_a_layout_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let stray = dir.path().join("Elsewhere").join("shot.png");
        write_png(&stray, 64, 64);

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        );
        let err = p.execute(&stray).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn persist_overwrites_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        let source = base.join("shot.png");
        write_png(&source, 64, 64);

        let p = pipeline(
            &base,
            &out,
            vec![
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        );
        p.execute(&source).unwrap();
        let first = std::fs::metadata(out.join("shot-FULL.png")).unwrap().len();
        p.execute(&source).unwrap();
        let second = std::fs::metadata(out.join("shot-FULL.png")).unwrap().len();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_chain_at_construction() {
        let result = Pipeline::new(
            Profile {
                name: "broken".to_string(),
                base_input_dir: PathBuf::from("In"),
                stages: vec![StageSpec::Persist],
            },
            PathBuf::from("Out"),
            RasterCodec,
        );
        assert!(result.is_err());
    }
}
