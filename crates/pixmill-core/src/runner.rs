//! Batch orchestration: pending-set resolution and the bounded worker
//! pool that drives per-file pipelines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::codec::ImageCodec;
use crate::error::{PixmillError, Result, StageResult};
use crate::pipeline::diff::DiffScanner;
use crate::pipeline::executor::Pipeline;

/// Aggregated result of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files fully processed
    pub processed: usize,
    /// Files whose pipeline died on a stage failure
    pub failed: usize,
    /// Artifacts written across all files
    pub artifacts: usize,
}

impl RunSummary {
    /// Fold another summary in (multi-profile runs).
    pub fn absorb(&mut self, other: RunSummary) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.artifacts += other.artifacts;
    }
}

/// Drives one profile's pipeline over a batch of files.
///
/// Per-file work is independent; pipelines run on the blocking pool with
/// at most `workers` in flight. One file's failure is logged and counted,
/// never propagated to sibling files. The only errors that abort the run
/// are fatal ones (a source outside the profile base, meaning the run is
/// misconfigured).
pub struct Runner<C: ImageCodec + 'static> {
    pipeline: Arc<Pipeline<C>>,
    workers: usize,
}

impl<C: ImageCodec + 'static> Runner<C> {
    pub fn new(pipeline: Pipeline<C>, workers: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
        }
    }

    /// Source files with no artifact yet in the output tree.
    pub fn pending(&self) -> Vec<PathBuf> {
        DiffScanner::pending(
            &self.pipeline.profile().base_input_dir,
            self.pipeline.out_root(),
        )
    }

    /// Join explicitly requested files under the profile base. Explicit
    /// files bypass the diff: they are always (re)processed.
    pub fn expand_explicit(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|f| self.pipeline.profile().base_input_dir.join(f))
            .collect()
    }

    /// Run the profile: the explicit file list when given (force
    /// reprocess), the pending set otherwise.
    pub async fn run(&self, explicit: Option<Vec<PathBuf>>) -> Result<RunSummary> {
        let files = match explicit {
            Some(files) => self.expand_explicit(&files),
            None => self.pending(),
        };
        self.process(files, |_, _| {}).await
    }

    /// Run the pipeline over the given files, invoking `on_done` as each
    /// file completes (in completion order, not submission order).
    pub async fn process<F>(&self, files: Vec<PathBuf>, mut on_done: F) -> Result<RunSummary>
    where
        F: FnMut(&Path, &StageResult<Vec<PathBuf>>),
    {
        tracing::info!(
            profile = %self.pipeline.profile().name,
            files = files.len(),
            workers = self.workers,
            "starting batch"
        );

        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        for path in files {
            while tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    Self::tally(joined, &mut summary, &mut on_done)?;
                }
            }
            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn_blocking(move || {
                let result = pipeline.execute(&path);
                (path, result)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            Self::tally(joined, &mut summary, &mut on_done)?;
        }

        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            artifacts = summary.artifacts,
            "batch complete"
        );
        Ok(summary)
    }

    fn tally<F>(
        joined: std::result::Result<(PathBuf, StageResult<Vec<PathBuf>>), JoinError>,
        summary: &mut RunSummary,
        on_done: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&Path, &StageResult<Vec<PathBuf>>),
    {
        match joined {
            Ok((path, result)) => {
                on_done(&path, &result);
                match result {
                    Ok(artifacts) => {
                        summary.processed += 1;
                        summary.artifacts += artifacts.len();
                    }
                    Err(err) if err.is_fatal() => return Err(PixmillError::Stage(err)),
                    Err(err) => {
                        summary.failed += 1;
                        tracing::error!("{err}");
                    }
                }
            }
            Err(join_err) => {
                summary.failed += 1;
                tracing::error!("pipeline task failed: {join_err}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RasterCodec;
    use crate::layout::{ArtifactFormat, Quality};
    use crate::pipeline::stage::{Profile, StageSpec};
    use image::DynamicImage;

    fn write_png(path: &Path, width: u32, height: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        DynamicImage::new_rgb8(width, height).save(path).unwrap();
    }

    fn runner(base: &Path, out: &Path, stages: Vec<StageSpec>) -> Runner<RasterCodec> {
        let pipeline = Pipeline::new(
            Profile {
                name: "test".to_string(),
                base_input_dir: base.to_path_buf(),
                stages,
            },
            out.to_path_buf(),
            RasterCodec,
        )
        .unwrap();
        Runner::new(pipeline, 2)
    }

    fn png_full_chain() -> Vec<StageSpec> {
        vec![
            StageSpec::EncodeAs {
                format: ArtifactFormat::Png,
                quality: Quality::Full,
            },
            StageSpec::Persist,
        ]
    }

    #[tokio::test]
    async fn one_bad_file_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        write_png(&base.join("a.png"), 32, 32);
        write_png(&base.join("b.png"), 32, 32);
        write_png(&base.join("sub/c.png"), 32, 32);
        std::fs::write(base.join("broken.png"), b"garbage").unwrap();

        let summary = runner(&base, &out, png_full_chain()).run(None).await.unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.artifacts, 3);
        assert!(out.join("a-FULL.png").exists());
        assert!(out.join("b-FULL.png").exists());
        assert!(out.join("sub/c-FULL.png").exists());
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        write_png(&base.join("a.png"), 32, 32);

        let r = runner(&base, &out, png_full_chain());
        let first = r.run(None).await.unwrap();
        assert_eq!(first.processed, 1);

        let second = r.run(None).await.unwrap();
        assert_eq!(second, RunSummary::default());
    }

    #[tokio::test]
    async fn explicit_files_force_reprocessing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        write_png(&base.join("a.png"), 32, 32);

        let r = runner(&base, &out, png_full_chain());
        r.run(None).await.unwrap();

        // The diff would skip this file; the explicit list must not.
        let forced = r.run(Some(vec![PathBuf::from("a.png")])).await.unwrap();
        assert_eq!(forced.processed, 1);
    }

    #[tokio::test]
    async fn stray_source_aborts_as_misconfiguration() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        std::fs::create_dir_all(&base).unwrap();
        let stray = dir.path().join("stray.png");
        write_png(&stray, 32, 32);

        let r = runner(&base, &out, png_full_chain());
        let err = r.process(vec![stray], |_, _| {}).await.unwrap_err();
        assert!(matches!(err, PixmillError::Stage(_)));
    }

    #[tokio::test]
    async fn completion_callback_sees_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        for name in ["a.png", "b.png", "c.png"] {
            write_png(&base.join(name), 16, 16);
        }

        let r = runner(&base, &out, png_full_chain());
        let files = r.pending();
        let mut seen = 0usize;
        r.process(files, |_, result| {
            assert!(result.is_ok());
            seen += 1;
        })
        .await
        .unwrap();
        assert_eq!(seen, 3);
    }
}
