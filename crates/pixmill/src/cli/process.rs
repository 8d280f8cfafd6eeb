//! The `pixmill process` command: run profile pipelines over pending
//! (or explicitly named) source files.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use pixmill_core::{Config, Pipeline, RasterCodec, RunSummary, Runner};

/// Arguments for the `process` command.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Profile to run (all profiles when omitted)
    pub profile: Option<String>,

    /// Specific files to (re)process, relative to the profile's base
    /// directory. Bypasses the incremental skip.
    #[arg(short, long, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// List pending files without processing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel workers (0 = use configuration)
    #[arg(short, long, default_value = "0")]
    pub workers: usize,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    if !args.files.is_empty() && args.profile.is_none() {
        anyhow::bail!("--files requires a profile name");
    }

    let profiles = match &args.profile {
        Some(name) => vec![config
            .profile(name)
            .ok_or_else(|| anyhow::anyhow!("unknown profile '{name}'"))?],
        None => config.resolved_profiles(),
    };
    let workers = if args.workers > 0 {
        args.workers
    } else {
        config.workers()
    };

    let start = std::time::Instant::now();
    let mut total = RunSummary::default();

    for profile in profiles {
        let name = profile.name.clone();
        let pipeline = Pipeline::new(profile, config.output_root(), RasterCodec)?;
        let runner = Runner::new(pipeline, workers);

        let files = if args.files.is_empty() {
            runner.pending()
        } else {
            runner.expand_explicit(&args.files)
        };

        if args.dry_run {
            println!("Profile '{name}': {} file(s) to process", files.len());
            for file in &files {
                println!("  {}", file.display());
            }
            continue;
        }

        if files.is_empty() {
            tracing::info!("Profile '{name}': nothing to process");
            continue;
        }
        tracing::info!("Profile '{name}': {} file(s) to process", files.len());

        let progress = create_progress_bar(files.len() as u64);
        let summary = runner
            .process(files, |path, result| {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    let label = if result.is_err() {
                        format!("failed: {name}")
                    } else {
                        name.to_string()
                    };
                    progress.set_message(label);
                }
                progress.inc(1);
            })
            .await?;
        progress.finish_and_clear();

        total.absorb(summary);
    }

    if !args.dry_run {
        print_summary(&total, start.elapsed());
        if total.failed > 0 {
            anyhow::bail!("completed with {} per-file failure(s)", total.failed);
        }
    }
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(summary: &RunSummary, elapsed: Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.processed as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Processed:    {:>8}", summary.processed);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("    Artifacts:    {:>8}", summary.artifacts);
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmill_core::{ArtifactFormat, Profile, Quality, StageSpec};

    #[test]
    fn process_args_default_workers_defer_to_config() {
        let args = ProcessArgs::default();
        assert_eq!(args.workers, 0);
    }

    #[test]
    fn process_args_default_is_not_dry_run() {
        let args = ProcessArgs::default();
        assert!(!args.dry_run);
        assert!(args.files.is_empty());
        assert!(args.profile.is_none());
    }

    fn test_config(base: PathBuf, out: PathBuf) -> Config {
        let mut config = Config::default();
        config.output.root = out;
        config.profiles = vec![Profile {
            name: "test".to_string(),
            base_input_dir: base,
            stages: vec![
                StageSpec::EncodeAs {
                    format: ArtifactFormat::Png,
                    quality: Quality::Full,
                },
                StageSpec::Persist,
            ],
        }];
        config
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("shot.png"), b"").unwrap();

        let args = ProcessArgs {
            dry_run: true,
            ..ProcessArgs::default()
        };
        execute(args, test_config(base, out.clone())).await.unwrap();
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn empty_base_is_a_clean_run() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("In");
        let out = dir.path().join("Out");
        std::fs::create_dir_all(&base).unwrap();

        execute(ProcessArgs::default(), test_config(base, out)).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProcessArgs {
            profile: Some("nope".to_string()),
            ..ProcessArgs::default()
        };
        let config = test_config(dir.path().join("In"), dir.path().join("Out"));
        assert!(execute(args, config).await.is_err());
    }

    #[tokio::test]
    async fn explicit_files_require_a_profile() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProcessArgs {
            files: vec![PathBuf::from("shot.png")],
            ..ProcessArgs::default()
        };
        let config = test_config(dir.path().join("In"), dir.path().join("Out"));
        assert!(execute(args, config).await.is_err());
    }
}
