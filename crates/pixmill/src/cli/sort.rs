//! The `pixmill sort` command: copy produced artifacts into the two
//! destination trees and report what is still missing.

use clap::Args;
use pixmill_core::classify;
use pixmill_core::Config;

/// Arguments for the `sort` command.
#[derive(Args, Debug, Default)]
pub struct SortArgs {
    /// Report the reconciliation result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Only report what has not been copied yet, without copying
    #[arg(long)]
    pub report_only: bool,
}

/// Execute the sort command.
pub fn execute(args: SortArgs, config: Config) -> anyhow::Result<()> {
    let out_root = config.output_root();
    let copy_root = config.copy_root();
    let store_root = config.store_root();

    let summary = if args.report_only {
        None
    } else {
        let summary = classify::sort_tree(&out_root, &copy_root, &store_root);
        tracing::info!(copied = summary.copied, failed = summary.failed, "sort pass done");
        Some(summary)
    };

    // Reconciliation runs against the trees as they are now, detecting
    // anything the copy pass (this one or an earlier one) did not land.
    let missing = classify::files_not_copied(&out_root, &copy_root, &store_root);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&missing)?);
    } else if missing.is_empty() {
        println!("All artifacts have reached their destinations.");
    } else {
        if !missing.copy_over.is_empty() {
            println!("Not yet in {}:", copy_root.display());
            for path in &missing.copy_over {
                println!("  {}", path.display());
            }
        }
        if !missing.store.is_empty() {
            println!("Not yet in {}:", store_root.display());
            for path in &missing.store {
                println!("  {}", path.display());
            }
        }
    }

    if let Some(summary) = summary {
        if summary.failed > 0 {
            anyhow::bail!("{} copy failure(s)", summary.failed);
        }
    }
    Ok(())
}
