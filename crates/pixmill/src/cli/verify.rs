//! The `pixmill verify` command: audit the output tree for completeness
//! and dimensional correctness.

use std::path::PathBuf;

use clap::Args;
use pixmill_core::verify::{self, DimensionIssue};
use pixmill_core::{Config, RasterCodec};
use serde::Serialize;

/// Arguments for the `verify` command.
#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Profile whose sources to audit (all profiles when omitted)
    pub profile: Option<String>,

    /// Report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Sources with no artifacts, per profile.
#[derive(Debug, Serialize)]
struct ProfileReport {
    profile: String,
    not_converted: Vec<PathBuf>,
}

/// Combined audit output.
#[derive(Debug, Serialize)]
struct VerifyReport {
    profiles: Vec<ProfileReport>,
    dimension_issues: Vec<DimensionIssue>,
}

/// Execute the verify command.
pub fn execute(args: VerifyArgs, config: Config) -> anyhow::Result<()> {
    let out_root = config.output_root();

    let profiles = match &args.profile {
        Some(name) => vec![config
            .profile(name)
            .ok_or_else(|| anyhow::anyhow!("unknown profile '{name}'"))?],
        None => config.resolved_profiles(),
    };

    let report = VerifyReport {
        profiles: profiles
            .iter()
            .map(|profile| ProfileReport {
                profile: profile.name.clone(),
                not_converted: verify::files_not_converted(&profile.base_input_dir, &out_root),
            })
            .collect(),
        dimension_issues: verify::files_not_full_hd(&RasterCodec, &out_root),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for profile in &report.profiles {
        if profile.not_converted.is_empty() {
            println!("Profile '{}': all sources converted.", profile.profile);
        } else {
            println!(
                "Profile '{}': {} source(s) not converted:",
                profile.profile,
                profile.not_converted.len()
            );
            for path in &profile.not_converted {
                println!("  {}", path.display());
            }
        }
    }

    if report.dimension_issues.is_empty() {
        println!("All tagged artifacts match their expected dimensions.");
    } else {
        println!("{} dimension issue(s):", report.dimension_issues.len());
        for issue in &report.dimension_issues {
            match issue {
                DimensionIssue::Mismatch {
                    path,
                    width,
                    height,
                    expected_width,
                    expected_height,
                } => println!(
                    "  {} is {width}x{height}, expected {expected_width}x{expected_height}",
                    path.display()
                ),
                DimensionIssue::Unreadable { path, message } => {
                    println!("  {} could not be read: {message}", path.display())
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_args_default_audits_all_profiles() {
        let args = VerifyArgs::default();
        assert!(args.profile.is_none());
        assert!(!args.json);
    }
}
