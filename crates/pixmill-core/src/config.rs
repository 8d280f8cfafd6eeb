//! Configuration management for pixmill.
//!
//! Configuration is loaded from the platform config directory with
//! sensible defaults; every section is optional in the file. The three
//! stock profiles are part of the defaults and can be replaced wholesale
//! by a `[[profiles]]` list in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::{ArtifactFormat, Quality};
use crate::pipeline::stage::{Profile, StageSpec};

/// Root configuration structure for pixmill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output tree settings
    pub output: OutputConfig,

    /// Destination trees for the sort pass
    pub destinations: DestinationsConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Transform profiles. Defaults to the three stock profiles.
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            destinations: DestinationsConfig::default(),
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
            profiles: default_profiles(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// `~/.pixmill/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "pixmill", "pixmill")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pixmill").join("config.toml")
            })
    }

    /// Reject configurations whose profiles could not run: duplicate
    /// names or illegal stage chains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..index].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::Validation(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        Ok(())
    }

    /// The output tree root, tilde-expanded.
    pub fn output_root(&self) -> PathBuf {
        expand_path(&self.output.root)
    }

    /// The lossy-artifact destination tree, tilde-expanded.
    pub fn copy_root(&self) -> PathBuf {
        expand_path(&self.destinations.copy_root)
    }

    /// The full-quality destination tree, tilde-expanded.
    pub fn store_root(&self) -> PathBuf {
        expand_path(&self.destinations.store_root)
    }

    /// Profiles with their base directories tilde-expanded.
    pub fn resolved_profiles(&self) -> Vec<Profile> {
        self.profiles
            .iter()
            .map(|p| Profile {
                name: p.name.clone(),
                base_input_dir: expand_path(&p.base_input_dir),
                stages: p.stages.clone(),
            })
            .collect()
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Option<Profile> {
        self.resolved_profiles().into_iter().find(|p| p.name == name)
    }

    /// Resolve the worker-pool size: the configured count, or available
    /// parallelism when the setting is 0.
    pub fn workers(&self) -> usize {
        if self.processing.workers > 0 {
            self.processing.workers
        } else {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4)
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Output tree settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the mirrored output tree
    pub root: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Out"),
        }
    }
}

/// Destination trees for the sort pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
    /// Where `-50` artifacts are copied
    pub copy_root: PathBuf,

    /// Where `-FULL` artifacts are copied
    pub store_root: PathBuf,
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self {
            copy_root: PathBuf::from("CopyOver"),
            store_root: PathBuf::from("Store"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker-pool size. 0 means available parallelism.
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// The three stock profiles.
fn default_profiles() -> Vec<Profile> {
    let lossy_tail = [
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
    ];

    let mut mine = vec![
        StageSpec::Crop,
        StageSpec::EncodeAs {
            format: ArtifactFormat::Webp,
            quality: Quality::Full,
        },
        StageSpec::Persist,
    ];
    mine.extend(lossy_tail);

    let mut aurides = vec![
        StageSpec::EncodeAs {
            format: ArtifactFormat::Png,
            quality: Quality::Full,
        },
        StageSpec::Persist,
    ];
    aurides.extend(lossy_tail);

    let mut kys = vec![
        StageSpec::Resize {
            width: 1920,
            height: 1080,
        },
        StageSpec::EncodeAs {
            format: ArtifactFormat::Webp,
            quality: Quality::Full,
        },
        StageSpec::Persist,
    ];
    kys.extend(lossy_tail);

    vec![
        Profile {
            name: "mine".to_string(),
            base_input_dir: PathBuf::from("In"),
            stages: mine,
        },
        Profile {
            name: "aurides".to_string(),
            base_input_dir: PathBuf::from("Auride's"),
            stages: aurides,
        },
        Profile {
            name: "kys".to_string(),
            base_input_dir: PathBuf::from("Ky's"),
            stages: kys,
        },
    ]
}
