//! pixmill core - incremental batch screenshot transformation.
//!
//! pixmill scans a tree of source images, decides which ones have not yet
//! been transformed, and runs each missing one through a profile-specific
//! chain of stages (crop, resize, re-encode) producing derived artifacts
//! in a mirrored output tree. The output tree is the only durable state:
//! an artifact on disk is both the result and the "already processed"
//! marker.
//!
//! # Architecture
//!
//! ```text
//! diff (pending set) → runner (worker pool) → pipeline stages → Out/
//!                                                                 │
//!                        classify/sort  ←───────────────────────┤
//!                        verify (audits) ←──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixmill_core::{Config, Pipeline, RasterCodec, Runner};
//!
//! #[tokio::main]
//! async fn main() -> pixmill_core::Result<()> {
//!     let config = Config::load()?;
//!     let profile = config.profile("mine").expect("known profile");
//!     let pipeline = Pipeline::new(profile, config.output_root(), RasterCodec)?;
//!     let summary = Runner::new(pipeline, config.workers()).run(None).await?;
//!     println!("{} processed, {} failed", summary.processed, summary.failed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod runner;
pub mod verify;

// Re-exports for convenient access
pub use codec::{CodecError, ImageCodec, RasterCodec};
pub use config::Config;
pub use error::{ConfigError, PixmillError, Result, StageError, StageResult};
pub use layout::{ArtifactFormat, Quality};
pub use pipeline::{DiffScanner, Pipeline, Profile, StageSpec};
pub use runner::{RunSummary, Runner};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
