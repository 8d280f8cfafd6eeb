//! The incremental transformation pipeline.
//!
//! - **stage**: declarative stage descriptors and profile definitions
//! - **executor**: threads one source file through a profile's chain
//! - **diff**: decides which source files still need processing

pub mod diff;
pub mod executor;
pub mod stage;

// Re-exports for convenient access
pub use diff::DiffScanner;
pub use executor::Pipeline;
pub use stage::{Profile, StageSpec, TransformRecord};
