//! Command handlers for the pixmill CLI.

pub mod config;
pub mod process;
pub mod sort;
pub mod verify;
