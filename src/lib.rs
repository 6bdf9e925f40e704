//! Island cropping library
//!
//! Cuts named islands out of a world map image and makes the surrounding
//! ocean transparent. Re-exports modules for use by the binary and tools.

pub mod background;
pub mod config;
pub mod crop;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod regions;
pub mod smoothing;

pub use config::CropConfig;
pub use error::CropError;
pub use pipeline::{run, RegionOutcome, RunReport};
