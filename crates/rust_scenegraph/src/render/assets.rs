//! Asset loading seam used by the scene text format
//!
//! Parsing model and animation files is the rendering API's business; the
//! scene loader only needs something that turns a path into a resource.

use super::{AnimationList, Model};
use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but could not be decoded
    #[error("Failed to load asset {path}: {reason}")]
    LoadFailed {
        /// Path of the asset
        path: String,
        /// Loader-specific description
        reason: String,
    },

    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),
}

/// Loads models and animation lists by path
pub trait AssetLoader {
    /// Load a model file
    fn load_model(&mut self, path: &str) -> Result<Model, AssetError>;

    /// Load every animation clip stored in a file
    fn load_animations(&mut self, path: &str) -> Result<AnimationList, AssetError>;
}
