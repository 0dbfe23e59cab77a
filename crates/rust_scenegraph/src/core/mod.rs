//! # Core Module
//!
//! Shared configuration used by the scene container and the demo binary.

pub mod config;

pub use config::{CameraDefaults, Config, ConfigError, SceneConfig, SlotConfig, SlotGrowth};
