//! # Configuration
//!
//! Settings for a [`Scene`](crate::scene::Scene): logging level, slot
//! capacities and growth policy, and the clip planes given to new cameras.
//!
//! Configurations are plain serde structs. The [`Config`] trait loads and
//! saves them as TOML or RON, picking the format from the file extension.

use serde::{Deserialize, Serialize};

use crate::render::{DEFAULT_FAR, DEFAULT_NEAR};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What a full slot array does on the next allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotGrowth {
    /// Double the capacity
    Grow,
    /// Refuse the allocation
    Fixed,
}

/// # Slot Configuration
///
/// Initial capacities of the scene's node, model and animation slot arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Initial number of node slots
    pub node_capacity: usize,
    /// Initial number of model slots
    pub model_capacity: usize,
    /// Initial number of animation list slots
    pub animation_capacity: usize,
    /// Behavior once a slot array is full
    pub growth: SlotGrowth,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            node_capacity: 64,
            model_capacity: 16,
            animation_capacity: 16,
            growth: SlotGrowth::Grow,
        }
    }
}

impl SlotConfig {
    /// Fixed-size slot arrays
    pub fn fixed(nodes: usize, models: usize, animations: usize) -> Self {
        Self {
            node_capacity: nodes,
            model_capacity: models,
            animation_capacity: animations,
            growth: SlotGrowth::Fixed,
        }
    }

    /// Validate slot capacities
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A growing array must be able to double
        if self.growth == SlotGrowth::Grow
            && (self.node_capacity == 0 || self.model_capacity == 0 || self.animation_capacity == 0)
        {
            return Err(ConfigError::Invalid(
                "growable slot arrays need a non-zero capacity".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clip planes given to cameras created from this configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDefaults {
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl CameraDefaults {
    /// Validate the clip range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far (near = {}, far = {})",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Default log filter, e.g. `"info"`
    pub log_level: String,
    /// Slot array sizing
    pub slots: SlotConfig,
    /// Camera clip planes
    pub camera_defaults: CameraDefaults,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            slots: SlotConfig::default(),
            camera_defaults: CameraDefaults::default(),
        }
    }
}

impl SceneConfig {
    /// Replace the slot configuration
    pub fn with_slots(mut self, slots: SlotConfig) -> Self {
        self.slots = slots;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown log level `{}`",
                self.log_level
            )));
        }
        self.slots.validate()?;
        self.camera_defaults.validate()
    }
}

impl Config for SceneConfig {}
