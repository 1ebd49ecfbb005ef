//! Configuration system
//!
//! Every tunable of the spatial structures lives in [`SpatialConfig`], which
//! round-trips through TOML or RON files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};
use crate::foundation::math::Vec3;
use crate::geometry::AABB;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> std::result::Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> std::result::Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
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
}

/// Tuning of the dynamic bounding-volume tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicTreeConfig {
    /// Distance leaf bounds are fattened by on every side
    pub margin: f32,

    /// Scale applied to a move's displacement when stretching the new bounds
    pub displacement_multiplier: f32,

    /// Arena slots allocated on first insert
    pub initial_capacity: usize,
}

impl Default for DynamicTreeConfig {
    fn default() -> Self {
        Self {
            margin: 0.1,
            displacement_multiplier: 2.0,
            initial_capacity: 16,
        }
    }
}

impl DynamicTreeConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if !(self.margin > 0.0 && self.margin.is_finite()) {
            return Err(SpatialError::InvalidConfig(format!("margin must be positive, got {}", self.margin)));
        }
        if !(self.displacement_multiplier >= 0.0 && self.displacement_multiplier.is_finite()) {
            return Err(SpatialError::InvalidConfig(format!(
                "displacement_multiplier must not be negative, got {}",
                self.displacement_multiplier
            )));
        }
        if self.initial_capacity == 0 {
            return Err(SpatialError::InvalidConfig("initial_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Tuning of a bare partition tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Deepest level a node may be expanded to (root is depth 0)
    pub max_depth: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl PartitionConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(SpatialError::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Tuning of a scene collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Initial root bounds; grown on demand
    pub bounds: AABB,

    /// Deepest level items are pushed down to
    pub max_depth: u32,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            bounds: AABB::new(Vec3::repeat(-100.0), Vec3::repeat(100.0)),
            max_depth: 6,
        }
    }
}

impl CollectionConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if !(self.bounds.min.iter().chain(self.bounds.max.iter()).all(|v| v.is_finite())) {
            return Err(SpatialError::InvalidConfig(format!(
                "collection bounds must be finite, got {:?}",
                self.bounds
            )));
        }
        let size = self.bounds.size();
        if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
            return Err(SpatialError::InvalidConfig(format!(
                "collection bounds must have positive volume, got {:?}",
                self.bounds
            )));
        }
        if self.max_depth == 0 {
            return Err(SpatialError::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration of every spatial structure
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Dynamic bounding-volume tree settings
    pub dynamic_tree: DynamicTreeConfig,

    /// Partition tree settings
    pub partition: PartitionConfig,

    /// Scene collection settings
    pub collection: CollectionConfig,
}

impl Config for SpatialConfig {}

impl SpatialConfig {
    /// Reject out-of-range values in any section
    pub fn validate(&self) -> Result<()> {
        self.dynamic_tree.validate()?;
        self.partition.validate()?;
        self.collection.validate()
    }

    /// Load from a file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spatial_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(SpatialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SpatialConfig::default();
        config.dynamic_tree.margin = 0.0;
        assert!(matches!(config.validate(), Err(SpatialError::InvalidConfig(_))));

        let mut config = SpatialConfig::default();
        config.partition.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = SpatialConfig::default();
        config.collection.bounds = AABB::new(Vec3::repeat(1.0), Vec3::repeat(-1.0));
        assert!(config.validate().is_err());

        config.collection.bounds = AABB::new(Vec3::repeat(-1.0), Vec3::new(f32::INFINITY, 1.0, 1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let path = scratch_path("config.toml");
        let mut config = SpatialConfig::default();
        config.dynamic_tree.margin = 0.5;
        config.collection.max_depth = 3;

        config.save_to_file(&path).unwrap();
        let loaded = SpatialConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let path = scratch_path("partial.ron");
        std::fs::write(&path, "(partition: (max_depth: 4))").unwrap();
        let loaded = SpatialConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.partition.max_depth, 4);
        assert_eq!(loaded.dynamic_tree, DynamicTreeConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SpatialConfig::default().save_to_file(scratch_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
