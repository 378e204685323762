//! Configuration loading and validation.
//!
//! Configuration lives in `./config/casetriage.toml`. The default file is
//! embedded in the binary so `casetriage init` can materialize it and a
//! missing file falls back to the embedded defaults instead of failing.
//! Values are validated after parsing; a config that parses but asks for an
//! out-of-range threshold or a zero-width pool is rejected up front.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Where the config file is expected, relative to the working directory.
pub const CONFIG_PATH: &str = "./config/casetriage.toml";

/// Embedded default configuration, written out by `init`.
pub const DEFAULT_CONFIG: &str = include_str!("../config/casetriage.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config value out of range: {0} must be between 0.0 and 1.0, got {1}")]
    OutOfRange(&'static str, f64),

    #[error("Config value must be nonzero: {0}")]
    ZeroValue(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalConfig {
    /// Similarity ratio a normalized label must reach to resolve to an
    /// existing canonical binding.
    pub similarity_threshold: f64,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellingConfig {
    /// Path to the "term count" dictionary file. Empty disables correction.
    pub dictionary_path: String,
    pub max_edit_distance: usize,
}

impl Default for SpellingConfig {
    fn default() -> Self {
        Self {
            dictionary_path: String::new(),
            max_edit_distance: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimension: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Neighbors requested per test case, capped at the group size.
    pub max_neighbors: usize,
    /// Word-overlap score at or above which a pair is marked contained.
    pub jaccard_threshold: f64,
    /// Metadata fields skipped when diffing a candidate pair.
    pub excluded_fields: Vec<String>,
    /// Metadata field whose one-sided absence triggers the containment check.
    pub containment_field: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            max_neighbors: crate::matcher::MAX_NEIGHBORS,
            jaccard_threshold: crate::containment::DEFAULT_JACCARD_THRESHOLD,
            excluded_fields: crate::comparator::DEFAULT_EXCLUDED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            containment_field: crate::containment::DEFAULT_CONTAINMENT_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker width for step preprocessing and embedding generation.
    pub embed_workers: usize,
    /// Worker width for feedback oracle round-trips.
    pub feedback_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            embed_workers: 8,
            feedback_workers: crate::feedback::FEEDBACK_POOL_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canonical: CanonicalConfig,
    pub spelling: SpellingConfig,
    pub embedding: EmbeddingConfig,
    pub comparison: ComparisonConfig,
    pub pool: PoolConfig,
}

impl AppConfig {
    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the default path, falling back to embedded defaults when
    /// the file does not exist. A present-but-invalid file is still an error.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Path::new(CONFIG_PATH);
        if path.exists() {
            Self::load_from(path)
        } else {
            warn!(
                "No config file at {}; using embedded defaults (run 'casetriage init' to create one)",
                CONFIG_PATH
            );
            Self::default_config()
        }
    }

    /// The embedded default configuration, parsed and validated.
    pub fn default_config() -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ratio_fields = [
            (
                "canonical.similarity_threshold",
                self.canonical.similarity_threshold,
            ),
            (
                "comparison.jaccard_threshold",
                self.comparison.jaccard_threshold,
            ),
        ];
        for (name, value) in ratio_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange(name, value));
            }
        }

        let nonzero_fields = [
            ("embedding.dimension", self.embedding.dimension),
            ("comparison.max_neighbors", self.comparison.max_neighbors),
            ("pool.embed_workers", self.pool.embed_workers),
            ("pool.feedback_workers", self.pool.feedback_workers),
        ];
        for (name, value) in nonzero_fields {
            if value == 0 {
                return Err(ConfigError::ZeroValue(name));
            }
        }
        Ok(())
    }
}

/// Write the embedded default config to `./config/casetriage.toml`. Refuses
/// to overwrite an existing file.
pub fn init() -> Result<(), ConfigError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        warn!("Config file already exists at {}; leaving it alone", CONFIG_PATH);
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG)?;
    info!("Wrote default configuration to {}", CONFIG_PATH);
    Ok(())
}
