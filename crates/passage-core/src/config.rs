//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_SEARCH__ALPHA`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Distance, TieBreak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chars: 1000, overlap: 200 }
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be greater than zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Weight of the semantic signal; `1 - alpha` goes to the lexical signal.
    pub alpha: f32,
    /// Backend candidate pool is `k * candidate_multiplier`.
    pub candidate_multiplier: usize,
    pub tie_break: TieBreak,
    pub default_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { alpha: 0.7, candidate_multiplier: 3, tie_break: TieBreak::ArrivalOrder, default_k: 5 }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        if self.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("search.candidate_multiplier must be at least 1".into()));
        }
        if self.default_k == 0 {
            return Err(Error::InvalidConfig("search.default_k must be greater than zero".into()));
        }
        Ok(())
    }

    /// Size of the semantic candidate pool requested for a top-`k` search.
    pub fn candidate_pool(&self, k: usize) -> usize {
        k.saturating_mul(self.candidate_multiplier.max(1)).max(k)
    }
}

/// Reject weights outside `[0, 1]` (NaN included).
pub fn validate_alpha(alpha: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidConfig(format!("alpha must lie in [0, 1], got {alpha}")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    Hash,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub dim: usize,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { provider: EmbeddingProvider::Hash, dim: 384, model_dir: None, max_len: 256 }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be greater than zero".into()));
        }
        if self.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be greater than zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Lance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub collection: String,
    pub backend: BackendKind,
    pub distance: Distance,
    pub lance_uri: String,
    /// Metadata keys that persistent backends store as filterable columns.
    pub filter_fields: Vec<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            collection: "passages".to_string(),
            backend: BackendKind::Memory,
            distance: Distance::Cosine,
            lance_uri: "data/indexes/lancedb".to_string(),
            filter_fields: vec!["source_type".to_string(), "filename".to_string()],
        }
    }
}

impl IndexSettings {
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("index.collection must not be empty".into()));
        }
        for field in &self.filter_fields {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::InvalidConfig(format!(
                    "index.filter_fields entry '{field}' must match [A-Za-z0-9_]+"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub source_type: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { raw_txt_dir: "data/txt".to_string(), source_type: "text".to_string() }
    }
}

/// Typed view over every configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub search: SearchSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub data: DataSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.search.validate()?;
        self.embedding.validate()?;
        self.index.validate()
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::debug!(env = other, "no environment-specific config file for RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Build from an explicit figment; defaults are layered underneath.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.figment.extract_inner(key)?)
    }

    /// Extract and validate every section.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
