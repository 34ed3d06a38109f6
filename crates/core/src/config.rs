//! Configuration management for Scribe.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.scribe/config.yaml` in the workspace, or `SCRIBE_CONFIG`)
//! - Environment variables
//! - Command-line flags (`AppConfig::with_overrides`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (may contain .scribe/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider used for answer generation (e.g. "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Custom LLM endpoint
    pub endpoint: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chunking, embedding and search settings
    pub retrieval: RetrievalSettings,
}

/// Retrieval settings as they appear under `retrieval:` in config.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Words per chunk
    pub window_size: usize,

    /// Words shared between neighboring chunks
    pub overlap: usize,

    /// Results returned per query
    pub top_k: usize,

    /// Vector index implementation: "flat" or "hnsw"
    pub index: String,

    /// Embedder: "trigram" or "ollama"
    pub embedder: String,

    /// Embedding model for remote embedders
    pub embedding_model: String,

    /// Embedding dimensionality
    pub dimensions: usize,

    /// Embedding endpoint for remote embedders
    pub endpoint: Option<String>,

    /// Per-request embedding timeout
    pub timeout_secs: u64,

    /// Minimum score for an excerpt to count as relevant when answering
    pub min_relevance: f32,

    /// Character budget for raw source text when retrieval finds nothing
    pub max_fallback_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            window_size: 500,
            overlap: 50,
            top_k: 5,
            index: "flat".to_string(),
            embedder: "trigram".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout_secs: 30,
            min_relevance: 0.2,
            max_fallback_chars: 12_000,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    retrieval: Option<RetrievalSettings>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            log_level: None,
            verbose: false,
            no_color: false,
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `SCRIBE_WORKSPACE`: Override workspace path
    /// - `SCRIBE_CONFIG`: Path to config file
    /// - `SCRIBE_PROVIDER`: LLM provider
    /// - `SCRIBE_MODEL`: Model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("SCRIBE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("SCRIBE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.scribe_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SCRIBE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SCRIBE_MODEL") {
            config.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .scribe directory.
    pub fn scribe_dir(&self) -> PathBuf {
        self.workspace.join(".scribe")
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama"];
        if !known_providers.contains(&self.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let retrieval = &self.retrieval;
        if retrieval.window_size == 0 {
            return Err(AppError::Config("retrieval.windowSize must be > 0".to_string()));
        }
        if retrieval.overlap >= retrieval.window_size {
            return Err(AppError::Config(format!(
                "retrieval.overlap ({}) must be less than retrieval.windowSize ({})",
                retrieval.overlap, retrieval.window_size
            )));
        }
        if retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.retrieval.window_size, 500);
        assert_eq!(config.retrieval.overlap, 50);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("mistral".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.model, "mistral");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_retrieval_section() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "llm:\n  model: qwen2.5\nretrieval:\n  windowSize: 200\n  overlap: 20\n  index: hnsw\nlogging:\n  color: false\n",
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.model, "qwen2.5");
        assert_eq!(merged.retrieval.window_size, 200);
        assert_eq!(merged.retrieval.overlap, 20);
        assert_eq!(merged.retrieval.index, "hnsw");
        // Unspecified fields keep their defaults
        assert_eq!(merged.retrieval.top_k, 5);
        assert_eq!(merged.retrieval.embedder, "trigram");
        assert_eq!(merged.retrieval.max_fallback_chars, 12_000);
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_fallback_budget() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retrieval:\n  maxFallbackChars: 4000\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.retrieval.max_fallback_chars, 4000);
        assert_eq!(merged.retrieval.window_size, 500);
    }

    #[test]
    fn test_merge_yaml_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retrieval: [not, a, map]\n").unwrap();

        let err = AppConfig::default().merge_yaml(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut config = AppConfig::default();
        config.retrieval.overlap = config.retrieval.window_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }
}
