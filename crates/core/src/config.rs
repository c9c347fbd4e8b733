//! Configuration management for docqa.
//!
//! Configuration is merged from several sources, later sources winning:
//! - Built-in defaults
//! - Config file (`.docqa/config.yaml` or `--config`)
//! - Environment variables
//! - Command-line flags
//!
//! All persistent state lives under the workspace's `.docqa/` directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("ollama" or "openai")
    pub provider: String,

    /// Default model identifier
    pub model: String,

    /// API key for the generation provider
    pub api_key: Option<String>,

    /// Owner identity used for library-wide questions
    pub user: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Retrieval and pipeline tuning
    pub rag: RagConfig,

    /// Markers delimiting private reasoning in model output
    pub thinking: ThinkingConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat completions endpoint (OpenAI, Groq, ...)
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

/// Retrieval and pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    /// Passages kept after single-document retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Passages requested per search query
    #[serde(default = "default_per_query_top_k")]
    pub per_query_top_k: usize,

    /// Passages requested per document during library-wide fan-out
    #[serde(default = "default_per_document_top_k")]
    pub per_document_top_k: usize,

    /// Library-wide retrieval keeps `top_k * global_multiplier` passages
    #[serde(default = "default_global_multiplier")]
    pub global_multiplier: usize,

    /// Ask the model for 2-3 search queries instead of one
    #[serde(default)]
    pub multi_query: bool,

    /// Conversation turns shown to the search query generator
    #[serde(default = "default_query_history_turns")]
    pub query_history_turns: usize,

    /// Conversation turns replayed to the answer generator
    #[serde(default = "default_answer_history_turns")]
    pub answer_history_turns: usize,

    /// Characters per indexed chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between neighbouring chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Embedding provider settings for the local index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// "trigram" (offline) or "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    /// Ollama endpoint, when the provider is "ollama"
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Opening and closing markers of a thinking span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(default = "default_thinking_open")]
    pub open: String,
    #[serde(default = "default_thinking_close")]
    pub close: String,
}

fn default_top_k() -> usize {
    5
}

fn default_per_query_top_k() -> usize {
    6
}

fn default_per_document_top_k() -> usize {
    3
}

fn default_global_multiplier() -> usize {
    2
}

fn default_query_history_turns() -> usize {
    4
}

fn default_answer_history_turns() -> usize {
    6
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    150
}

fn default_thinking_open() -> String {
    "<thinking>".to_string()
}

fn default_thinking_close() -> String {
    "</thinking>".to_string()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            per_query_top_k: default_per_query_top_k(),
            per_document_top_k: default_per_document_top_k(),
            global_multiplier: default_global_multiplier(),
            multi_query: false,
            query_history_turns: default_query_history_turns(),
            answer_history_turns: default_answer_history_turns(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl RagConfig {
    /// Result size for library-wide and synthesis retrieval.
    pub fn global_top_k(&self) -> usize {
        self.top_k * self.global_multiplier
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            open: default_thinking_open(),
            close: default_thinking_close(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    user: Option<String>,
    rag: Option<RagConfig>,
    thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            user: "local".to_string(),
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: None,
            rag: RagConfig::default(),
            thinking: ThinkingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_PROVIDER`: Generation provider
    /// - `DOCQA_MODEL`: Model identifier
    /// - `DOCQA_API_KEY`: API key
    /// - `DOCQA_USER`: Owner identity for library questions
    /// - `RAG_TOP_K`: Passages kept per single-document question
    /// - `RAG_MULTI_QUERY`: `true` to generate several search queries
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docqa_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.model = model;
        }

        if let Ok(user) = std::env::var("DOCQA_USER") {
            config.user = user;
        }

        if let Ok(top_k) = std::env::var("RAG_TOP_K") {
            config.rag.top_k = top_k.parse().map_err(|_| {
                AppError::Config(format!("RAG_TOP_K must be a positive integer, got '{}'", top_k))
            })?;
        }

        if let Ok(multi_query) = std::env::var("RAG_MULTI_QUERY") {
            config.rag.multi_query = multi_query == "true";
        }

        config.api_key = std::env::var("DOCQA_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self;

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(user) = config_file.user {
            result.user = user;
        }

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        if let Some(thinking) = config_file.thinking {
            result.thinking = thinking;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = match provider_config {
                    ProviderConfig::OpenAI { model, .. } => model.clone(),
                    ProviderConfig::Ollama { model, .. } => model.clone(),
                };
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        user: Option<String>,
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

        if let Some(user) = user {
            self.user = user;
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

    /// Path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_docqa_dir(&self) -> AppResult<()> {
        let docqa_dir = self.docqa_dir();
        if !docqa_dir.exists() {
            std::fs::create_dir_all(&docqa_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get a provider's configuration block, if any.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint configured for a provider.
    pub fn resolve_endpoint(&self, provider: &str) -> Option<&str> {
        match self.get_provider_config(provider)? {
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
        }
    }

    /// Resolve the API key: `DOCQA_API_KEY` first, then the provider's key env var.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider)? {
            ProviderConfig::OpenAI { api_key_env, .. } => std::env::var(api_key_env).ok(),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "openai" && self.resolve_api_key("openai").is_none() {
            let hint = match self.get_provider_config("openai") {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
                _ => "DOCQA_API_KEY".to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                hint
            )));
        }

        if self.rag.top_k == 0 {
            return Err(AppError::Config("rag.topK must be at least 1".to_string()));
        }

        if self.thinking.open.is_empty() || self.thinking.close.is_empty() {
            return Err(AppError::Config(
                "thinking markers cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
