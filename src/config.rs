use anyhow::{Context, Result};
use knowledge_hub_core::history::DEFAULT_HISTORY_LIMIT;
use knowledge_hub_core::models::SearchType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_mode")]
    pub default_mode: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_true")]
    pub semantic_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            history_limit: default_history_limit(),
            semantic_enabled: true,
        }
    }
}

fn default_mode() -> String {
    "hybrid".to_string()
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_true")]
    pub summarize: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_file_size_mb: default_max_file_size_mb(),
            summarize: true,
        }
    }
}

impl UploadConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}
fn default_max_file_size_mb() -> u64 {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// The configured default search mode. Validated at load time.
    pub fn default_search_type(&self) -> SearchType {
        self.search
            .default_mode
            .parse()
            .unwrap_or(SearchType::Hybrid)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate search
    if config.search.history_limit < 1 {
        anyhow::bail!("search.history_limit must be >= 1");
    }
    if let Err(e) = config.search.default_mode.parse::<SearchType>() {
        anyhow::bail!("search.default_mode: {}", e);
    }

    // Validate upload
    if config.upload.max_file_size_mb < 1 {
        anyhow::bail!("upload.max_file_size_mb must be >= 1");
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.llm.is_enabled() && config.llm.model.is_none() {
        anyhow::bail!(
            "llm.model must be specified when provider is '{}'",
            config.llm.provider
        );
    }

    Ok(config)
}
