use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::collaborators::InferenceOptions;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub ingestion: IngestionConfig,
    pub budget: BudgetConfig,
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("DOCAUDIT")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("DOCAUDIT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("inference.provider", "runpod")?
            .set_default("inference.base_url", "https://api.runpod.ai")?
            .set_default("inference.endpoint_id", "")?
            .set_default("inference.api_key", "")?
            .set_default("inference.model", "gpt-4o")?
            .set_default("inference.max_tokens", 4096)?
            .set_default("inference.temperature", 0.001)?
            .set_default("inference.timeout_secs", 180)?
            .set_default("inference.provider_label", "SCOTi")?
            .set_default("ingestion.style_guide_dir", "data/input")?
            .set_default("ingestion.encoding", "cl100k_base")?
            .set_default("budget.max_serialized_length", 240_000)?
            .set_default("budget.audit_max_turns", 2)?
            .set_default("summarizer.window_tokens", 6000)?
            .set_default("summarizer.stride_tokens", 5500)
    }
}

/// Which wire protocol the inference endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    /// RunPod serverless `runsync` endpoint
    Runpod,
    /// OpenAI-compatible chat completions
    Openai,
}

/// Inference endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub provider: InferenceProvider,
    pub base_url: String,
    #[serde(default)]
    pub endpoint_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name shown to users in the audit start event
    #[serde(default = "default_provider_label")]
    pub provider_label: String,
}

impl InferenceConfig {
    pub fn new(provider: InferenceProvider, base_url: String) -> Self {
        Self {
            provider,
            base_url,
            endpoint_id: String::new(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            provider_label: default_provider_label(),
        }
    }

    pub fn with_endpoint_id(mut self, endpoint_id: String) -> Self {
        self.endpoint_id = endpoint_id;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Per-call options derived from this configuration
    pub fn options(&self) -> InferenceOptions {
        InferenceOptions::new()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_timeout(self.timeout())
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.001
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_provider_label() -> String {
    "SCOTi".to_string()
}

/// Document ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Current revision of the boilerplate report template
    #[serde(default)]
    pub new_template_path: Option<String>,
    /// Previous revision of the boilerplate report template
    #[serde(default)]
    pub old_template_path: Option<String>,
    #[serde(default = "default_style_guide_dir")]
    pub style_guide_dir: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl IngestionConfig {
    pub fn new() -> Self {
        Self {
            new_template_path: None,
            old_template_path: None,
            style_guide_dir: default_style_guide_dir(),
            encoding: default_encoding(),
        }
    }

    pub fn with_templates(mut self, new_template_path: String, old_template_path: String) -> Self {
        self.new_template_path = Some(new_template_path);
        self.old_template_path = Some(old_template_path);
        self
    }

    pub fn with_style_guide_dir(mut self, dir: String) -> Self {
        self.style_guide_dir = dir;
        self
    }

    pub fn has_templates(&self) -> bool {
        self.new_template_path.is_some() && self.old_template_path.is_some()
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_style_guide_dir() -> String {
    "data/input".to_string()
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

/// Prompt size limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_max_serialized_length")]
    pub max_serialized_length: usize,
    #[serde(default = "default_audit_max_turns")]
    pub audit_max_turns: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_serialized_length: default_max_serialized_length(),
            audit_max_turns: default_audit_max_turns(),
        }
    }
}

fn default_max_serialized_length() -> usize {
    240_000
}

fn default_audit_max_turns() -> usize {
    2
}

/// Windowing used by the chunked summarizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_window_tokens")]
    pub window_tokens: usize,
    #[serde(default = "default_stride_tokens")]
    pub stride_tokens: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            window_tokens: default_window_tokens(),
            stride_tokens: default_stride_tokens(),
        }
    }
}

fn default_window_tokens() -> usize {
    6000
}

fn default_stride_tokens() -> usize {
    5500
}

/// Feedback mail routing
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailConfig {
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: String,
}
