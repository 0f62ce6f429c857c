use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>, // For OpenAI-compatible APIs

    /// Optional: Override max_tokens for LLM requests
    /// If not specified, uses provider-specific defaults:
    /// - openai: 4096
    /// - anthropic: 4096
    /// - openai-compatible (ollama): 16384
    /// - gemini: 8192
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature used when a request does not set its own
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout per request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: None,
            max_tokens: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Get max_tokens value, using provider-specific default if not specified
    pub fn get_max_tokens(&self) -> u32 {
        if let Some(tokens) = self.max_tokens {
            return tokens;
        }

        match self.provider.as_str() {
            "anthropic" => 4096,
            "openai" => 4096,
            "openai-compatible" => 16384,
            "gemini" => 8192,
            _ => 4096,
        }
    }

    /// Get API key from environment variable specified in config
    pub fn get_api_key(&self) -> Result<String> {
        match &self.api_key_env {
            Some(env_var) => {
                // "none" means no API key needed (e.g., Ollama)
                if env_var.eq_ignore_ascii_case("none") {
                    return Ok(String::new());
                }

                // Local models don't need keys, gateways like OpenRouter do
                if self.provider == "openai-compatible" {
                    return Ok(env::var(env_var).unwrap_or_default());
                }

                env::var(env_var).map_err(|_| {
                    anyhow::anyhow!("API key not found in environment variable: {}", env_var)
                })
            }
            None => Ok(String::new()),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    120
}

/// Report metadata and toolchain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub org: Option<String>,

    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_pdflatex")]
    pub pdflatex: String,
    #[serde(default = "default_bibtex")]
    pub bibtex: String,
    /// Timeout per pdflatex/bibtex pass, in seconds
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout_secs: u64,

    /// Extra "(Author, Year)" -> bibtex key mappings, merged over the built-in table
    #[serde(default)]
    pub citations: BTreeMap<String, String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            author: None,
            email: None,
            title: None,
            subtitle: None,
            org: None,
            environment: default_environment(),
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            pdflatex: default_pdflatex(),
            bibtex: default_bibtex(),
            compile_timeout_secs: default_compile_timeout(),
            citations: BTreeMap::new(),
        }
    }
}

fn default_environment() -> String {
    "OpenAI Gym".to_string()
}

fn default_input_dir() -> String {
    "input".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_pdflatex() -> String {
    "pdflatex".to_string()
}

fn default_bibtex() -> String {
    "bibtex".to_string()
}

fn default_compile_timeout() -> u64 {
    300
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl ReportConfig {
    /// Apply REPORT_AUTHOR / REPORT_EMAIL / REPORT_TITLE / REPORT_SUBTITLE /
    /// REPORT_ORG. Empty variables leave the configured value alone.
    pub fn apply_env(&mut self) {
        let fields: [(&str, &mut Option<String>); 5] = [
            ("REPORT_AUTHOR", &mut self.author),
            ("REPORT_EMAIL", &mut self.email),
            ("REPORT_TITLE", &mut self.title),
            ("REPORT_SUBTITLE", &mut self.subtitle),
            ("REPORT_ORG", &mut self.org),
        ];
        for (var, slot) in fields {
            if let Some(value) = env::var(var).ok().and_then(non_empty) {
                debug!("{} overrides report metadata", var);
                *slot = Some(value);
            }
        }
    }

    /// Parse `key: value` lines from a title file (title.md).
    /// Recognised keys: title, subtitle, org. Returns false when the file is absent.
    pub fn apply_title_file(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            let Some(value) = non_empty(value.to_string()) else {
                continue;
            };
            match key.trim().to_lowercase().as_str() {
                "title" => self.title = Some(value),
                "subtitle" => self.subtitle = Some(value),
                "org" => self.org = Some(value),
                _ => {}
            }
        }
        info!("Title information loaded from {}", path.display());
        Ok(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RewriteConfig {
    /// Percentage by which rewritten text should shrink (0 = keep length)
    #[serde(default)]
    pub reduction: u32,
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        if Path::new("penwork.toml").exists() {
            match Self::load_from_path("penwork.toml") {
                Ok(config) => {
                    debug!("Loaded config from ./penwork.toml");
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring ./penwork.toml: {:#}", e),
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("penwork").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}

/// Load a `.env` file. A `.env` next to `near` wins; otherwise the usual
/// dotenv lookup from the working directory applies. Missing files are fine.
pub fn load_dotenv(near: Option<&Path>) {
    if let Some(dir) = near {
        let candidate = dir.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(()) => debug!("Loaded environment from {}", candidate.display()),
                Err(e) => warn!("Failed to load {}: {}", candidate.display(), e),
            }
            return;
        }
    }
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, Some("OPENAI_API_KEY".to_string()));
        assert_eq!(config.report.environment, "OpenAI Gym");
        assert_eq!(config.rewrite.reduction, 0);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("provider = \"openai\""));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
provider = "anthropic"
model = "claude-3"
api_key_env = "AI_API_KEY"

[report]
author = "Jane Roe"

[report.citations]
"(Doe, 2020)" = "doe2020"
"#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.timeout_secs, 120);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.report.author.as_deref(), Some("Jane Roe"));
        assert_eq!(config.report.pdflatex, "pdflatex");
        assert_eq!(config.report.citations["(Doe, 2020)"], "doe2020");
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        env::set_var("PENWORK_TEST_API_KEY", "test_key_123");
        let mut config = Config::default();
        config.llm.api_key_env = Some("PENWORK_TEST_API_KEY".to_string());
        assert_eq!(config.llm.get_api_key().unwrap(), "test_key_123");
        env::remove_var("PENWORK_TEST_API_KEY");
    }

    #[test]
    fn test_api_key_missing_fails() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("PENWORK_NONEXISTENT_KEY_XYZ".to_string());
        let err = config.llm.get_api_key().unwrap_err();
        assert!(err.to_string().contains("API key not found"));
    }

    #[test]
    fn test_api_key_none_and_openai_compatible() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("none".to_string());
        assert_eq!(config.llm.get_api_key().unwrap(), "");

        config.llm.provider = "openai-compatible".to_string();
        config.llm.api_key_env = Some("PENWORK_NONEXISTENT_KEY_OAI_999".to_string());
        assert_eq!(config.llm.get_api_key().unwrap(), "");
    }

    #[test]
    fn test_max_tokens_provider_defaults() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.get_max_tokens(), 4096);
        llm.provider = "openai-compatible".to_string();
        assert_eq!(llm.get_max_tokens(), 16384);
        llm.provider = "gemini".to_string();
        assert_eq!(llm.get_max_tokens(), 8192);
        llm.max_tokens = Some(2000);
        assert_eq!(llm.get_max_tokens(), 2000);
    }

    #[test]
    #[serial]
    fn test_report_env_overrides() {
        env::set_var("REPORT_AUTHOR", "Env Author");
        env::set_var("REPORT_ORG", "   ");
        let mut report = ReportConfig {
            org: Some("Configured Org".to_string()),
            ..ReportConfig::default()
        };
        report.apply_env();
        assert_eq!(report.author.as_deref(), Some("Env Author"));
        // Blank env var does not clobber the configured value
        assert_eq!(report.org.as_deref(), Some("Configured Org"));
        env::remove_var("REPORT_AUTHOR");
        env::remove_var("REPORT_ORG");
    }

    #[test]
    fn test_title_file_parsing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("title.md");
        fs::write(
            &path,
            "Title: Controlling Lunar Lander\nsubtitle:   \nORG: Example Lab\nnot a pair\nauthor: ignored\n",
        )
        .unwrap();

        let mut report = ReportConfig {
            subtitle: Some("Kept".to_string()),
            ..ReportConfig::default()
        };
        assert!(report.apply_title_file(&path).unwrap());
        assert_eq!(report.title.as_deref(), Some("Controlling Lunar Lander"));
        assert_eq!(report.subtitle.as_deref(), Some("Kept"));
        assert_eq!(report.org.as_deref(), Some("Example Lab"));
        assert!(report.author.is_none());
    }

    #[test]
    fn test_title_file_missing() {
        let mut report = ReportConfig::default();
        assert!(!report
            .apply_title_file(Path::new("/nonexistent/title.md"))
            .unwrap());
    }

    #[test]
    fn test_load_with_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[rewrite]\nreduction = 25\n").unwrap();
        let config = Config::load_with_path(Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.rewrite.reduction, 25);
        assert_eq!(config.llm.provider, "openai");
    }

    #[test]
    fn test_load_with_bad_explicit_path_errors() {
        let result = Config::load_with_path(Some("/nonexistent/penwork.toml".to_string()));
        assert!(result.is_err());
    }
}
