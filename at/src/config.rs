//! AgentTeam configuration types and loading
//!
//! Configuration is YAML with kebab-case keys. Every section is optional;
//! missing fields fall back to their defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Role;

/// Main AgentTeam configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Team loop settings
    pub team: TeamConfig,

    /// Per-role generation settings
    pub roles: RolesConfig,

    /// Where results are written
    pub output: OutputConfig,
}

/// Only the log level, read before logging is set up
#[derive(Debug, Default, Deserialize)]
struct LogLevelOnly {
    #[serde(rename = "log-level")]
    log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks the loop bounds, the role temperatures and that the API key
    /// environment variable is set. Call this early to fail fast.
    pub fn validate(&self) -> Result<()> {
        if self.team.max_iterations < 1 {
            return Err(eyre::eyre!(
                "team.max-iterations must be at least 1, got {}",
                self.team.max_iterations
            ));
        }

        for role in Role::ALL {
            let temperature = self.roles.temperature(role);
            if !(0.0..=2.0).contains(&temperature) {
                return Err(eyre::eyre!(
                    "roles.{}.temperature must be between 0.0 and 2.0, got {}",
                    RolesConfig::key(role),
                    temperature
                ));
            }
        }

        if self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed: a broken config file is reported properly by
    /// [`Config::load`] once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => Some(path.clone()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        }?;
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
    }

    /// Project-local then user config locations
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".agentteam.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("agentteam").join("agentteam.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).context("Failed to parse config file")?
        };

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai", meaning any OpenAI-compatible endpoint)
    pub provider: String,

    /// Default model, used by roles without their own
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL, including the version segment
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Max tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "qwen-turbo".to_string(),
            api_key_env: "DASHSCOPE_API_KEY".to_string(),
            base_url: "https://dashscope-intl.aliyuncs.com/compatible-mode/v1".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|key| !key.is_empty())
    }
}

/// Team loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Cap on Code→Test→Review cycles
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Directory of `.pmt` files overriding the built-in role prompts
    #[serde(rename = "prompts-dir", skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,

    /// How many of the latest history entries the coding agent sees
    #[serde(rename = "history-window")]
    pub history_window: usize,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            prompts_dir: None,
            history_window: 6,
        }
    }
}

/// Generation settings for one role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Model override; the `llm.model` default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature; the role's own default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl RoleConfig {
    fn with_temperature(temperature: f32) -> Self {
        Self {
            model: None,
            temperature: Some(temperature),
        }
    }
}

/// Per-role generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    pub planner: RoleConfig,
    pub coder: RoleConfig,
    pub tester: RoleConfig,
    pub reviewer: RoleConfig,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            planner: RoleConfig::with_temperature(Self::default_temperature(Role::Plan)),
            coder: RoleConfig::with_temperature(Self::default_temperature(Role::Code)),
            tester: RoleConfig::with_temperature(Self::default_temperature(Role::Test)),
            reviewer: RoleConfig::with_temperature(Self::default_temperature(Role::Review)),
        }
    }
}

impl RolesConfig {
    /// YAML key of a role's section
    pub fn key(role: Role) -> &'static str {
        match role {
            Role::Plan => "planner",
            Role::Code => "coder",
            Role::Test => "tester",
            Role::Review => "reviewer",
        }
    }

    pub fn default_temperature(role: Role) -> f32 {
        match role {
            Role::Plan => 0.7,
            Role::Code => 0.3,
            Role::Test => 0.5,
            Role::Review => 0.4,
        }
    }

    pub fn get(&self, role: Role) -> &RoleConfig {
        match role {
            Role::Plan => &self.planner,
            Role::Code => &self.coder,
            Role::Test => &self.tester,
            Role::Review => &self.reviewer,
        }
    }

    /// Effective temperature of a role, falling back to its default
    pub fn temperature(&self, role: Role) -> f32 {
        self.get(role)
            .temperature
            .unwrap_or_else(|| Self::default_temperature(role))
    }
}

/// Where results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory; each run gets its own subdirectory
    pub dir: PathBuf,

    /// Strip markdown fences and chatter from code files
    #[serde(rename = "clean-code")]
    pub clean_code: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            clean_code: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "qwen-turbo");
        assert_eq!(config.llm.api_key_env, "DASHSCOPE_API_KEY");
        assert!(config.llm.base_url.ends_with("/v1"));
        assert_eq!(config.team.max_iterations, 3);
        assert!(config.output.clean_code);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_default_role_temperatures() {
        let roles = RolesConfig::default();
        assert_eq!(roles.temperature(Role::Plan), 0.7);
        assert_eq!(roles.temperature(Role::Code), 0.3);
        assert_eq!(roles.temperature(Role::Test), 0.5);
        assert_eq!(roles.temperature(Role::Review), 0.4);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
log-level: debug
llm:
  provider: openai
  model: gpt-4o-mini
  api-key-env: OPENAI_API_KEY
  base-url: https://api.openai.com/v1
  max-tokens: 2048
  timeout-ms: 30000
team:
  max-iterations: 5
  prompts-dir: ./prompts
  history-window: 4
roles:
  coder:
    model: gpt-4o
    temperature: 0.1
output:
  dir: /tmp/at-out
  clean-code: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.team.max_iterations, 5);
        assert_eq!(config.team.prompts_dir, Some(PathBuf::from("./prompts")));
        assert_eq!(config.roles.coder.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.roles.temperature(Role::Code), 0.1);
        // Untouched roles keep their defaults
        assert_eq!(config.roles.temperature(Role::Plan), 0.7);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/at-out"));
        assert!(!config.output.clean_code);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = "team:\n  max-iterations: 1\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.team.max_iterations, 1);
        assert_eq!(config.team.history_window, 6);
        assert_eq!(config.llm, LlmConfig::default());
    }

    #[test]
    fn test_partial_role_block_keeps_role_temperature() {
        let yaml = "roles:\n  coder:\n    model: qwen-max\n  reviewer:\n    temperature: 0.9\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.roles.coder.model.as_deref(), Some("qwen-max"));
        assert_eq!(config.roles.temperature(Role::Code), 0.3);
        assert_eq!(config.roles.reviewer.model, None);
        assert_eq!(config.roles.temperature(Role::Review), 0.9);
        // Roles absent from the file keep their whole default block
        assert_eq!(config.roles.tester, RolesConfig::default().tester);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: warn\nteam:\n  max-iterations: 7").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.team.max_iterations, 7);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_missing_path_errors() {
        let path = PathBuf::from("/nonexistent/agentteam.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_rejects_zero_iterations() {
        unsafe { std::env::set_var("AT_TEST_KEY", "x") };
        let mut config = Config::default();
        config.llm.api_key_env = "AT_TEST_KEY".to_string();
        config.team.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max-iterations"));
    }

    #[test]
    #[serial]
    fn test_validate_rejects_bad_temperature() {
        unsafe { std::env::set_var("AT_TEST_KEY", "x") };
        let mut config = Config::default();
        config.llm.api_key_env = "AT_TEST_KEY".to_string();
        config.roles.reviewer.temperature = Some(3.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("roles.reviewer.temperature"));
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        unsafe { std::env::remove_var("AT_MISSING_KEY") };
        let mut config = Config::default();
        config.llm.api_key_env = "AT_MISSING_KEY".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("AT_MISSING_KEY"));

        unsafe { std::env::set_var("AT_MISSING_KEY", "secret") };
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.api_key().as_deref(), Some("secret"));

        // An empty variable counts as missing
        unsafe { std::env::set_var("AT_MISSING_KEY", "") };
        assert!(config.llm.api_key().is_none());
        assert!(config.validate().is_err());
        unsafe { std::env::remove_var("AT_MISSING_KEY") };
    }
}
