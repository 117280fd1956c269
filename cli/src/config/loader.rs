//! CLI configuration loader for tinyreact
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./tinyreact.json or ./.tinyreact/config.json
//! 3. Git repository root: <repo_root>/.tinyreact/config.json
//! 4. XDG config: $XDG_CONFIG_HOME/tinyreact/config.json or ~/.config/tinyreact/config.json
//! 5. Environment variables only (no files)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tinyreact_core::{AgentConfig, ModelParams, Protocol, ResolvedLlmConfig};
use tracing::debug;

const APP_DIR: &str = "tinyreact";

/// Raw configuration file format (simple single-file schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name (optional, uses protocol default if not specified)
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Maximum number of iterations
    pub ttl: Option<usize>,
    /// Tools offered to the model, in listing order
    pub tools: Option<Vec<String>>,
    /// Instruction template; `{tool_prompt}` marks where the tool listing goes
    pub instruction_prompt: Option<String>,
}

/// Configuration ready to build an agent from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub llm: ResolvedLlmConfig,
    pub agent: AgentConfig,
}

/// Environment variables consulted for one provider
struct EnvProvider {
    protocol: Protocol,
    key_vars: &'static [&'static str],
    base_url_var: &'static str,
    model_var: &'static str,
}

static ENV_PROVIDERS: [EnvProvider; 3] = [
    EnvProvider {
        protocol: Protocol::GoogleAI,
        key_vars: &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        base_url_var: "GEMINI_BASE_URL",
        model_var: "GEMINI_MODEL",
    },
    EnvProvider {
        protocol: Protocol::OpenAICompat,
        key_vars: &["OPENAI_API_KEY"],
        base_url_var: "OPENAI_BASE_URL",
        model_var: "OPENAI_MODEL",
    },
    EnvProvider {
        protocol: Protocol::Anthropic,
        key_vars: &["ANTHROPIC_API_KEY"],
        base_url_var: "ANTHROPIC_BASE_URL",
        model_var: "ANTHROPIC_MODEL",
    },
];

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<LoadedConfig> {
        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            let cwd = std::env::current_dir()?;
            match self.search_files(&cwd).await? {
                Some(config) => config,
                None => {
                    debug!("No config file found, using environment variables");
                    self.raw_from_env(|name| std::env::var(name).ok())?
                }
            }
        };

        // Step 2: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = Some(model.clone());
        }

        // Step 3: Resolve to final configuration
        resolve_config(config)
    }

    /// Search the config file locations in priority order
    async fn search_files(&self, start: &Path) -> Result<Option<RawConfig>> {
        // 1. Working directory
        for candidate in [
            start.join("tinyreact.json"),
            start.join(".tinyreact").join("config.json"),
        ] {
            if candidate.exists() {
                return Ok(Some(self.load_file(&candidate).await?));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(start) {
            let config_path = git_root.join(".tinyreact").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        // 3. XDG config directory
        if let Some(config_dir) = xdg_config_dir() {
            let config_path = config_dir.join(APP_DIR).join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        Ok(None)
    }

    /// Build a configuration from provider environment variables alone
    fn raw_from_env<F>(&self, var: F) -> Result<RawConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let available: Vec<(&EnvProvider, String)> = ENV_PROVIDERS
            .iter()
            .filter_map(|provider| {
                provider
                    .key_vars
                    .iter()
                    .find_map(|name| var(name).filter(|key| !key.is_empty()))
                    .map(|key| (provider, key))
            })
            .collect();
        let available_names = || {
            available
                .iter()
                .map(|(provider, _)| provider.protocol.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let preference = self
            .protocol_override
            .clone()
            .or_else(|| var("TINYREACT_PROTOCOL"));

        let (provider, api_key) = if let Some(preferred) = preference {
            let protocol = Protocol::parse(&preferred)
                .ok_or_else(|| anyhow!("Unsupported protocol '{}'", preferred))?;
            let provider = ENV_PROVIDERS
                .iter()
                .find(|provider| provider.protocol == protocol)
                .ok_or_else(|| anyhow!("Unsupported protocol '{}'", preferred))?;

            match available.iter().find(|(p, _)| p.protocol == protocol) {
                Some((_, key)) => (provider, key.clone()),
                // The key may still arrive through --api-key
                None if self.api_key_override.is_some() => (provider, String::new()),
                None => {
                    return Err(anyhow!(
                        "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                        preferred,
                        available_names()
                    ))
                }
            }
        } else {
            match available.as_slice() {
                [] => {
                    return Err(anyhow!(
                        "No configuration found. Please create a tinyreact.json file or set an environment variable like GEMINI_API_KEY"
                    ))
                }
                [(provider, key)] => (*provider, key.clone()),
                _ => {
                    return Err(anyhow!(
                        "Multiple API keys detected: {}. Please specify which protocol to use with TINYREACT_PROTOCOL or --protocol",
                        available_names()
                    ))
                }
            }
        };

        // Model priority: provider-specific env > generic env > protocol default
        let model = var(provider.model_var).or_else(|| var("TINYREACT_MODEL"));

        Ok(RawConfig {
            protocol: provider.protocol.as_str().to_string(),
            api_key,
            base_url: var(provider.base_url_var),
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
            ttl: None,
            tools: None,
            instruction_prompt: None,
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("Loading config file {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Find the enclosing git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Get XDG config directory
fn xdg_config_dir() -> Option<PathBuf> {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|home| home.join(".config")),
    }
}

/// Resolve a raw config into the LLM and agent configuration
fn resolve_config(config: RawConfig) -> Result<LoadedConfig> {
    let protocol = Protocol::parse(&config.protocol).ok_or_else(|| {
        anyhow!(
            "Unsupported protocol '{}'. Expected one of: google_ai, openai, anthropic",
            config.protocol
        )
    })?;

    // Resolve API key (handle env: prefix)
    let api_key = match config.api_key.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .with_context(|| format!("Environment variable not found: {}", var_name))?,
        None => config.api_key,
    };

    let base_url = config
        .base_url
        .unwrap_or_else(|| protocol.default_base_url().to_string());
    let model = config
        .model
        .unwrap_or_else(|| protocol.default_model().to_string());

    let llm = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
        .with_params(config.params)
        .with_headers(config.headers);

    llm.validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    let mut agent = AgentConfig::default();
    if let Some(ttl) = config.ttl {
        agent.ttl = ttl;
    }
    if let Some(tools) = config.tools {
        agent.tools = tools;
    }
    agent.instruction_prompt = config.instruction_prompt;

    Ok(LoadedConfig { llm, agent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn write_config(path: &Path, model: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!(
                r#"{{"protocol": "google_ai", "api_key": "test-key", "model": "{}"}}"#,
                model
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_working_directory_file_wins() {
        let dir = TempDir::new().unwrap();
        write_config(&dir.path().join("tinyreact.json"), "from-root-file");
        write_config(&dir.path().join(".tinyreact/config.json"), "from-dot-dir");

        let raw = CliConfigLoader::new()
            .search_files(dir.path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.model.as_deref(), Some("from-root-file"));
    }

    #[tokio::test]
    async fn test_git_root_config_is_found_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_config(&dir.path().join(".tinyreact/config.json"), "from-git-root");
        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let raw = CliConfigLoader::new()
            .search_files(&nested)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.model.as_deref(), Some("from-git-root"));
    }

    #[tokio::test]
    async fn test_config_override_with_flag_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"protocol": "openai", "api_key": "sk-test", "ttl": 3, "tools": ["add_numbers"]}"#,
        )
        .unwrap();

        let loaded = CliConfigLoader::new()
            .with_config_override(dir.path().to_path_buf())
            .with_model_override("gpt-4o-mini".to_string())
            .with_base_url_override("http://localhost:8080/v1".to_string())
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.llm.protocol, Protocol::OpenAICompat);
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert_eq!(loaded.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(loaded.agent.ttl, 3);
        assert_eq!(loaded.agent.tools, vec!["add_numbers".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_override_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = CliConfigLoader::new()
            .with_config_override(dir.path().join("nope.json"))
            .load()
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
    }

    #[test]
    fn test_resolve_fills_protocol_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"protocol": "gemini", "api_key": "k"}"#).unwrap();
        let loaded = resolve_config(raw).unwrap();
        assert_eq!(loaded.llm.protocol, Protocol::GoogleAI);
        assert_eq!(loaded.llm.model, Protocol::GoogleAI.default_model());
        assert_eq!(loaded.llm.base_url, Protocol::GoogleAI.default_base_url());
        assert_eq!(loaded.agent, AgentConfig::default());
    }

    #[test]
    fn test_resolve_rejects_unknown_protocol_and_missing_env_key() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"protocol": "telegraph", "api_key": "k"}"#).unwrap();
        assert!(resolve_config(raw).is_err());

        let raw: RawConfig = serde_json::from_str(
            r#"{"protocol": "openai", "api_key": "env:TINYREACT_TEST_SURELY_UNSET_KEY"}"#,
        )
        .unwrap();
        let err = resolve_config(raw).unwrap_err();
        assert!(err.to_string().contains("TINYREACT_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn test_env_single_key_is_detected() {
        let raw = CliConfigLoader::new()
            .raw_from_env(env(&[("GOOGLE_API_KEY", "g-key"), ("TINYREACT_MODEL", "m")]))
            .unwrap();
        assert_eq!(raw.protocol, "google_ai");
        assert_eq!(raw.api_key, "g-key");
        assert_eq!(raw.model.as_deref(), Some("m"));
    }

    #[test]
    fn test_env_multiple_keys_need_a_protocol() {
        let vars = [
            ("OPENAI_API_KEY", "o-key"),
            ("ANTHROPIC_API_KEY", "a-key"),
            ("ANTHROPIC_MODEL", "claude-test"),
        ];
        let err = CliConfigLoader::new().raw_from_env(env(&vars)).unwrap_err();
        assert!(err.to_string().contains("Multiple API keys"));

        let raw = CliConfigLoader::new()
            .with_protocol_override("anthropic".to_string())
            .raw_from_env(env(&vars))
            .unwrap();
        assert_eq!(raw.api_key, "a-key");
        assert_eq!(raw.model.as_deref(), Some("claude-test"));
    }

    #[test]
    fn test_env_without_keys_is_an_error() {
        let err = CliConfigLoader::new().raw_from_env(env(&[])).unwrap_err();
        assert!(err.to_string().contains("No configuration found"));

        let err = CliConfigLoader::new()
            .raw_from_env(env(&[("TINYREACT_PROTOCOL", "openai")]))
            .unwrap_err();
        assert!(err.to_string().contains("no corresponding API key"));

        let raw = CliConfigLoader::new()
            .with_protocol_override("openai".to_string())
            .with_api_key_override("sk-flag".to_string())
            .raw_from_env(env(&[]))
            .unwrap();
        assert_eq!(raw.protocol, "openai");
    }
}
