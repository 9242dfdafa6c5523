//! Configuration loading from tooloop.toml.

use runtime::{ArgumentPolicy, DEFAULT_MAX_TURNS};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:12434/engines/llama.cpp/v1/";
const DEFAULT_MODEL: &str = "hf.co/menlo/jan-nano-gguf:q4_k_m";
const DEFAULT_TOOLS_URL: &str = "http://localhost:9011/mcp";

/// Environment variable that overrides `completion.api_key`.
pub const API_KEY_ENV: &str = "TOOLOOP_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub completion: CompletionConfig,
    pub tools: ToolsConfig,
    pub run: RunConfig,
}

/// Completion service settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API (up to and including `/v1`).
    pub base_url: String,
    pub model: String,
    /// Bearer token. Local servers usually need none.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Tool server settings.
///
/// Set either `url` (streamable HTTP) or `command` (stdio child process).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub url: Option<String>,
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Name announced in the MCP handshake.
    pub client_name: String,
    /// Version announced in the MCP handshake.
    pub client_version: String,
    pub call_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            url: None,
            command: None,
            args: Vec::new(),
            client_name: "micro agent".to_string(),
            client_version: "0.0.0".to_string(),
            call_timeout_secs: 60,
        }
    }
}

/// Loop settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_turns: usize,
    pub argument_policy: ArgumentPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            argument_policy: ArgumentPolicy::default(),
        }
    }
}

/// How to reach the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolTransport {
    Http { url: String },
    Stdio { command: String, args: Vec<String> },
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and validate the result again.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        max_turns: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if let Some(model) = model {
            self.completion.model = model;
        }
        if let Some(max_turns) = max_turns {
            self.run.max_turns = max_turns;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_turns == 0 {
            return Err(ConfigError::Invalid("run.max_turns must be at least 1".into()));
        }
        self.transport().map(|_| ())
    }

    /// Resolve the tool server transport.
    ///
    /// Defaults to the local HTTP endpoint when neither option is set.
    pub fn transport(&self) -> Result<ToolTransport, ConfigError> {
        match (&self.tools.url, &self.tools.command) {
            (Some(url), None) => Ok(ToolTransport::Http { url: url.clone() }),
            (None, Some(command)) => Ok(ToolTransport::Stdio {
                command: command.clone(),
                args: self.tools.args.clone(),
            }),
            (None, None) => Ok(ToolTransport::Http {
                url: DEFAULT_TOOLS_URL.to_string(),
            }),
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousTransport),
        }
    }

    /// API key, preferring the environment value when one is given.
    pub fn api_key(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.completion.api_key.clone())
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion.timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.call_timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("ambiguous tool server: set either tools.url OR tools.command, not both")]
    AmbiguousTransport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.completion.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.completion.model, DEFAULT_MODEL);
        assert_eq!(config.tools.client_name, "micro agent");
        assert_eq!(config.tools.client_version, "0.0.0");
        assert_eq!(config.run.max_turns, 25);
        assert_eq!(config.run.argument_policy, ArgumentPolicy::Lenient);
        assert_eq!(
            config.transport().unwrap(),
            ToolTransport::Http {
                url: DEFAULT_TOOLS_URL.into()
            }
        );
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [completion]
            base_url = "https://api.example.com/v1"
            model = "gpt-test"
            api_key = "sk-file"
            timeout_secs = 30

            [tools]
            command = "mcp-snippets"
            args = ["--root", "./snippets"]
            call_timeout_secs = 5

            [run]
            max_turns = 8
            argument_policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.completion.model, "gpt-test");
        assert_eq!(config.completion_timeout(), Duration::from_secs(30));
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.run.max_turns, 8);
        assert_eq!(config.run.argument_policy, ArgumentPolicy::Strict);
        assert_eq!(
            config.transport().unwrap(),
            ToolTransport::Stdio {
                command: "mcp-snippets".into(),
                args: vec!["--root".into(), "./snippets".into()],
            }
        );
    }

    #[test]
    fn url_and_command_conflict() {
        let err = Config::parse(
            r#"
            [tools]
            url = "http://localhost:9011/mcp"
            command = "mcp-snippets"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousTransport));
    }

    #[test]
    fn zero_turns_rejected() {
        let err = Config::parse("[run]\nmax_turns = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = Config::parse("[run]\nmax_turns = 8")
            .unwrap()
            .with_overrides(Some("gpt-flag".into()), Some(3))
            .unwrap();
        assert_eq!(config.completion.model, "gpt-flag");
        assert_eq!(config.run.max_turns, 3);

        let config = Config::default().with_overrides(None, None).unwrap();
        assert_eq!(config.completion.model, DEFAULT_MODEL);
        assert_eq!(config.run.max_turns, 25);
    }

    #[test]
    fn zero_turns_override_rejected() {
        let err = Config::default()
            .with_overrides(None, Some(0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn env_api_key_wins() {
        let config = Config::parse("[completion]\napi_key = \"sk-file\"").unwrap();
        assert_eq!(config.api_key(Some("sk-env".into())).as_deref(), Some("sk-env"));
        assert_eq!(config.api_key(Some(" ".into())).as_deref(), Some("sk-file"));
        assert_eq!(config.api_key(None).as_deref(), Some("sk-file"));
    }
}
