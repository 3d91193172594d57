//! Layered configuration for taskflow.
//!
//! Settings are read from `.taskflow/taskflow.toml` in the project directory,
//! falling back to `<user config dir>/taskflow/taskflow.toml`. Environment
//! variables override the file and CLI flags override both.
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "eyJhbGciOi..."
//!
//! [auth]
//! email = "me@example.com"
//!
//! [server]
//! port = 3141
//!
//! [log]
//! level = "warn"
//! ```
//!
//! | Variable            | Overrides          |
//! |---------------------|--------------------|
//! | `TASKFLOW_URL`      | `backend.url`      |
//! | `TASKFLOW_ANON_KEY` | `backend.anon_key` |
//! | `TASKFLOW_EMAIL`    | `auth.email`       |
//! | `TASKFLOW_PASSWORD` | (env only)         |
//! | `TASKFLOW_LOG`      | `log.level`        |

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::board::models::Session;

pub const CONFIG_DIR: &str = ".taskflow";
pub const CONFIG_FILE: &str = "taskflow.toml";
pub const SESSION_FILE: &str = "session.json";

const ENV_PREFIX: &str = "TASKFLOW_";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackendSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthSection {
    /// Email used by `login` when none is given on the command line
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// The complete taskflow.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskflowToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub log: LogSection,
}

impl TaskflowToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskflow.toml")
    }

    /// Load `taskflow.toml` from `dir`, or defaults when it does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize taskflow.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref url) = self.backend.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(format!(
                    "Invalid backend.url '{}': should start with http:// or https://",
                    url
                ));
            }
            if self.backend.anon_key.as_deref().is_none_or(str::is_empty) {
                warnings.push("backend.url is set but backend.anon_key is missing".to_string());
            }
        }

        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            warnings.push(format!(
                "Invalid log.level '{}': should be one of {}",
                self.log.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.server.port == 0 {
            warnings.push("server.port 0 picks a random port on every start".to_string());
        }

        warnings
    }
}

/// Where the hosted backend lives and how to reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
}

/// Runtime configuration: file, then environment, then CLI flags.
#[derive(Debug, Clone)]
pub struct TaskflowConfig {
    pub project_dir: PathBuf,
    /// Directory holding `taskflow.toml` and the cached session
    pub config_dir: PathBuf,
    pub toml: TaskflowToml,
    /// `TASKFLOW_*` variables captured at startup
    env: HashMap<String, String>,
    pub verbose: bool,
    pub offline: bool,
}

impl TaskflowConfig {
    /// Resolve the config directory for `project_dir` and load it, reading
    /// overrides from the process environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let env = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self::with_env(project_dir, env)
    }

    /// Like `new`, with an explicit set of environment overrides.
    pub fn with_env(project_dir: PathBuf, env: HashMap<String, String>) -> Result<Self> {
        let config_dir = Self::resolve_config_dir(&project_dir);
        debug!(config_dir = %config_dir.display(), "loading configuration");
        let toml = TaskflowToml::load_or_default(&config_dir)?;
        Ok(Self {
            project_dir,
            config_dir,
            toml,
            env,
            verbose: false,
            offline: false,
        })
    }

    /// Create a TaskflowConfig with CLI overrides.
    pub fn with_cli_args(project_dir: PathBuf, verbose: bool, offline: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.offline = offline;
        Ok(config)
    }

    /// The project's `.taskflow` directory when it has a config file,
    /// otherwise the user-level one if that has a config file, otherwise
    /// the project's.
    fn resolve_config_dir(project_dir: &Path) -> PathBuf {
        let local = project_dir.join(CONFIG_DIR);
        if local.join(CONFIG_FILE).exists() {
            return local;
        }
        match dirs::config_dir().map(|d| d.join("taskflow")) {
            Some(user) if user.join(CONFIG_FILE).exists() => user,
            _ => local,
        }
    }

    fn env(&self, name: &str) -> Option<String> {
        self.env
            .get(&format!("{}{}", ENV_PREFIX, name))
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn session_file(&self) -> PathBuf {
        self.config_dir.join(SESSION_FILE)
    }

    /// Backend URL and key (env → file). Errors when either is missing.
    pub fn backend(&self) -> Result<BackendSettings> {
        let url = self
            .env("URL")
            .or_else(|| self.toml.backend.url.clone())
            .context("No backend URL configured. Set TASKFLOW_URL or backend.url in taskflow.toml, or use --offline")?;
        let anon_key = self
            .env("ANON_KEY")
            .or_else(|| self.toml.backend.anon_key.clone())
            .context("No backend key configured. Set TASKFLOW_ANON_KEY or backend.anon_key in taskflow.toml")?;
        Ok(BackendSettings { url, anon_key })
    }

    pub fn email(&self) -> Option<String> {
        self.env("EMAIL").or_else(|| self.toml.auth.email.clone())
    }

    /// Only ever read from the environment.
    pub fn password(&self) -> Option<String> {
        self.env("PASSWORD")
    }

    /// Log filter (CLI `--verbose` → env → file).
    pub fn log_level(&self) -> String {
        if self.verbose {
            return "debug".to_string();
        }
        self.env("LOG")
            .unwrap_or_else(|| self.toml.log.level.clone())
    }

    pub fn server_port(&self) -> u16 {
        self.toml.server.port
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }

    /// The cached session, if one exists and has not expired.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session: Session = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                return Ok(None);
            }
        };
        if session.is_expired(Utc::now()) {
            debug!("cached session has expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .with_context(|| format!("Failed to create {}", self.config_dir.display()))?;
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        let path = self.session_file();
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        Ok(())
    }

    /// Remove the cached session. Returns whether one existed.
    pub fn clear_session(&self) -> Result<bool> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove session file: {}", path.display()))?;
        Ok(true)
    }
}
