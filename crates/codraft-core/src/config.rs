//! Configuration loading and discovery.
//!
//! Settings are merged from, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user config, `config.<ext>` in the platform config directory
//!    (`~/.config/codraft/` on Linux)
//! 3. the nearest project config: `.codraft.<ext>` then `codraft.<ext>`,
//!    searched from the starting directory upwards, stopping at a `.git`
//!    directory
//! 4. files passed with [`ConfigLoader::with_file`], in order
//! 5. `CODRAFT_*` environment variables (`CODRAFT_DATA_DIR`, `CODRAFT_USER`,
//!    `CODRAFT_DEFAULT_LIMIT__UNIT`, ...)
//!
//! `<ext>` is one of `toml`, `yaml`, `yml`, `json`. Several files in the same
//! directory are all merged, in that extension order.
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use codraft_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
//! let (config, sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("drafts live in {:?}", config.data_dir);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, DraftResult};
use crate::lifecycle::DEFAULT_MAX_APPEND_ATTEMPTS;
use crate::model::{Limit, LimitUnit};

/// Default ceiling on text read from files or stdin: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Settings for the codraft CLI and MCP server.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application.
    pub log_level: LogLevel,
    /// Directory for JSONL log files.
    pub log_dir: Option<Utf8PathBuf>,
    /// Where drafts are stored. Defaults to the platform data directory.
    pub data_dir: Option<Utf8PathBuf>,
    /// Acting user when `--as` is not given.
    pub user: Option<String>,
    /// Maximum size of a text input in bytes (default 5 MiB).
    pub max_input_bytes: Option<usize>,
    /// Skip the input size check entirely; `max_input_bytes` is then ignored.
    pub disable_input_limit: bool,
    /// Validate-and-append attempts before a busy draft is reported as
    /// contended (default 8).
    pub max_append_attempts: Option<u32>,
    /// Limit used by `codraft new` when `--unit`/`--quantity` are omitted.
    pub default_limit: Option<DefaultLimit>,
}

impl Config {
    /// Effective input size ceiling, or `None` when the check is disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// Effective retry budget for contributions.
    pub fn append_attempts(&self) -> u32 {
        self.max_append_attempts
            .unwrap_or(DEFAULT_MAX_APPEND_ATTEMPTS)
            .max(1)
    }

    /// Configured data directory, falling back to the platform default.
    pub fn resolved_data_dir(&self) -> Option<Utf8PathBuf> {
        self.data_dir.clone().or_else(user_data_dir)
    }
}

/// A per-contribution limit as written in a config file.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct DefaultLimit {
    /// Measurement unit.
    pub unit: LimitUnit,
    /// Units per contribution.
    pub quantity: i64,
}

impl DefaultLimit {
    /// Check the quantity and build a [`Limit`].
    pub fn to_limit(self) -> DraftResult<Limit> {
        Limit::new(self.unit, self.quantity)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-request detail.
    Debug,
    /// Operations and their outcomes (default).
    #[default]
    Info,
    /// Only things that look wrong.
    Warn,
    /// Only failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which files contributed to a loaded [`Config`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project files, lowest precedence first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// The user config file, if one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Files given explicitly, e.g. with `--config`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// The highest-precedence file that was loaded.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .or_else(|| self.project_files.last())
            .map(Utf8PathBuf::as_path)
            .or(self.user_file.as_deref())
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

const APP_NAME: &str = "codraft";

const ENV_PREFIX: &str = "CODRAFT_";

/// Builder that discovers and merges configuration sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// A loader that reads the user config and stops project search at `.git`.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Search for project config starting at `path` and walking up.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Whether to read the user config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Load `path` after everything discovered. Later files win.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source and deserialize the result.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_file) = self.find_user_config()
        {
            figment = merge_file(figment, &user_file);
            sources.user_file = Some(user_file);
        }

        if let Some(root) = &self.project_search_root {
            sources.project_files = self.find_project_configs(root);
            for file in &sources.project_files {
                figment = merge_file(figment, file);
            }
        }

        for file in &self.explicit_files {
            figment = merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        figment = figment.merge(Env::prefixed(ENV_PREFIX).lowercase(true).split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            data_dir = ?config.data_dir,
            primary = ?sources.primary_file(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Config files in the nearest directory (from `start` upwards) that has
    /// any, dotfiles before plain names.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let found: Vec<Utf8PathBuf> = [format!(".{APP_NAME}"), APP_NAME.to_string()]
                .iter()
                .flat_map(|stem| {
                    CONFIG_EXTENSIONS
                        .iter()
                        .map(move |ext| dir.join(format!("{stem}.{ext}")))
                })
                .filter(|path| path.is_file())
                .collect();

            if !found.is_empty() {
                return found;
            }

            // A config beside the marker still counts.
            if let Some(marker) = &self.boundary_marker
                && dir != start
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent();
        }

        Vec::new()
    }

    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Platform config directory, e.g. `~/.config/codraft/`.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.config_dir().to_path_buf()).ok()
}

/// Platform data directory, e.g. `~/.local/share/codraft/`. Drafts are stored
/// here unless `data_dir` says otherwise.
pub fn user_data_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.data_dir().to_path_buf()).ok()
}
