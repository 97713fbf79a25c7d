// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::discovery::DEFAULT_PATTERNS;
use crate::types::{RestartPolicy, WatchOptions};

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [watcher]
/// interval = "30s"
/// max_restarts = 3
/// restart_window = "5s"
///
/// [discovery]
/// patterns = ["**/*.md"]
/// exclude = ["target/**"]
///
/// [[project]]
/// path = "docs"
/// interval = "10s"
/// ```
///
/// All sections are optional and have reasonable defaults. Durations stay
/// strings here; [`ConfigFile`] is the validated, typed form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watcher: WatcherSection,

    #[serde(default)]
    pub discovery: DiscoverySection,

    /// `[[project]]` entries, watched at startup.
    #[serde(default)]
    pub project: Vec<ProjectConfig>,
}

/// `[watcher]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatcherSection {
    /// Default poll interval, e.g. `"30s"` or `"500ms"`.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Abnormal exits tolerated within `restart_window` before giving up.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    #[serde(default = "default_restart_window")]
    pub restart_window: String,
}

fn default_interval() -> String {
    "30s".to_string()
}

fn default_max_restarts() -> u32 {
    RestartPolicy::default().max_restarts
}

fn default_restart_window() -> String {
    "5s".to_string()
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_restarts: default_max_restarts(),
            restart_window: default_restart_window(),
        }
    }
}

/// `[discovery]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    /// Patterns registered with the built-in discovery collaborator.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Exclude patterns applied to projects that do not set their own.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            exclude: Vec::new(),
        }
    }
}

/// `[[project]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub path: PathBuf,

    /// Overrides `[watcher].interval` for this project.
    #[serde(default)]
    pub interval: Option<String>,

    /// Replaces `[discovery].exclude` for this project.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

/// A project resolved against the global defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub path: PathBuf,
    pub options: WatchOptions,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Options applied to paths that have no `[[project]]` entry.
    pub defaults: WatchOptions,
    pub restart_policy: RestartPolicy,
    pub patterns: Vec<String>,
    pub projects: Vec<ProjectSpec>,
}

impl ConfigFile {
    /// Options for `path`: its `[[project]]` entry if any, else the defaults.
    pub fn options_for(&self, path: &std::path::Path) -> WatchOptions {
        self.projects
            .iter()
            .find(|p| p.path == path)
            .map(|p| p.options.clone())
            .unwrap_or_else(|| self.defaults.clone())
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            defaults: WatchOptions::default(),
            restart_policy: RestartPolicy::default(),
            patterns: default_patterns(),
            projects: Vec::new(),
        }
    }
}
