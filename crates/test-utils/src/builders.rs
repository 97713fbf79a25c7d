#![allow(dead_code)]

use std::path::Path;

use pollwatch::config::{ConfigFile, ProjectConfig, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.config.watcher.interval = interval.to_string();
        self
    }

    pub fn max_restarts(mut self, max: u32) -> Self {
        self.config.watcher.max_restarts = max;
        self
    }

    pub fn restart_window(mut self, window: &str) -> Self {
        self.config.watcher.restart_window = window.to_string();
        self
    }

    /// Replace the default pattern list with exactly `patterns`.
    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.config.discovery.patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.discovery.exclude.push(pattern.to_string());
        self
    }

    pub fn with_project(mut self, path: impl AsRef<Path>, interval: Option<&str>) -> Self {
        self.config.project.push(ProjectConfig {
            path: path.as_ref().to_path_buf(),
            interval: interval.map(str::to_string),
            exclude: None,
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
