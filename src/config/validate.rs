// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::model::{ConfigFile, ProjectSpec, RawConfigFile};
use crate::discovery::build_globset;
use crate::errors::{Result, WatchError};
use crate::types::{parse_duration, RestartPolicy, WatchOptions};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interval = positive_duration("[watcher].interval", &raw.watcher.interval)?;
        let window = positive_duration("[watcher].restart_window", &raw.watcher.restart_window)?;

        validate_patterns("[discovery].patterns", &raw.discovery.patterns)?;
        validate_patterns("[discovery].exclude", &raw.discovery.exclude)?;

        let defaults = WatchOptions {
            interval,
            exclude: raw.discovery.exclude.clone(),
        };

        let projects = resolve_projects(&raw, &defaults)?;

        Ok(ConfigFile {
            defaults,
            restart_policy: RestartPolicy {
                max_restarts: raw.watcher.max_restarts,
                window,
            },
            patterns: raw.discovery.patterns,
            projects,
        })
    }
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| WatchError::ConfigError(format!("{field}: {e}")))?;
    if duration.is_zero() {
        return Err(WatchError::ConfigError(format!(
            "{field} must be greater than zero (got {value:?})"
        )));
    }
    Ok(duration)
}

fn validate_patterns(field: &str, patterns: &[String]) -> Result<()> {
    build_globset(patterns)
        .map(|_| ())
        .map_err(|e| WatchError::ConfigError(format!("{field}: {e:#}")))
}

fn resolve_projects(raw: &RawConfigFile, defaults: &WatchOptions) -> Result<Vec<ProjectSpec>> {
    let mut seen = HashSet::new();
    let mut projects = Vec::with_capacity(raw.project.len());

    for project in &raw.project {
        if project.path.as_os_str().is_empty() {
            return Err(WatchError::ConfigError(
                "[[project]].path must not be empty".to_string(),
            ));
        }
        if !seen.insert(project.path.clone()) {
            return Err(WatchError::ConfigError(format!(
                "project {:?} is listed more than once",
                project.path
            )));
        }

        let field = format!("[[project]] {:?}", project.path);
        let interval = match &project.interval {
            Some(value) => positive_duration(&format!("{field} interval"), value)?,
            None => defaults.interval,
        };
        let exclude = match &project.exclude {
            Some(list) => {
                validate_patterns(&format!("{field} exclude"), list)?;
                list.clone()
            }
            None => defaults.exclude.clone(),
        };

        projects.push(ProjectSpec {
            path: project.path.clone(),
            options: WatchOptions { interval, exclude },
        });
    }

    Ok(projects)
}
