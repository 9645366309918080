//! Settings that control how a composition is run.
use crate::errors::{RSMIError, RSMIResult};
use crate::time::Time;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which buffered output values are kept during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Discard values that no consumer can ask for any more.
    #[default]
    ConsumerHorizon,
    /// Keep every value produced during the run.
    KeepAll,
}

/// Run settings, usually read from the `[run]` part of a run description.
///
/// ```toml
/// max_pull_depth = 32
/// end_time = 51840.0
/// retention = "keep_all"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Maximum number of nested pulls before a run is aborted.
    pub max_pull_depth: usize,
    /// Stop every component at this time, even if its horizon extends further.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Time>,
    pub retention: Retention,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_pull_depth: 64,
            end_time: None,
            retention: Retention::default(),
        }
    }
}

impl RunSettings {
    pub fn from_toml_str(contents: &str) -> RSMIResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RSMIResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> RSMIResult<String> {
        toml::to_string(self).map_err(|e| RSMIError::Error(e.to_string()))
    }

    pub fn with_end_time(mut self, end_time: Time) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_max_pull_depth(mut self, max_pull_depth: usize) -> Self {
        self.max_pull_depth = max_pull_depth;
        self
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = RunSettings::from_toml_str("").unwrap();
        assert_eq!(settings, RunSettings::default());
        assert_eq!(settings.max_pull_depth, 64);
        assert_eq!(settings.end_time, None);
        assert_eq!(settings.retention, Retention::ConsumerHorizon);
    }

    #[test]
    fn from_toml() {
        let settings = RunSettings::from_toml_str(
            r#"
max_pull_depth = 8
end_time = 17280.0
retention = "keep_all"
"#,
        )
        .unwrap();
        assert_eq!(settings.max_pull_depth, 8);
        assert_eq!(settings.end_time, Some(17280.0));
        assert_eq!(settings.retention, Retention::KeepAll);

        let serialised = settings.to_toml_string().unwrap();
        assert_eq!(RunSettings::from_toml_str(&serialised).unwrap(), settings);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = RunSettings::from_toml_str("max_depth = 8");
        assert!(matches!(res, Err(RSMIError::Config(_))));
    }

    #[test]
    fn missing_file() {
        let res = RunSettings::from_file("/nonexistent/run.toml");
        assert!(matches!(res, Err(RSMIError::Io(_))));
    }
}
