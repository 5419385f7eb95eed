//! Configuration types for ranklab.
//!
//! Uses `figment` for layered configuration: defaults -> user file -> workspace file ->
//! environment -> explicit overrides.

use crate::error::MetricError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Policy for query groups that have no relevant item after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EmptyTargetAction {
    /// Fail the whole computation.
    Error,
    /// Leave the query out of the mean.
    Skip,
    /// Count the query as 0.
    #[default]
    Neg,
    /// Count the query as 1.
    Pos,
}

impl EmptyTargetAction {
    pub const ALL: [EmptyTargetAction; 4] = [Self::Error, Self::Skip, Self::Neg, Self::Pos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Skip => "skip",
            Self::Neg => "neg",
            Self::Pos => "pos",
        }
    }
}

impl fmt::Display for EmptyTargetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmptyTargetAction {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "skip" => Ok(Self::Skip),
            "neg" => Ok(Self::Neg),
            "pos" => Ok(Self::Pos),
            other => Err(MetricError::InvalidEmptyTargetAction(other.to_string())),
        }
    }
}

impl TryFrom<String> for EmptyTargetAction {
    type Error = MetricError;

    fn try_from(value: String) -> Result<Self, MetricError> {
        value.parse()
    }
}

impl From<EmptyTargetAction> for String {
    fn from(action: EmptyTargetAction) -> Self {
        action.as_str().to_string()
    }
}

/// Arguments of a retrieval metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricConfig {
    /// What to do with queries that have no positive target.
    #[serde(default)]
    pub empty_target_action: EmptyTargetAction,
    /// Target value marking items to drop before scoring.
    #[serde(default)]
    pub ignore_index: Option<i64>,
}

impl MetricConfig {
    pub fn new(empty_target_action: EmptyTargetAction, ignore_index: Option<i64>) -> Self {
        Self {
            empty_target_action,
            ignore_index,
        }
    }

    /// Build from the textual action name, validating it.
    pub fn from_args(
        empty_target_action: &str,
        ignore_index: Option<i64>,
    ) -> Result<Self, MetricError> {
        Ok(Self::new(empty_target_action.parse()?, ignore_index))
    }
}

/// Simulated data-parallel evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedConfig {
    /// Number of simulated workers; 1 runs everything in a single state.
    #[serde(default = "default_world_size")]
    pub world_size: usize,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            world_size: default_world_size(),
        }
    }
}

fn default_world_size() -> usize {
    1
}

/// Logging configuration for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when no verbosity flag is given.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for rolling JSON logs. Disabled when unset.
    #[serde(default)]
    pub json_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level ranklab configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RanklabConfig {
    #[serde(default)]
    pub metric: MetricConfig,
    #[serde(default)]
    pub distributed: DistributedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "ranklab", "ranklab")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `RANKLAB_`)
/// 3. Workspace-local config (`.ranklab/config.toml`)
/// 4. User config (`~/.config/ranklab/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RanklabConfig>,
) -> Result<RanklabConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RanklabConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".ranklab").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // RANKLAB_METRIC__EMPTY_TARGET_ACTION, RANKLAB_DISTRIBUTED__WORLD_SIZE, ...
    figment = figment.merge(Env::prefixed("RANKLAB_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_action_round_trips_through_text() {
        for action in EmptyTargetAction::ALL {
            assert_eq!(action.as_str().parse::<EmptyTargetAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_action_from_owned_string() {
        assert_eq!(
            EmptyTargetAction::try_from("error".to_string()).unwrap(),
            EmptyTargetAction::Error
        );
        assert!(EmptyTargetAction::try_from("casual".to_string()).is_err());
    }

    #[test]
    fn test_invalid_action_names_allowed_values() {
        let err = "invalid_value".parse::<EmptyTargetAction>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`invalid_value`"));
        for allowed in ["skip", "neg", "pos"] {
            assert!(msg.contains(&format!("`{allowed}`")), "missing {allowed} in {msg}");
        }
    }

    #[test]
    fn test_metric_config_deserialize() {
        let config: MetricConfig =
            serde_json::from_str(r#"{"empty_target_action": "skip", "ignore_index": -100}"#)
                .unwrap();
        assert_eq!(config.empty_target_action, EmptyTargetAction::Skip);
        assert_eq!(config.ignore_index, Some(-100));

        let err = serde_json::from_str::<MetricConfig>(r#"{"empty_target_action": "casual"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("received a wrong value `casual`"));
    }

    #[test]
    fn test_defaults() {
        let config = RanklabConfig::default();
        assert_eq!(config.metric.empty_target_action, EmptyTargetAction::Neg);
        assert_eq!(config.metric.ignore_index, None);
        assert_eq!(config.distributed.world_size, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_workspace_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".ranklab");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[metric]\nempty_target_action = \"pos\"\nignore_index = -100\n\n[distributed]\nworld_size = 3\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.metric.empty_target_action, EmptyTargetAction::Pos);
        assert_eq!(config.metric.ignore_index, Some(-100));
        assert_eq!(config.distributed.world_size, 3);
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = RanklabConfig::default();
        overrides.metric.empty_target_action = EmptyTargetAction::Skip;
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.metric.empty_target_action, EmptyTargetAction::Skip);
    }
}
