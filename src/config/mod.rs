//! Configuration management for `engage`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ENGAGE_*`)
//! 3. Project config (`./engage.yaml`)
//! 4. User config (`~/.config/engage/config.yaml`)
//! 5. Defaults
//!
//! Every layer is a flat map of dotted, kebab-case keys
//! (`report.top-n`, `tracker.base-url`). Typed views are built from the
//! merged layer on demand.

use crate::error::{ReportError, Result};
use crate::rules::CategoryRules;
use crate::tracker::CustomFields;
use crate::util::time::parse_date_arg;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variables read into the env layer.
pub const ENV_PREFIX: &str = "ENGAGE_";
/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "engage.yaml";

const DEFAULT_QUERY: &str = "ORDER BY created ASC";
const DEFAULT_START: &str = "2025-01-01";

/// Every key the typed views read.
pub const KNOWN_KEYS: &[&str] = &[
    "tracker.base-url",
    "tracker.query",
    "tracker.user",
    "tracker.token",
    "tracker.timeout-secs",
    "tracker.page-size",
    "tracker.story-points-field",
    "tracker.incident-count-field",
    "tickets.output",
    "report.prs",
    "report.comments",
    "report.start",
    "report.end",
    "report.top-n",
    "report.team-window",
    "report.developer-window",
    "report.min-periods",
    "report.denylist",
    "report.bot-markers",
    "report.output-dir",
    "rules-file",
];

/// A flat configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `(name, value)` pairs shaped like environment
    /// variables. Names without the `ENGAGE_` prefix or not matching a known
    /// key are ignored.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (name, value) in vars {
            let Some(stripped) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if let Some(key) = key_for_env(stripped) {
                layer.set(key, value);
            }
        }
        layer
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn get_usize(&self, key: &str, default: usize) -> Result<usize> {
        self.get(key).map_or(Ok(default), |value| {
            value
                .parse::<usize>()
                .map_err(|_| ReportError::Config(format!("{key} must be a whole number, got '{value}'")))
        })
    }

    fn get_u64(&self, key: &str, default: u64) -> Result<u64> {
        self.get(key).map_or(Ok(default), |value| {
            value
                .parse::<u64>()
                .map_err(|_| ReportError::Config(format!("{key} must be a whole number, got '{value}'")))
        })
    }

    fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    /// Merged values sorted by key, secrets masked.
    #[must_use]
    pub fn masked_entries(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(key, value)| {
                let shown = if key.contains("token") {
                    mask(value)
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect()
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub query: Option<String>,
    pub tickets_output: Option<PathBuf>,
    pub prs: Option<PathBuf>,
    pub comments: Option<PathBuf>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub top_n: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub rules_file: Option<PathBuf>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(query) = &self.query {
            layer.set("tracker.query", query.clone());
        }
        if let Some(path) = &self.tickets_output {
            layer.set("tickets.output", path.to_string_lossy());
        }
        if let Some(path) = &self.prs {
            layer.set("report.prs", path.to_string_lossy());
        }
        if let Some(path) = &self.comments {
            layer.set("report.comments", path.to_string_lossy());
        }
        if let Some(start) = &self.start {
            layer.set("report.start", start.clone());
        }
        if let Some(end) = &self.end {
            layer.set("report.end", end.clone());
        }
        if let Some(top_n) = self.top_n {
            layer.set("report.top-n", top_n.to_string());
        }
        if let Some(path) = &self.output_dir {
            layer.set("report.output-dir", path.to_string_lossy());
        }
        if let Some(path) = &self.rules_file {
            layer.set("rules-file", path.to_string_lossy());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let fields = CustomFields::default();
    layer.set("tracker.query", DEFAULT_QUERY);
    layer.set("tracker.timeout-secs", "30");
    layer.set("tracker.page-size", "100");
    layer.set("tracker.story-points-field", fields.story_points);
    layer.set("tracker.incident-count-field", fields.incident_count);
    layer.set("tickets.output", "jira_tickets.csv");
    layer.set("report.prs", "merged_prs.csv");
    layer.set("report.comments", "pr_comments.csv");
    layer.set("report.start", DEFAULT_START);
    layer.set("report.top-n", "10");
    layer.set("report.team-window", "14");
    layer.set("report.developer-window", "21");
    layer.set("report.min-periods", "3");
    layer.set("report.denylist", "josephdavis-fsp,gypseez22");
    layer.set("report.bot-markers", "bot,github-actions,app/github-actions");
    layer.set("report.output-dir", ".");
    layer
}

/// Path of the user config file, when a home directory is known.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    let home = env::var_os("HOME")?;
    Some(
        Path::new(&home)
            .join(".config")
            .join("engage")
            .join("config.yaml"),
    )
}

/// Load user config (~/.config/engage/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    user_config_path().map_or_else(|| Ok(ConfigLayer::default()), |path| ConfigLayer::from_yaml(&path))
}

/// Load project config (`engage.yaml` in `dir`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&dir.join(PROJECT_CONFIG_FILE))
}

/// Project layer: `explicit` when given (it must exist), else
/// `./engage.yaml` if present.
///
/// # Errors
///
/// Returns an error if the explicit file is absent, or a file cannot be
/// read or parsed.
pub fn load_project_layer(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.is_file() => Err(ReportError::missing_input(
            path,
            "Pass an existing YAML file to --config",
        )),
        Some(path) => ConfigLayer::from_yaml(path),
        None => load_project_config(Path::new(".")),
    }
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        load_project_layer(explicit)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Tracker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub base_url: String,
    pub query: String,
    pub timeout_secs: u64,
    pub page_size: usize,
    pub custom_fields: CustomFields,
    pub user: Option<String>,
    pub token: Option<String>,
}

impl TrackerSettings {
    /// # Errors
    ///
    /// Returns a config error if a numeric key does not parse.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = CustomFields::default();
        Ok(Self {
            base_url: layer.get("tracker.base-url").unwrap_or_default().to_string(),
            query: layer.get("tracker.query").unwrap_or(DEFAULT_QUERY).to_string(),
            timeout_secs: layer.get_u64("tracker.timeout-secs", 30)?,
            page_size: layer.get_usize("tracker.page-size", 100)?,
            custom_fields: CustomFields {
                story_points: layer
                    .get("tracker.story-points-field")
                    .map_or(defaults.story_points, str::to_string),
                incident_count: layer
                    .get("tracker.incident-count-field")
                    .map_or(defaults.incident_count, str::to_string),
            },
            user: layer.get("tracker.user").map(str::to_string),
            token: layer.get("tracker.token").map(str::to_string),
        })
    }
}

/// Developer report settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSettings {
    pub prs: PathBuf,
    pub comments: PathBuf,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub top_n: usize,
    pub team_window: usize,
    pub developer_window: usize,
    pub min_periods: usize,
    pub denylist: Vec<String>,
    pub bot_markers: Vec<String>,
    pub output_dir: PathBuf,
}

impl ReportSettings {
    /// # Errors
    ///
    /// Returns an error if a date or number does not parse, a window is zero,
    /// or the range is inverted.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let start = parse_date_arg(
            layer.get("report.start").unwrap_or(DEFAULT_START),
            "report.start",
        )?;
        let end = match layer.get("report.end") {
            Some(value) => parse_date_arg(value, "report.end")?,
            None => Local::now().date_naive(),
        };
        if start > end {
            return Err(ReportError::validation(
                "report.start",
                format!("{start} is after the end date {end}"),
            ));
        }

        let settings = Self {
            prs: layer
                .get_path("report.prs")
                .unwrap_or_else(|| PathBuf::from("merged_prs.csv")),
            comments: layer
                .get_path("report.comments")
                .unwrap_or_else(|| PathBuf::from("pr_comments.csv")),
            start,
            end,
            top_n: layer.get_usize("report.top-n", 10)?,
            team_window: layer.get_usize("report.team-window", 14)?,
            developer_window: layer.get_usize("report.developer-window", 21)?,
            min_periods: layer.get_usize("report.min-periods", 3)?,
            denylist: layer.get_list("report.denylist").unwrap_or_default(),
            bot_markers: layer.get_list("report.bot-markers").unwrap_or_default(),
            output_dir: layer
                .get_path("report.output-dir")
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        for (key, value) in [
            ("report.team-window", settings.team_window),
            ("report.developer-window", settings.developer_window),
            ("report.min-periods", settings.min_periods),
        ] {
            if value == 0 {
                return Err(ReportError::validation(key, "must be at least 1"));
            }
        }
        Ok(settings)
    }
}

/// Destination of the flat ticket export.
#[must_use]
pub fn tickets_output_from_layer(layer: &ConfigLayer) -> PathBuf {
    layer
        .get_path("tickets.output")
        .unwrap_or_else(|| PathBuf::from("jira_tickets.csv"))
}

/// Category rules: built-in defaults unless `rules-file` names a YAML file.
///
/// # Errors
///
/// Returns an error if the rules file cannot be read, parsed or validated.
pub fn rules_from_layer(layer: &ConfigLayer) -> Result<CategoryRules> {
    match layer.get_path("rules-file") {
        Some(path) if !path.is_file() => Err(ReportError::missing_input(
            path,
            "Point rules-file at an existing YAML rules file",
        )),
        Some(path) => CategoryRules::from_yaml(&path),
        None => Ok(CategoryRules::default()),
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

/// Map `TRACKER_BASE_URL` style names onto a known dotted key.
fn key_for_env(raw: &str) -> Option<&'static str> {
    let wanted = raw.to_lowercase();
    KNOWN_KEYS
        .iter()
        .copied()
        .find(|key| key.replace(['.', '-'], "_") == wanted)
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.set(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer(pairs: &[(&str, &str)]) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        for (key, value) in pairs {
            layer.set(key, *value);
        }
        layer
    }

    #[test]
    fn later_layers_win() {
        let merged = ConfigLayer::merge_layers(&[
            layer(&[("report.top-n", "10"), ("report.prs", "a.csv")]),
            layer(&[("report.top-n", "5")]),
        ]);
        assert_eq!(merged.get("report.top-n"), Some("5"));
        assert_eq!(merged.get("report.prs"), Some("a.csv"));
    }

    #[test]
    fn yaml_is_flattened_to_dotted_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("engage.yaml");
        fs::write(
            &path,
            "tracker:\n  base_url: https://example.atlassian.net\nreport:\n  top-n: 3\n  denylist:\n    - alice\n    - bob\n",
        )
        .unwrap();

        let layer = ConfigLayer::from_yaml(&path).unwrap();
        assert_eq!(layer.get("tracker.base-url"), Some("https://example.atlassian.net"));
        assert_eq!(layer.get("report.top-n"), Some("3"));
        assert_eq!(layer.get("report.denylist"), Some("alice,bob"));
    }

    #[test]
    fn missing_yaml_is_empty() {
        let layer = ConfigLayer::from_yaml(Path::new("/nonexistent/engage.yaml")).unwrap();
        assert!(layer.values.is_empty());
    }

    #[test]
    fn env_vars_map_to_known_keys() {
        let layer = ConfigLayer::from_env_vars(vec![
            ("ENGAGE_TRACKER_BASE_URL".to_string(), "https://x".to_string()),
            ("ENGAGE_REPORT_TOP_N".to_string(), "4".to_string()),
            ("ENGAGE_UNRELATED".to_string(), "ignored".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(layer.get("tracker.base-url"), Some("https://x"));
        assert_eq!(layer.get("report.top-n"), Some("4"));
        assert_eq!(layer.values.len(), 2);
    }

    #[test]
    fn cli_overrides_become_a_layer() {
        let cli = CliOverrides {
            top_n: Some(2),
            start: Some("2025-02-01".into()),
            ..CliOverrides::default()
        };
        let merged = ConfigLayer::merge_layers(&[default_config_layer(), cli.as_layer()]);
        assert_eq!(merged.get("report.top-n"), Some("2"));
        assert_eq!(merged.get("report.start"), Some("2025-02-01"));
    }

    #[test]
    fn report_settings_from_defaults() {
        let mut defaults = default_config_layer();
        defaults.set("report.end", "2025-03-01");
        let settings = ReportSettings::from_layer(&defaults).unwrap();
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(settings.top_n, 10);
        assert_eq!(settings.team_window, 14);
        assert_eq!(settings.developer_window, 21);
        assert_eq!(settings.min_periods, 3);
        assert_eq!(settings.bot_markers, vec!["bot", "github-actions", "app/github-actions"]);
        assert_eq!(settings.denylist.len(), 2);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let layer = layer(&[("report.start", "2025-03-01"), ("report.end", "2025-01-01")]);
        let err = ReportSettings::from_layer(&layer).unwrap_err();
        assert!(matches!(err, ReportError::Validation { .. }));
    }

    #[test]
    fn bad_number_is_config_error() {
        let layer = layer(&[("report.top-n", "many"), ("report.end", "2025-02-01")]);
        assert!(matches!(
            ReportSettings::from_layer(&layer),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn tracker_settings_read_custom_fields() {
        let mut layer = default_config_layer();
        layer.set("tracker.story-points-field", "customfield_1");
        layer.set("tracker.token", "secret");
        let settings = TrackerSettings::from_layer(&layer).unwrap();
        assert_eq!(settings.custom_fields.story_points, "customfield_1");
        assert_eq!(settings.custom_fields.incident_count, "customfield_10272");
        assert_eq!(settings.token.as_deref(), Some("secret"));
        assert!(settings.base_url.is_empty());
    }

    #[test]
    fn tokens_are_masked() {
        let layer = layer(&[("tracker.token", "secret"), ("tracker.user", "me")]);
        let entries = layer.masked_entries();
        assert_eq!(entries["tracker.token"], "********");
        assert_eq!(entries["tracker.user"], "me");
    }

    #[test]
    fn rules_default_without_file() {
        let rules = rules_from_layer(&ConfigLayer::default()).unwrap();
        assert_eq!(rules, CategoryRules::default());
    }

    #[test]
    fn missing_rules_file_is_missing_input() {
        let layer = layer(&[("rules-file", "/nonexistent/rules.yaml")]);
        assert!(matches!(
            rules_from_layer(&layer),
            Err(ReportError::MissingInput { .. })
        ));
    }
}
