//! Flatastic service configuration
//!
//! Typed form of the `flatastic:` section of the config file. Required
//! fields fail at load time, everything else falls back to a default.

use crate::taskwarrior::Priority;
use crate::{ChoreSyncError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Production API root; `/api/...` paths hang off it
pub const DEFAULT_BASE_URL: &str = "https://api.flatastic-app.com/index.php";

/// Prefix marking a password that should be read from the environment
const ENV_PREFIX: &str = "@env:";

/// Flatastic service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatasticConfig {
    /// Account email used to log in
    pub email: String,

    /// Account password, or `@env:VAR` to read it from the environment
    pub password: String,

    /// API root (overridable for testing against a local server)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Boards to include (accepted for compatibility; chores carry no board)
    #[serde(default, deserialize_with = "deserialize_config_list")]
    pub include_board_ids: Vec<String>,

    /// Boards to exclude (accepted for compatibility; chores carry no board)
    #[serde(default, deserialize_with = "deserialize_config_list")]
    pub exclude_board_ids: Vec<String>,

    /// Turn service labels into taskwarrior tags
    #[serde(default)]
    pub import_labels_as_tags: bool,

    /// Jinja template applied to each label, with `label` in scope
    #[serde(default = "default_label_template")]
    pub label_template: String,

    /// Only keep chores currently assigned to this Flatastic user id
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub only_if_assigned: Option<String>,

    /// With `only_if_assigned`, also keep chores nobody is assigned to
    #[serde(default)]
    pub also_unassigned: bool,

    /// Priority given to every imported task
    #[serde(default)]
    pub default_priority: Priority,

    /// Tags added to every imported task
    #[serde(default, deserialize_with = "deserialize_config_list")]
    pub add_tags: Vec<String>,

    /// Truncate task descriptions to this many characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_length: Option<usize>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_label_template() -> String {
    "{{label}}".to_string()
}

impl FlatasticConfig {
    /// Create a configuration with defaults for everything but credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            base_url: default_base_url(),
            include_board_ids: Vec::new(),
            exclude_board_ids: Vec::new(),
            import_labels_as_tags: false,
            label_template: default_label_template(),
            only_if_assigned: None,
            also_unassigned: false,
            default_priority: Priority::default(),
            add_tags: Vec::new(),
            description_length: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_only_if_assigned(mut self, user_id: impl Into<String>) -> Self {
        self.only_if_assigned = Some(user_id.into());
        self
    }

    /// Resolve the password, following an `@env:VAR` reference if present
    pub fn resolve_password(&self) -> Result<String> {
        match self.password.strip_prefix(ENV_PREFIX) {
            Some(var) => std::env::var(var.trim_start_matches('$')).map_err(|_| {
                ChoreSyncError::Config(format!(
                    "Password environment variable {} is not set",
                    var
                ))
            }),
            None => Ok(self.password.clone()),
        }
    }

    /// API root without a trailing slash
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Accepts either a YAML sequence or a comma-separated string
fn deserialize_config_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ConfigList {
        Items(Vec<ScalarId>),
        Joined(String),
    }

    Ok(match Option::<ConfigList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ConfigList::Items(items)) => items.into_iter().map(ScalarId::into_string).collect(),
        Some(ConfigList::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// User ids are numbers on the wire but compared as strings
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ScalarId>::deserialize(deserializer)?.map(ScalarId::into_string))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarId {
    Number(i64),
    Text(String),
}

impl ScalarId {
    fn into_string(self) -> String {
        match self {
            ScalarId::Number(n) => n.to_string(),
            ScalarId::Text(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = "email: me@example.com\npassword: hunter2\n";
        let config: FlatasticConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.email, "me@example.com");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.label_template, "{{label}}");
        assert!(!config.import_labels_as_tags);
        assert!(config.only_if_assigned.is_none());
        assert!(config.include_board_ids.is_empty());
        assert_eq!(config.default_priority, Priority::Medium);
    }

    #[test]
    fn test_missing_password_rejected() {
        let yaml = "email: me@example.com\n";
        let result: std::result::Result<FlatasticConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_only_if_assigned() {
        let yaml = "email: a@b.c\npassword: x\nonly_if_assigned: 7\n";
        let config: FlatasticConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.only_if_assigned.as_deref(), Some("7"));
    }

    #[test]
    fn test_board_ids_as_comma_string() {
        let yaml = "email: a@b.c\npassword: x\ninclude_board_ids: \"1, 2,3\"\nexclude_board_ids: [4, five]\n";
        let config: FlatasticConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.include_board_ids, vec!["1", "2", "3"]);
        assert_eq!(config.exclude_board_ids, vec!["4", "five"]);
    }

    #[test]
    fn test_resolve_plain_password() {
        let config = FlatasticConfig::new("a@b.c", "plain");
        assert_eq!(config.resolve_password().unwrap(), "plain");
    }

    #[test]
    fn test_resolve_env_password() {
        std::env::set_var("CHOREWARRIOR_TEST_PASSWORD", "from-env");
        let config = FlatasticConfig::new("a@b.c", "@env:CHOREWARRIOR_TEST_PASSWORD");
        assert_eq!(config.resolve_password().unwrap(), "from-env");

        let missing = FlatasticConfig::new("a@b.c", "@env:CHOREWARRIOR_TEST_UNSET_VAR");
        assert!(matches!(
            missing.resolve_password(),
            Err(ChoreSyncError::Config(_))
        ));
    }

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let config = FlatasticConfig::new("a@b.c", "x").with_base_url("http://localhost:1234/");
        assert_eq!(config.api_root(), "http://localhost:1234");
    }
}
