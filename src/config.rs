// Configuration module for ttfx-ingest
// Reads from environment variables with sensible defaults

use clap::ValueEnum;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// What to do with a run whose directory path does not carry package/task labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PathPolicy {
    /// Keep the run under placeholder labels and count it as unlabeled.
    Placeholder,
    /// Reject the run like any other mandatory-stage failure.
    Reject,
}

impl FromStr for PathPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "placeholder" => Ok(PathPolicy::Placeholder),
            "reject" => Ok(PathPolicy::Reject),
            other => Err(format!("unknown path policy: {other}")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path segment that marks the root of the snippet corpus (TTFX_ANCHOR)
    pub anchor: String,

    /// Handling of unresolvable paths (TTFX_PATH_POLICY)
    pub path_policy: PathPolicy,

    /// Label used for package and task when the path cannot be resolved (TTFX_UNKNOWN_LABEL)
    pub unknown_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anchor: "snippets".to_string(),
            path_policy: PathPolicy::Placeholder,
            unknown_label: "Unknown".to_string(),
        }
    }
}

/// Anchor names a single path segment. Surrounding whitespace and slashes
/// are dropped; an empty value or one spanning several segments is an error.
pub fn parse_anchor(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err("anchor is empty".to_string());
    }
    if trimmed.contains('/') {
        return Err(format!("anchor '{trimmed}' spans more than one path segment"));
    }
    Ok(trimmed.to_string())
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("TTFX_ANCHOR") {
            match parse_anchor(&val) {
                Ok(anchor) => config.anchor = anchor,
                Err(err) => tracing::warn!(
                    value = %val,
                    default = %config.anchor,
                    "invalid TTFX_ANCHOR ({err}), using default"
                ),
            }
        }

        if let Ok(val) = env::var("TTFX_PATH_POLICY") {
            match val.parse() {
                Ok(policy) => config.path_policy = policy,
                Err(err) => tracing::warn!(
                    value = %val,
                    "invalid TTFX_PATH_POLICY ({err}), using default: placeholder"
                ),
            }
        }

        if let Ok(val) = env::var("TTFX_UNKNOWN_LABEL") {
            if !val.trim().is_empty() {
                config.unknown_label = val.trim().to_string();
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.anchor, "snippets");
        assert_eq!(config.path_policy, PathPolicy::Placeholder);
        assert_eq!(config.unknown_label, "Unknown");
    }

    #[test]
    fn path_policy_parses_case_insensitively() {
        assert_eq!("Reject".parse::<PathPolicy>(), Ok(PathPolicy::Reject));
        assert_eq!(" placeholder ".parse::<PathPolicy>(), Ok(PathPolicy::Placeholder));
        assert!("drop".parse::<PathPolicy>().is_err());
    }

    #[test]
    fn anchor_is_one_segment() {
        assert_eq!(parse_anchor("snippets/"), Ok("snippets".to_string()));
        assert_eq!(parse_anchor(" /bench/ "), Ok("bench".to_string()));
        assert!(parse_anchor("a/b").is_err());
        assert!(parse_anchor("").is_err());
        assert!(parse_anchor("//").is_err());
    }
}
