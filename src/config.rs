//! Configuration: group rules from YAML, canvas settings from environment.
//!
//! A rules file looks like:
//!
//! ```yaml
//! rules:
//!   - { pattern: "^app/", color: red }
//!   - { pattern: ".", color: gray }
//! palette:
//!   red: "#cc0000"
//! strokes:
//!   gray: "#333333"
//! ```
//!
//! Rule order in the file is classification order. The optional `palette`
//! map overrides or extends the default sticky-note fills, and `strokes`
//! does the same for connector colors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::classify::GroupRule;
use crate::error::ErrorCode;
use crate::palette::Palette;
use crate::rate_limit::{DEFAULT_CALL_LIMIT, DEFAULT_WINDOW_SECS, RateLimitConfig};

pub const DEFAULT_CANVAS_BASE_URL: &str = "https://api.miro.com/v2";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Color of the single rule used when no rules file is given.
pub const DEFAULT_RULE_COLOR: &str = "gray";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rules file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid rule pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("rules file contains no rules")]
    NoRules,
    #[error("missing canvas token: set {var}")]
    MissingToken { var: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_CONFIG_IO",
            Self::Yaml(_) => "E_CONFIG_YAML",
            Self::InvalidPattern { .. } => "E_CONFIG_INVALID_PATTERN",
            Self::NoRules => "E_CONFIG_NO_RULES",
            Self::MissingToken { .. } => "E_CONFIG_MISSING_TOKEN",
        }
    }
}

// =============================================================================
// RULES FILE
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    rules: Vec<RuleEntry>,
    #[serde(default)]
    palette: BTreeMap<String, String>,
    #[serde(default)]
    strokes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    pattern: String,
    color: String,
}

/// Ordered rules plus the palette used to turn their colors into hex.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub rules: Vec<GroupRule>,
    pub palette: Palette,
}

impl Default for RuleSet {
    /// A single catch-all rule and the default palette.
    fn default() -> Self {
        Self { rules: vec![GroupRule::catch_all(DEFAULT_RULE_COLOR)], palette: Palette::default() }
    }
}

impl RuleSet {
    /// Rule colors the palette has no entry for, in rule order.
    #[must_use]
    pub fn unknown_colors(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|rule| rule.color.as_str())
            .filter(|color| !self.palette.contains(color))
            .collect()
    }
}

/// Parse a rules document.
///
/// # Errors
///
/// Returns `Yaml` for malformed documents, `InvalidPattern` for the first
/// pattern that does not compile, and `NoRules` for an empty rule list.
pub fn parse_rules(yaml: &str) -> Result<RuleSet, ConfigError> {
    let file: RulesFile = serde_yaml::from_str(yaml)?;
    if file.rules.is_empty() {
        return Err(ConfigError::NoRules);
    }

    let rules = file
        .rules
        .into_iter()
        .map(|entry| {
            GroupRule::new(&entry.pattern, entry.color)
                .map_err(|source| ConfigError::InvalidPattern { pattern: entry.pattern, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let palette = file
        .palette
        .iter()
        .fold(Palette::default(), |palette, (name, hex)| palette.with_color(name, hex));
    let palette = file
        .strokes
        .iter()
        .fold(palette, |palette, (name, hex)| palette.with_stroke(name, hex));

    let set = RuleSet { rules, palette };
    for color in set.unknown_colors() {
        warn!(color, fallback = set.palette.fallback(), "rule color not in palette; using fallback");
    }
    Ok(set)
}

/// Read and parse the rules file at `path`.
///
/// # Errors
///
/// Returns `Io` if the file is unreadable, otherwise as [`parse_rules`].
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse_rules(&text)
}

// =============================================================================
// CANVAS CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasConfig {
    pub token: String,
    pub base_url: String,
    pub rate_limit: RateLimitConfig,
    pub max_retries: u32,
    pub timeouts: CanvasTimeouts,
}

impl CanvasConfig {
    /// Build typed canvas config from environment variables.
    ///
    /// Required:
    /// - `CANVAS_TOKEN_ENV` (names the env var containing the bearer token)
    ///
    /// Optional:
    /// - `CANVAS_BASE_URL`: default `https://api.miro.com/v2`
    /// - `CANVAS_RATE_LIMIT`: calls per window, default 900
    /// - `CANVAS_RATE_WINDOW_SECS`: default 60
    /// - `CANVAS_MAX_RETRIES`: retries after HTTP 429, default 5
    /// - `CANVAS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CANVAS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `MissingToken` naming whichever variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_var = std::env::var("CANVAS_TOKEN_ENV")
            .map_err(|_| ConfigError::MissingToken { var: "CANVAS_TOKEN_ENV".into() })?;
        let token = std::env::var(&token_var).map_err(|_| ConfigError::MissingToken { var: token_var.clone() })?;

        let base_url = std::env::var("CANVAS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_CANVAS_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let rate_limit = RateLimitConfig {
            limit: env_parse("CANVAS_RATE_LIMIT", DEFAULT_CALL_LIMIT),
            window: Duration::from_secs(env_parse("CANVAS_RATE_WINDOW_SECS", DEFAULT_WINDOW_SECS)),
        };
        let timeouts = CanvasTimeouts {
            request_secs: env_parse("CANVAS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("CANVAS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            token,
            base_url,
            rate_limit,
            max_retries: env_parse("CANVAS_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            timeouts,
        })
    }
}

/// Unset or unparseable values use `default`.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
