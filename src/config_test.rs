use std::io::Write;
use std::sync::{Mutex, PoisonError};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK` so no other test touches the environment.
unsafe fn clear_canvas_env() {
    unsafe {
        std::env::remove_var("CANVAS_TOKEN_ENV");
        std::env::remove_var("CANVAS_BASE_URL");
        std::env::remove_var("CANVAS_RATE_LIMIT");
        std::env::remove_var("CANVAS_RATE_WINDOW_SECS");
        std::env::remove_var("CANVAS_MAX_RETRIES");
        std::env::remove_var("CANVAS_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CANVAS_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("CALLBOARD_TEST_TOKEN");
    }
}

// =============================================================================
// RULES FILE
// =============================================================================

#[test]
fn parse_rules_keeps_file_order() {
    let set = parse_rules(
        r#"
rules:
  - { pattern: "^A$", color: red }
  - { pattern: ".", color: gray }
"#,
    )
    .unwrap();

    assert_eq!(set.rules.len(), 2);
    assert_eq!(set.rules[0].title(), "^A$");
    assert_eq!(set.rules[0].color, "red");
    assert_eq!(set.rules[1].title(), ".");
    assert!(set.rules[1].matches("anything"));
    assert_eq!(set.palette.hex("red"), "#f0939d");
}

#[test]
fn parse_rules_applies_palette_overrides() {
    let set = parse_rules(
        r##"
rules:
  - pattern: "."
    color: brand
palette:
  brand: "#123ABC"
  red: "#f00"
"##,
    )
    .unwrap();

    assert_eq!(set.palette.hex("brand"), "#123abc");
    assert_eq!(set.palette.hex("red"), "#ff0000");
    assert_eq!(set.palette.hex("gray"), "#f5f6f8");
}

#[test]
fn parse_rules_rejects_invalid_regex() {
    let err = parse_rules("rules:\n  - { pattern: \"(\", color: red }\n").unwrap_err();
    assert!(matches!(&err, ConfigError::InvalidPattern { pattern, .. } if pattern == "("));
    assert_eq!(err.error_code(), "E_CONFIG_INVALID_PATTERN");
}

#[test]
fn parse_rules_rejects_empty_list() {
    let err = parse_rules("rules: []\n").unwrap_err();
    assert!(matches!(err, ConfigError::NoRules));
}

#[test]
fn parse_rules_rejects_unknown_fields() {
    let err = parse_rules("rules:\n  - { pattern: \".\", colour: red }\n").unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG_YAML");
}

#[test]
fn load_rules_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"rules:\n  - { pattern: \"^app/\", color: blue }\n").unwrap();

    let set = load_rules(file.path()).unwrap();
    assert_eq!(set.rules.len(), 1);
    assert!(set.rules[0].matches("app/main"));
    assert!(!set.rules[0].matches("lib/util"));
}

#[test]
fn load_rules_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_rules(dir.path().join("rules.yaml")).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG_IO");
    assert!(err.to_string().contains("rules.yaml"));
}

#[test]
fn parse_rules_applies_stroke_overrides() {
    let set = parse_rules("rules:\n  - { pattern: \".\", color: gray }\nstrokes:\n  gray: \"#222\"\n").unwrap();
    assert_eq!(set.palette.stroke_hex("gray"), "#222222");
    assert_eq!(set.palette.hex("gray"), "#f5f6f8");
}

#[test]
fn unknown_colors_lists_rule_colors_missing_from_palette() {
    let set = parse_rules(
        r##"
rules:
  - { pattern: "^a", color: chartreuse }
  - { pattern: "^b", color: brand }
  - { pattern: "^c", color: "#00ff00" }
  - { pattern: ".", color: gray }
palette:
  brand: "#123456"
"##,
    )
    .unwrap();
    assert_eq!(set.unknown_colors(), vec!["chartreuse"]);
    assert!(RuleSet::default().unknown_colors().is_empty());
}

#[test]
fn default_rule_set_is_single_gray_catch_all() {
    let set = RuleSet::default();
    assert_eq!(set.rules.len(), 1);
    assert_eq!(set.rules[0].color, DEFAULT_RULE_COLOR);
    assert!(set.rules[0].matches(""));
}

// =============================================================================
// CANVAS CONFIG
// =============================================================================

#[test]
fn from_env_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_canvas_env();
        std::env::set_var("CANVAS_TOKEN_ENV", "CALLBOARD_TEST_TOKEN");
        std::env::set_var("CALLBOARD_TEST_TOKEN", "secret");
    }

    let cfg = CanvasConfig::from_env().unwrap();
    assert_eq!(cfg.token, "secret");
    assert_eq!(cfg.base_url, DEFAULT_CANVAS_BASE_URL);
    assert_eq!(cfg.rate_limit, RateLimitConfig::default());
    assert_eq!(cfg.max_retries, DEFAULT_MAX_RETRIES);
    assert_eq!(
        cfg.timeouts,
        CanvasTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );

    unsafe { clear_canvas_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_canvas_env();
        std::env::set_var("CANVAS_TOKEN_ENV", "CALLBOARD_TEST_TOKEN");
        std::env::set_var("CALLBOARD_TEST_TOKEN", "secret");
        std::env::set_var("CANVAS_BASE_URL", "https://canvas.example.test/v2/");
        std::env::set_var("CANVAS_RATE_LIMIT", "10");
        std::env::set_var("CANVAS_RATE_WINDOW_SECS", "5");
        std::env::set_var("CANVAS_MAX_RETRIES", "2");
        std::env::set_var("CANVAS_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("CANVAS_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = CanvasConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://canvas.example.test/v2");
    assert_eq!(cfg.rate_limit, RateLimitConfig { limit: 10, window: Duration::from_secs(5) });
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.timeouts, CanvasTimeouts { request_secs: 42, connect_secs: 7 });

    unsafe { clear_canvas_env() };
}

#[test]
fn from_env_ignores_unparseable_numbers() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_canvas_env();
        std::env::set_var("CANVAS_TOKEN_ENV", "CALLBOARD_TEST_TOKEN");
        std::env::set_var("CALLBOARD_TEST_TOKEN", "secret");
        std::env::set_var("CANVAS_RATE_LIMIT", "lots");
    }

    let cfg = CanvasConfig::from_env().unwrap();
    assert_eq!(cfg.rate_limit.limit, DEFAULT_CALL_LIMIT);

    unsafe { clear_canvas_env() };
}

#[test]
fn from_env_missing_indirection_var_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe { clear_canvas_env() };

    let err = CanvasConfig::from_env().unwrap_err();
    assert!(matches!(&err, ConfigError::MissingToken { var } if var == "CANVAS_TOKEN_ENV"));
    assert_eq!(err.error_code(), "E_CONFIG_MISSING_TOKEN");
}

#[test]
fn from_env_missing_token_names_target_var() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_canvas_env();
        std::env::set_var("CANVAS_TOKEN_ENV", "CALLBOARD_TEST_TOKEN");
    }

    let err = CanvasConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("CALLBOARD_TEST_TOKEN"));

    unsafe { clear_canvas_env() };
}
