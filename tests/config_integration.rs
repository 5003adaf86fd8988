//! Integration tests for config loading
//!
//! Every bundled rule set must parse, validate, and compile.

use style_patcher::config::{load_from_str, ActionDef, DEFAULT_GUARD_WINDOW};

const BUNDLED: &[(&str, &str)] = &[
    (
        "buttons-rounded-full",
        include_str!("../rulesets/buttons-rounded-full.toml"),
    ),
    ("card-rounding", include_str!("../rulesets/card-rounding.toml")),
    ("dark-mode", include_str!("../rulesets/dark-mode.toml")),
];

#[test]
fn test_bundled_rulesets_load() {
    for (name, input) in BUNDLED {
        let config = load_from_str(input).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(config.meta.name, *name);

        let rules = config.rule_set().unwrap();
        assert_eq!(rules.len(), config.rules.len());
        assert!(!rules.tags().is_empty());
    }
}

#[test]
fn test_buttons_ruleset_shape() {
    let config = load_from_str(BUNDLED[0].1).unwrap();
    assert_eq!(config.scan.canonical, vec!["Button"]);
    assert!(config.target.exclude.iter().any(|e| e == "Button.tsx"));

    let rule = &config.rules[0];
    assert_eq!(rule.tags, vec!["button"]);
    assert!(matches!(&rule.action, ActionDef::Ensure { token } if token == "rounded-full"));
}

#[test]
fn test_dark_mode_rules_are_guarded_companions() {
    let config = load_from_str(BUNDLED[2].1).unwrap();
    assert_eq!(config.rules.len(), 10);

    for rule in &config.rules {
        assert!(matches!(rule.action, ActionDef::Companion { .. }), "{}", rule.id);
        let guard = rule.guard.as_ref().unwrap();
        assert!(guard.marker.starts_with("dark:"));
        assert_eq!(guard.window, DEFAULT_GUARD_WINDOW);
        assert!(rule.action.token().starts_with(guard.marker.as_str()));
    }
}

#[test]
fn test_defaults_fill_missing_sections() {
    let config = load_from_str(
        r#"
[[rules]]
id = "r"
tags = ["div"]
[rules.match]
tokens = ["rounded-3xl"]
[rules.action]
type = "replace"
token = "rounded-lg"
"#,
    )
    .unwrap();

    assert_eq!(config.target.root, std::path::PathBuf::from("."));
    assert_eq!(config.target.extensions, vec!["tsx", "jsx"]);
    assert_eq!(config.target.exclude, vec!["node_modules", ".next"]);
    assert!(!config.target.dry_run);
    assert_eq!(config.scan.attributes, vec!["className", "class"]);
    assert!(config.scan.canonical.is_empty());
    assert!(config.rules[0].satisfied_by.is_empty());
    assert!(config.rules[0].guard.is_none());
}
