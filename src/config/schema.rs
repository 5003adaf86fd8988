use crate::collect::{Exclusions, FileCollector};
use crate::rules::{Action, PatternError, Rule, RuleSet, TokenPattern};
use crate::scan::TagScanner;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_GUARD_WINDOW: usize = 50;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StyleConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub target: TargetSettings,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl StyleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }
        if self.target.extensions.is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule_id: None,
                field: "target.extensions",
            });
        }
        if self.scan.attributes.is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule_id: None,
                field: "scan.attributes",
            });
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId(rule.id.clone()));
            }
            let id = Some(rule.id.clone());

            if rule.tags.iter().all(|t| t.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    rule_id: id.clone(),
                    field: "tags",
                });
            }

            match (&rule.matcher.pattern, rule.matcher.tokens.is_empty()) {
                (Some(_), false) => issues.push(ValidationIssue::InvalidCombo {
                    rule_id: id.clone(),
                    message: "match.pattern and match.tokens are mutually exclusive".to_string(),
                }),
                (None, true) => issues.push(ValidationIssue::MissingField {
                    rule_id: id.clone(),
                    field: "match.pattern",
                }),
                (Some(pattern), true) => {
                    if pattern.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: id.clone(),
                            field: "match.pattern",
                        });
                    } else if let Err(err) = TokenPattern::regex(pattern) {
                        issues.push(ValidationIssue::InvalidPattern {
                            rule_id: rule.id.clone(),
                            message: err.source.to_string(),
                        });
                    }
                }
                (None, false) => {
                    for token in &rule.matcher.tokens {
                        if !is_single_token(token) {
                            issues.push(ValidationIssue::InvalidToken {
                                rule_id: rule.id.clone(),
                                field: "match.tokens",
                                token: token.clone(),
                            });
                        }
                    }
                }
            }

            let target = rule.action.token();
            if !is_single_token(target) {
                issues.push(ValidationIssue::InvalidToken {
                    rule_id: rule.id.clone(),
                    field: "action.token",
                    token: target.to_string(),
                });
            }
            for token in &rule.satisfied_by {
                if !is_single_token(token) {
                    issues.push(ValidationIssue::InvalidToken {
                        rule_id: rule.id.clone(),
                        field: "satisfied_by",
                        token: token.clone(),
                    });
                }
            }

            if let Some(guard) = &rule.guard {
                if guard.marker.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: id.clone(),
                        field: "guard.marker",
                    });
                }
                if guard.window == 0 {
                    issues.push(ValidationIssue::InvalidCombo {
                        rule_id: id,
                        message: "guard.window must be greater than zero".to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Compile the rule definitions, in file order.
    pub fn rule_set(&self) -> Result<RuleSet, PatternError> {
        self.rules
            .iter()
            .map(RuleDefinition::compile)
            .collect::<Result<Vec<_>, _>>()
            .map(RuleSet::new)
    }

    /// Scanner for every tag kind any rule targets.
    pub fn scanner(&self, rules: &RuleSet) -> TagScanner {
        TagScanner::new(rules.tags(), self.scan.attributes.iter().cloned())
            .with_canonical(self.scan.canonical.iter().cloned())
    }

    pub fn exclusions(&self) -> Exclusions {
        Exclusions::new(self.target.root.clone(), self.target.exclude.iter().cloned())
    }

    pub fn collector(&self) -> FileCollector {
        FileCollector::new(self.target.root.clone(), self.target.extensions.iter().cloned())
            .with_exclusions(self.exclusions())
    }
}

fn is_single_token(token: &str) -> bool {
    !token.is_empty() && !token.contains(char::is_whitespace)
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetSettings {
    /// Relative roots resolve against the config file's directory
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            dry_run: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    vec!["tsx".to_string(), "jsx".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["node_modules".to_string(), ".next".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanSettings {
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,
    /// Tag kinds never scanned, e.g. the component that defines the convention
    #[serde(default)]
    pub canonical: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            canonical: Vec::new(),
        }
    }
}

fn default_attributes() -> Vec<String> {
    vec!["className".to_string(), "class".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    pub tags: Vec<String>,
    #[serde(rename = "match")]
    pub matcher: Match,
    pub action: ActionDef,
    #[serde(default)]
    pub satisfied_by: Vec<String>,
    #[serde(default)]
    pub guard: Option<GuardDef>,
}

impl RuleDefinition {
    pub fn compile(&self) -> Result<Rule, PatternError> {
        let pattern = match &self.matcher.pattern {
            Some(pattern) => TokenPattern::regex(pattern)?,
            None => TokenPattern::exact(self.matcher.tokens.iter().cloned()),
        };
        let mut rule = Rule::new(
            self.id.clone(),
            self.tags.iter().cloned(),
            pattern,
            self.action.to_action(),
        )
        .satisfied_by(self.satisfied_by.iter().cloned());
        if let Some(guard) = &self.guard {
            rule = rule.with_guard(guard.marker.clone(), guard.window);
        }
        Ok(rule)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Match {
    /// Regular expression matched against whole tokens
    #[serde(default)]
    pub pattern: Option<String>,
    /// Literal tokens
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionDef {
    Replace { token: String },
    Insert { token: String },
    Ensure { token: String },
    Companion { token: String },
}

impl ActionDef {
    pub fn token(&self) -> &str {
        match self {
            ActionDef::Replace { token }
            | ActionDef::Insert { token }
            | ActionDef::Ensure { token }
            | ActionDef::Companion { token } => token,
        }
    }

    fn to_action(&self) -> Action {
        let token = self.token().to_string();
        match self {
            ActionDef::Replace { .. } => Action::Replace(token),
            ActionDef::Insert { .. } => Action::Insert(token),
            ActionDef::Ensure { .. } => Action::Ensure(token),
            ActionDef::Companion { .. } => Action::Companion(token),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuardDef {
    pub marker: String,
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    DEFAULT_GUARD_WINDOW
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    DuplicateId(String),
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    InvalidPattern {
        rule_id: String,
        message: String,
    },
    InvalidToken {
        rule_id: String,
        field: &'static str,
        token: String,
    },
    InvalidCombo {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "config contains no rules"),
            ValidationIssue::DuplicateId(id) => write!(f, "rule id '{id}' is used more than once"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidPattern { rule_id, message } => {
                write!(f, "rule '{rule_id}' has an invalid pattern: {message}")
            }
            ValidationIssue::InvalidToken {
                rule_id,
                field,
                token,
            } => write!(
                f,
                "rule '{rule_id}' field '{field}' must be a single token, got {token:?}"
            ),
            ValidationIssue::InvalidCombo { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid configuration: {message}"),
            },
        }
    }
}
