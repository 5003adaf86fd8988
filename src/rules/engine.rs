use crate::edit::Edit;
use crate::rules::pattern::{is_clean_token, TokenPattern};
use crate::rules::tokens::TokenList;
use crate::scan::{Region, RegionScanner};
use std::collections::BTreeMap;

/// What a rule does once its pattern family is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Substitute matching tokens with the target
    Replace(String),
    /// Append the target when no family token is present
    Insert(String),
    /// Replace when a family token is present, otherwise insert
    Ensure(String),
    /// Add the target directly after every matching token
    Companion(String),
}

impl Action {
    pub fn token(&self) -> &str {
        match self {
            Action::Replace(t) | Action::Insert(t) | Action::Ensure(t) | Action::Companion(t) => t,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Replace(_) => "replace",
            Action::Insert(_) => "insert",
            Action::Ensure(_) => "ensure",
            Action::Companion(_) => "companion",
        }
    }
}

/// Skip a match when `marker` already occurs within `window` bytes of it.
///
/// The window never leaves the attribute value the match belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextGuard {
    pub marker: String,
    pub window: usize,
}

impl ContextGuard {
    fn blocks(&self, rendered: &str, span: &std::ops::Range<usize>) -> bool {
        let mut lo = span.start.saturating_sub(self.window);
        let mut hi = (span.end + self.window).min(rendered.len());
        while !rendered.is_char_boundary(lo) {
            lo -= 1;
        }
        while !rendered.is_char_boundary(hi) {
            hi += 1;
        }
        rendered[lo..hi].contains(self.marker.as_str())
    }
}

/// A single rewrite rule scoped to a set of tag kinds.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub tags: Vec<String>,
    pub pattern: TokenPattern,
    pub action: Action,
    /// Tokens whose presence means the rule is already satisfied. Empty means
    /// "the target token is present".
    pub satisfied_by: Vec<String>,
    pub guard: Option<ContextGuard>,
}

/// Outcome of evaluating one rule against one token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fired,
    Satisfied,
    Guarded,
    NoMatch,
    OutOfScope,
}

/// A pattern hit inside a token with no clean boundary. Left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub rule_id: String,
    pub token: String,
    /// Document offset of the token, when it is an original token
    pub offset: Option<usize>,
}

impl Rule {
    pub fn new<T>(id: impl Into<String>, tags: T, pattern: TokenPattern, action: Action) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            id: id.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            pattern,
            action,
            satisfied_by: Vec::new(),
            guard: None,
        }
    }

    pub fn satisfied_by<I>(mut self, tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.satisfied_by = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_guard(mut self, marker: impl Into<String>, window: usize) -> Self {
        self.guard = Some(ContextGuard {
            marker: marker.into(),
            window,
        });
        self
    }

    pub fn applies_to(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Idempotency predicate, checked against the current token list.
    pub fn is_satisfied(&self, tokens: &TokenList<'_>) -> bool {
        if self.satisfied_by.is_empty() {
            tokens.contains(self.action.token())
        } else {
            self.satisfied_by.iter().any(|t| tokens.contains(t))
        }
    }

    /// Evaluate against `tokens` for an element of kind `tag`, mutating the
    /// list when the rule fires.
    pub fn apply(
        &self,
        tag: &str,
        tokens: &mut TokenList<'_>,
        ambiguities: &mut Vec<Ambiguity>,
    ) -> Verdict {
        if !self.applies_to(tag) {
            return Verdict::OutOfScope;
        }
        if self.is_satisfied(tokens) {
            return Verdict::Satisfied;
        }

        let mut matches = Vec::new();
        let mut ambiguous = false;
        for (index, token) in tokens.iter().enumerate() {
            if is_clean_token(token) {
                if self.pattern.matches(token) {
                    matches.push(index);
                }
            } else if self.pattern.touches(token) {
                ambiguous = true;
                ambiguities.push(Ambiguity {
                    rule_id: self.id.clone(),
                    token: token.to_string(),
                    offset: tokens.original_span(index).map(|s| s.start),
                });
            }
        }

        if let Some(guard) = &self.guard {
            if !matches.is_empty() {
                let rendered = tokens.render();
                let spans = tokens.rendered_spans();
                matches.retain(|&index| !guard.blocks(&rendered, &spans[index]));
                if matches.is_empty() {
                    return Verdict::Guarded;
                }
            }
        }

        let target = self.action.token();
        match &self.action {
            Action::Replace(_) => {
                if matches.is_empty() {
                    return Verdict::NoMatch;
                }
                replace_family(tokens, &matches, target);
            }
            Action::Insert(_) => {
                if !matches.is_empty() || ambiguous {
                    return Verdict::NoMatch;
                }
                tokens.push(target);
            }
            Action::Ensure(_) => {
                if !matches.is_empty() {
                    replace_family(tokens, &matches, target);
                } else if ambiguous {
                    return Verdict::NoMatch;
                } else {
                    tokens.push(target);
                }
            }
            Action::Companion(_) => {
                if matches.is_empty() {
                    return Verdict::NoMatch;
                }
                for &index in matches.iter().rev() {
                    tokens.insert_after(index, target);
                }
            }
        }

        Verdict::Fired
    }
}

/// First family token becomes the target; later ones are dropped so the
/// target never appears twice.
fn replace_family(tokens: &mut TokenList<'_>, matches: &[usize], target: &str) {
    tokens.replace(matches[0], target);
    for &index in matches[1..].iter().rev() {
        tokens.remove(index);
    }
}

/// An ordered collection of rules. Order is evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every tag kind any rule is scoped to, in first-seen order.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.rules.iter().flat_map(|r| r.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }
}

/// Edits proposed for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionOutcome {
    /// Edits in document coordinates
    pub edits: Vec<Edit>,
    /// Ids of rules that fired, in evaluation order
    pub fired: Vec<String>,
    pub ambiguities: Vec<Ambiguity>,
}

/// Edits proposed for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proposal {
    pub edits: Vec<Edit>,
    pub regions: usize,
    /// Firing count per rule id
    pub fired: BTreeMap<String, usize>,
    pub ambiguities: Vec<Ambiguity>,
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Evaluates a [`RuleSet`] region by region.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'r> {
    rules: &'r RuleSet,
}

impl<'r> RuleEngine<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Apply every rule, in order, to one region's token list.
    pub fn evaluate(&self, region: &Region<'_>) -> RegionOutcome {
        let mut tokens = TokenList::parse(region.value);
        let mut outcome = RegionOutcome::default();

        for rule in self.rules.iter() {
            if rule.apply(region.tag, &mut tokens, &mut outcome.ambiguities) == Verdict::Fired {
                tracing::trace!(rule = %rule.id, tag = region.tag, "rule fired");
                outcome.fired.push(rule.id.clone());
            }
        }

        let base = region.value_span.start;
        for ambiguity in &mut outcome.ambiguities {
            ambiguity.offset = ambiguity.offset.map(|o| o + base);
        }
        outcome.edits = tokens
            .edits()
            .into_iter()
            .map(|edit| edit.offset_by(base))
            .collect();
        outcome
    }

    /// Scan `text` and collect the edits of every region.
    pub fn propose(&self, scanner: &dyn RegionScanner, text: &str) -> Proposal {
        let mut proposal = Proposal::default();
        for region in scanner.regions(text) {
            proposal.regions += 1;
            let outcome = self.evaluate(&region);
            for id in outcome.fired {
                *proposal.fired.entry(id).or_default() += 1;
            }
            proposal.edits.extend(outcome.edits);
            proposal.ambiguities.extend(outcome.ambiguities);
        }
        proposal
    }
}
