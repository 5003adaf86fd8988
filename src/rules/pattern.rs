use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid token pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Matches whole class tokens, never substrings of them.
#[derive(Debug, Clone)]
pub enum TokenPattern {
    /// Any of these literal tokens
    Exact(Vec<String>),
    /// A regular expression; `whole` is anchored to the full token
    Regex { whole: Regex, loose: Regex },
}

impl TokenPattern {
    pub fn exact<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        TokenPattern::Exact(tokens.into_iter().map(Into::into).collect())
    }

    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        let compile = |source: &str| {
            Regex::new(source).map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(TokenPattern::Regex {
            whole: compile(&format!("^(?:{pattern})$"))?,
            loose: compile(pattern)?,
        })
    }

    /// Whether `token` as a whole belongs to the pattern family.
    ///
    /// `rounded` does not match `rounded-full`.
    pub fn matches(&self, token: &str) -> bool {
        match self {
            TokenPattern::Exact(tokens) => tokens.iter().any(|t| t == token),
            TokenPattern::Regex { whole, .. } => whole.is_match(token),
        }
    }

    /// Whether the pattern occurs anywhere inside `token`.
    pub fn touches(&self, token: &str) -> bool {
        match self {
            TokenPattern::Exact(tokens) => tokens.iter().any(|t| token.contains(t.as_str())),
            TokenPattern::Regex { loose, .. } => loose.is_match(token),
        }
    }
}

/// A token with interpolation or quoting characters has no reliable
/// boundaries, e.g. `rounded-${size}`.
pub fn is_clean_token(token: &str) -> bool {
    !token.contains(['{', '}', '$', '`', '"', '\''])
}
