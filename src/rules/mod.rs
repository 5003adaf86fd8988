//! Rule evaluation over attribute token lists.
//!
//! A [`Rule`] locates a family of tokens ([`TokenPattern`]) inside the value
//! of a scoped tag, checks an idempotency predicate against the *current*
//! list, and then replaces, inserts, or adds companions. The
//! [`RuleEngine`] turns the final list into minimal [`Edit`](crate::Edit)s.

pub mod engine;
pub mod pattern;
pub mod tokens;

pub use engine::{
    Action, Ambiguity, ContextGuard, Proposal, RegionOutcome, Rule, RuleEngine, RuleSet, Verdict,
};
pub use pattern::{is_clean_token, PatternError, TokenPattern};
pub use tokens::TokenList;
