//! Style Patcher: convention-driven rewriting of utility-class attributes
//!
//! Enforces styling conventions (rounded buttons, consistent card radii,
//! dark-mode companions) across a tree of JSX/TSX/HTML files by rewriting
//! the token lists inside `className`/`class` attributes.
//!
//! # Architecture
//!
//! Every change compiles down to a single primitive: [`Edit`], a verified
//! byte-span replacement. A [`RegionScanner`] finds attribute values on
//! target tags, the [`RuleEngine`] turns each value into minimal edits, and
//! [`rewrite`] applies all edits of a document in one forward pass.
//! [`MutationPipeline`] drives that per file and aggregates a
//! [`ChangeReport`].
//!
//! # Safety
//!
//! - Edits verify their expected before-text before applying
//! - Overlapping edits are rejected, never merged
//! - Atomic file writes (tempfile + fsync + rename)
//! - Writes are confined to the target root
//! - Rules check their own postcondition, so runs are idempotent
//!
//! # Example
//!
//! ```
//! use style_patcher::{rewrite, Action, Rule, RuleEngine, RuleSet, TagScanner, TokenPattern};
//!
//! let rules = RuleSet::new(vec![Rule::new(
//!     "button-rounded-full",
//!     ["button"],
//!     TokenPattern::regex("rounded(-(sm|md|lg|xl))?").unwrap(),
//!     Action::Ensure("rounded-full".into()),
//! )]);
//! let scanner = TagScanner::new(rules.tags(), ["className"]);
//!
//! let text = r#"<button className="px-4 rounded-lg">Save</button>"#;
//! let proposal = RuleEngine::new(&rules).propose(&scanner, text);
//! let result = rewrite(text, proposal.edits).unwrap();
//!
//! assert_eq!(result.text, r#"<button className="px-4 rounded-full">Save</button>"#);
//! ```

pub mod collect;
pub mod config;
pub mod edit;
pub mod pipeline;
pub mod rules;
pub mod safety;
pub mod scan;
pub mod source;

// Re-exports
pub use collect::{CollectError, Exclusions, FileCollector};
pub use config::{load_from_path, load_from_str, ConfigError, StyleConfig};
pub use edit::{rewrite, Edit, EditError, EditVerification, OverlapConflict, Rewrite};
pub use pipeline::{
    ChangeReport, FileReport, FileState, MutationPipeline, PipelineError, RunSummary, Warning,
};
pub use rules::{Action, Rule, RuleEngine, RuleSet, TokenList, TokenPattern};
pub use safety::{RootGuard, SafetyError};
pub use scan::{Region, RegionScanner, TagScanner};
pub use source::{DocumentSource, FsSource};
