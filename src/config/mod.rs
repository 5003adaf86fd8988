pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    ActionDef, GuardDef, Match, Metadata, RuleDefinition, ScanSettings, StyleConfig,
    TargetSettings, ValidationError, ValidationIssue, DEFAULT_GUARD_WINDOW,
};
