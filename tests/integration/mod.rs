//! Bundled rule sets applied to realistic component trees.

mod buttons;
mod card_rounding;
mod dark_mode;

use std::fs;
use std::path::{Path, PathBuf};
use style_patcher::config::{load_from_path, StyleConfig};
use style_patcher::{ChangeReport, FsSource, MutationPipeline};

/// Load a bundled rule set and point it at `root`.
pub fn ruleset(name: &str, root: &Path) -> StyleConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("rulesets")
        .join(name);
    let mut config = load_from_path(&path).expect("bundled rule set should load");
    config.target.root = root.to_path_buf();
    config
}

pub fn apply(config: &StyleConfig) -> ChangeReport {
    let rules = config.rule_set().unwrap();
    let scanner = config.scanner(&rules);
    let files = config.collector().collect().unwrap();
    MutationPipeline::new(FsSource, &scanner, &rules)
        .with_exclusions(config.exclusions())
        .run(files)
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}
