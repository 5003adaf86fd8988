//! Per-file orchestration: read → scan → propose → rewrite → compare → write.
//!
//! Each file moves through `Unread → Scanned → {NoChange, Rewritten} →
//! {Skipped, Written}`. Nothing that happens to one file stops the run:
//! read, rewrite, guard, and write failures are recorded in that file's
//! [`FileReport`] and the pipeline moves on. Files are processed one at a
//! time, in lexicographic path order.

use crate::collect::Exclusions;
use crate::edit::{rewrite, EditError, OverlapConflict};
use crate::rules::{Ambiguity, RuleEngine, RuleSet};
use crate::safety::{RootGuard, SafetyError};
use crate::scan::RegionScanner;
use crate::source::DocumentSource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a file could not be processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to rewrite {}: {source}", path.display())]
    Rewrite { path: PathBuf, source: EditError },

    #[error("refused to write: {0}")]
    Guard(#[from] SafetyError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Read { .. } => "read",
            PipelineError::Rewrite { .. } => "rewrite",
            PipelineError::Guard(_) => "guard",
            PipelineError::Write { .. } => "write",
        }
    }
}

/// Non-fatal problems found while processing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A proposed edit overlapped an accepted one and was dropped
    OverlapConflict {
        start: usize,
        end: usize,
        accepted_start: usize,
        accepted_end: usize,
    },
    /// A pattern touched a token without clean boundaries; token left as is
    PatternAmbiguity {
        rule_id: String,
        token: String,
        offset: Option<usize>,
    },
}

impl From<&OverlapConflict> for Warning {
    fn from(conflict: &OverlapConflict) -> Self {
        Warning::OverlapConflict {
            start: conflict.rejected.byte_start,
            end: conflict.rejected.byte_end,
            accepted_start: conflict.accepted_start,
            accepted_end: conflict.accepted_end,
        }
    }
}

impl From<Ambiguity> for Warning {
    fn from(ambiguity: Ambiguity) -> Self {
        Warning::PatternAmbiguity {
            rule_id: ambiguity.rule_id,
            token: ambiguity.token,
            offset: ambiguity.offset,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::OverlapConflict {
                start,
                end,
                accepted_start,
                accepted_end,
            } => write!(
                f,
                "edit at [{start}, {end}) overlaps [{accepted_start}, {accepted_end}) and was dropped"
            ),
            Warning::PatternAmbiguity {
                rule_id,
                token,
                offset,
            } => match offset {
                Some(offset) => write!(
                    f,
                    "rule '{rule_id}' skipped ambiguous token {token:?} at byte {offset}"
                ),
                None => write!(f, "rule '{rule_id}' skipped ambiguous token {token:?}"),
            },
        }
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Path matched an exclusion; never read
    Excluded,
    /// No edits proposed
    NoChange,
    /// Edits produced text identical to the original; nothing written
    Skipped,
    /// Dry run: would have been written
    WouldWrite,
    Written,
    Failed,
}

/// Original and mutated text, kept on request for diff output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub original: String,
    pub mutated: String,
}

/// What happened to one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub state: FileState,
    /// Edits applied (or that would be applied, in a dry run)
    pub edits: usize,
    /// Firing count per rule id
    pub fired: BTreeMap<String, usize>,
    pub warnings: Vec<Warning>,
    pub error: Option<PipelineError>,
    pub change: Option<TextChange>,
}

impl FileReport {
    fn new(path: &Path, state: FileState) -> Self {
        Self {
            path: path.to_path_buf(),
            state,
            edits: 0,
            fired: BTreeMap::new(),
            warnings: Vec::new(),
            error: None,
            change: None,
        }
    }

    fn failed(mut self, error: PipelineError) -> Self {
        error!(path = %self.path.display(), error = %error, "file failed");
        self.state = FileState::Failed;
        self.error = Some(error);
        self
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.state, FileState::Written | FileState::WouldWrite)
    }
}

/// Per-run aggregate of every [`FileReport`].
#[derive(Debug, Default)]
pub struct ChangeReport {
    pub files: Vec<FileReport>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub state: FileState,
    pub edits: usize,
    pub rules: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

/// Serializable run summary.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub dry_run: bool,
    pub scanned: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub excluded: usize,
    pub edits: usize,
    pub warnings: usize,
    pub rules: BTreeMap<String, usize>,
    pub files: Vec<FileSummary>,
    pub errors: Vec<FileFailure>,
}

impl ChangeReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            dry_run: self.dry_run,
            ..RunSummary::default()
        };

        for file in &self.files {
            match file.state {
                FileState::Excluded => summary.excluded += 1,
                FileState::Failed => {}
                _ => summary.scanned += 1,
            }
            match file.state {
                FileState::NoChange | FileState::Skipped => summary.unchanged += 1,
                FileState::Written | FileState::WouldWrite => summary.modified += 1,
                _ => {}
            }
            summary.edits += file.edits;
            summary.warnings += file.warnings.len();
            for (id, count) in &file.fired {
                *summary.rules.entry(id.clone()).or_default() += count;
            }

            if let Some(error) = &file.error {
                summary.errors.push(FileFailure {
                    path: file.path.clone(),
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
            if file.is_modified() || !file.warnings.is_empty() {
                summary.files.push(FileSummary {
                    path: file.path.clone(),
                    state: file.state,
                    edits: file.edits,
                    rules: file.fired.clone(),
                    warnings: file.warnings.iter().map(ToString::to_string).collect(),
                });
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| f.state == FileState::Failed)
    }

    pub fn modified(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_modified())
    }
}

/// Runs a rule set over a list of candidate files.
pub struct MutationPipeline<'a, S> {
    source: S,
    scanner: &'a dyn RegionScanner,
    engine: RuleEngine<'a>,
    exclusions: Exclusions,
    guard: Option<RootGuard>,
    dry_run: bool,
    keep_text: bool,
}

impl<'a, S: DocumentSource> MutationPipeline<'a, S> {
    pub fn new(source: S, scanner: &'a dyn RegionScanner, rules: &'a RuleSet) -> Self {
        Self {
            source,
            scanner,
            engine: RuleEngine::new(rules),
            exclusions: Exclusions::default(),
            guard: None,
            dry_run: false,
            keep_text: false,
        }
    }

    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Re-validate every path against `guard` right before writing.
    pub fn with_guard(mut self, guard: RootGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Keep original and mutated text of changed files in their reports.
    pub fn keep_text(mut self, keep_text: bool) -> Self {
        self.keep_text = keep_text;
        self
    }

    /// Process every path, in sorted order, and aggregate the results.
    pub fn run<I>(&self, paths: I) -> ChangeReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();
        paths.dedup();

        let files: Vec<FileReport> = paths.iter().map(|p| self.process_file(p)).collect();
        let report = ChangeReport {
            files,
            dry_run: self.dry_run,
        };

        let summary = report.summary();
        info!(
            scanned = summary.scanned,
            modified = summary.modified,
            edits = summary.edits,
            failed = summary.errors.len(),
            dry_run = self.dry_run,
            "run complete"
        );
        report
    }

    /// Drive a single file through the state machine.
    pub fn process_file(&self, path: &Path) -> FileReport {
        if self.exclusions.matches(path) {
            debug!(path = %path.display(), "excluded");
            return FileReport::new(path, FileState::Excluded);
        }

        let mut report = FileReport::new(path, FileState::NoChange);

        let original = match self.source.read(path) {
            Ok(text) => text,
            Err(source) => {
                return report.failed(PipelineError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let proposal = self.engine.propose(self.scanner, &original);
        report.fired = proposal.fired;
        for ambiguity in proposal.ambiguities {
            let warning = Warning::from(ambiguity);
            warn!(path = %path.display(), "{warning}");
            report.warnings.push(warning);
        }

        if proposal.edits.is_empty() {
            debug!(path = %path.display(), regions = proposal.regions, "no change");
            return report;
        }

        let rewritten = match rewrite(&original, proposal.edits) {
            Ok(rewritten) => rewritten,
            Err(source) => {
                return report.failed(PipelineError::Rewrite {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        for conflict in &rewritten.conflicts {
            let warning = Warning::from(conflict);
            warn!(path = %path.display(), "{warning}");
            report.warnings.push(warning);
        }
        report.edits = rewritten.applied;

        if rewritten.text == original {
            report.state = FileState::Skipped;
            return report;
        }

        if self.keep_text {
            report.change = Some(TextChange {
                original,
                mutated: rewritten.text.clone(),
            });
        }

        if self.dry_run {
            report.state = FileState::WouldWrite;
            return report;
        }

        if let Some(guard) = &self.guard {
            if let Err(err) = guard.validate_path(path) {
                return report.failed(PipelineError::Guard(err));
            }
        }

        if let Err(source) = self.source.write(path, &rewritten.text) {
            return report.failed(PipelineError::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!(path = %path.display(), edits = report.edits, "written");
        report.state = FileState::Written;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Action, Rule, TokenPattern};
    use crate::scan::{Region, TagScanner};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;

    /// In-memory source that can be told to fail on specific paths.
    #[derive(Default)]
    struct MemorySource {
        files: RefCell<HashMap<PathBuf, String>>,
        writes: RefCell<Vec<PathBuf>>,
        read_only: Vec<PathBuf>,
    }

    impl MemorySource {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: RefCell::new(
                    files
                        .iter()
                        .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        fn get(&self, path: &str) -> String {
            self.files.borrow()[Path::new(path)].clone()
        }
    }

    impl DocumentSource for &MemorySource {
        fn read(&self, path: &Path) -> io::Result<String> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            if self.read_only.iter().any(|p| p == path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.writes.borrow_mut().push(path.to_path_buf());
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![Rule::new(
            "button-rounded-full",
            ["button"],
            TokenPattern::regex("rounded(-(sm|md|lg|xl))?").unwrap(),
            Action::Ensure("rounded-full".into()),
        )])
    }

    fn scanner(rules: &RuleSet) -> TagScanner {
        TagScanner::new(rules.tags(), ["className"])
    }

    #[test]
    fn test_states_and_summary() {
        let source = MemorySource::with(&[
            ("a.tsx", r#"<button className="rounded-lg">a</button>"#),
            ("b.tsx", r#"<div className="rounded-lg"/>"#),
            ("c.tsx", r#"<button className="rounded-full">c</button>"#),
        ]);
        let rules = rules();
        let scanner = scanner(&rules);
        let pipeline = MutationPipeline::new(&source, &scanner, &rules);

        let report = pipeline.run(["c.tsx", "missing.tsx", "a.tsx", "b.tsx"].map(PathBuf::from));

        let states: Vec<_> = report.files.iter().map(|f| (f.path.clone(), f.state)).collect();
        assert_eq!(
            states,
            vec![
                (PathBuf::from("a.tsx"), FileState::Written),
                (PathBuf::from("b.tsx"), FileState::NoChange),
                (PathBuf::from("c.tsx"), FileState::NoChange),
                (PathBuf::from("missing.tsx"), FileState::Failed),
            ]
        );
        assert_eq!(
            source.get("a.tsx"),
            r#"<button className="rounded-full">a</button>"#
        );

        let summary = report.summary();
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.edits, 1);
        assert_eq!(summary.rules.get("button-rounded-full"), Some(&1));
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, "read");
        assert!(report.has_failures());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let source = MemorySource::with(&[("a.tsx", r#"<button className="p-2">a</button>"#)]);
        let rules = rules();
        let scanner = scanner(&rules);
        let pipeline = MutationPipeline::new(&source, &scanner, &rules)
            .dry_run(true)
            .keep_text(true);

        let report = pipeline.run([PathBuf::from("a.tsx")]);
        let file = &report.files[0];

        assert_eq!(file.state, FileState::WouldWrite);
        assert_eq!(file.edits, 1);
        assert!(source.writes.borrow().is_empty());
        let change = file.change.as_ref().unwrap();
        assert_eq!(change.mutated, r#"<button className="p-2 rounded-full">a</button>"#);
        assert!(report.summary().dry_run);
    }

    #[test]
    fn test_write_failure_is_recorded_and_run_continues() {
        let mut source = MemorySource::with(&[
            ("a.tsx", r#"<button className="rounded">a</button>"#),
            ("b.tsx", r#"<button className="rounded">b</button>"#),
        ]);
        source.read_only.push(PathBuf::from("a.tsx"));
        let rules = rules();
        let scanner = scanner(&rules);
        let pipeline = MutationPipeline::new(&source, &scanner, &rules);

        let report = pipeline.run(["a.tsx", "b.tsx"].map(PathBuf::from));

        assert_eq!(report.files[0].state, FileState::Failed);
        assert!(matches!(report.files[0].error, Some(PipelineError::Write { .. })));
        assert_eq!(source.get("a.tsx"), r#"<button className="rounded">a</button>"#);
        assert_eq!(report.files[1].state, FileState::Written);
    }

    #[test]
    fn test_excluded_files_are_never_read() {
        let source = MemorySource::with(&[(
            "src/components/ui/Button.tsx",
            r#"<button className="rounded-md">x</button>"#,
        )]);
        let rules = rules();
        let scanner = scanner(&rules);
        let pipeline = MutationPipeline::new(&source, &scanner, &rules)
            .with_exclusions(Exclusions::new("src", ["Button.tsx"]));

        let report = pipeline.run([PathBuf::from("src/components/ui/Button.tsx")]);

        assert_eq!(report.files[0].state, FileState::Excluded);
        assert_eq!(report.summary().excluded, 1);
        assert!(source.writes.borrow().is_empty());
    }

    #[test]
    fn test_ambiguity_becomes_warning() {
        let source = MemorySource::with(&[(
            "a.tsx",
            "<button className={`p-2 rounded-${size}`}>a</button>",
        )]);
        let rules = rules();
        let scanner = scanner(&rules);
        let pipeline = MutationPipeline::new(&source, &scanner, &rules);

        let report = pipeline.run([PathBuf::from("a.tsx")]);
        let file = &report.files[0];

        assert_eq!(file.state, FileState::NoChange);
        assert_eq!(file.warnings.len(), 1);
        assert!(matches!(
            &file.warnings[0],
            Warning::PatternAmbiguity { token, .. } if token == "rounded-${size}"
        ));
        assert_eq!(report.summary().files.len(), 1);
    }

    /// Yields every region twice, so each edit is proposed twice.
    struct DoublingScanner(TagScanner);

    impl RegionScanner for DoublingScanner {
        fn regions<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Region<'a>> + 'a> {
            Box::new(self.0.scan(text).flat_map(|r| [r.clone(), r]))
        }
    }

    #[test]
    fn test_overlapping_edit_is_dropped_and_file_written() {
        let source = MemorySource::with(&[(
            "a.tsx",
            r#"<button className="p-2 rounded-lg">a</button>"#,
        )]);
        let rules = rules();
        let scanner = DoublingScanner(scanner(&rules));
        let pipeline = MutationPipeline::new(&source, &scanner, &rules);

        let report = pipeline.run([PathBuf::from("a.tsx")]);
        let file = &report.files[0];

        assert_eq!(file.state, FileState::Written);
        assert_eq!(file.edits, 1);
        assert_eq!(file.warnings.len(), 1);
        assert_eq!(
            file.warnings[0],
            Warning::OverlapConflict {
                start: 23,
                end: 33,
                accepted_start: 23,
                accepted_end: 33,
            }
        );
        assert_eq!(
            source.get("a.tsx"),
            r#"<button className="p-2 rounded-full">a</button>"#
        );
        assert_eq!(report.summary().warnings, 1);
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::OverlapConflict {
            start: 3,
            end: 8,
            accepted_start: 0,
            accepted_end: 5,
        };
        assert_eq!(
            warning.to_string(),
            "edit at [3, 8) overlaps [0, 5) and was dropped"
        );
    }
}
