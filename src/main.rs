use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use style_patcher::config::{load_from_path, StyleConfig};
use style_patcher::{ChangeReport, FileState, FsSource, MutationPipeline, RootGuard};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "style-patcher.toml";
const CONFIG_ENV: &str = "STYLE_PATCHER_CONFIG";

#[derive(Parser)]
#[command(name = "style-patcher")]
#[command(about = "Enforce styling conventions across JSX/TSX class attributes", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite files under the target root
    Apply {
        /// Rule config (default: $STYLE_PATCHER_CONFIG, then ./style-patcher.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the config's target root
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List files that do not follow the conventions; exit 1 if any
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Show unified diff of the changes apply would make
        #[arg(short, long)]
        diff: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the configured rules
    Rules {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            config,
            root,
            dry_run,
            diff,
            format,
        } => cmd_apply(config, root, dry_run, diff, format),

        Commands::Check {
            config,
            root,
            diff,
            format,
        } => cmd_check(config, root, diff, format),

        Commands::Rules { config } => cmd_rules(config),
    }
}

/// Logs go to stderr so stdout stays clean for reports and JSON.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("style_patcher={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the config path.
///
/// Priority order:
/// 1. Explicit --config flag
/// 2. STYLE_PATCHER_CONFIG environment variable
/// 3. ./style-patcher.toml
fn resolve_config(cli_config: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_config {
        return Ok(path);
    }

    if let Ok(env_path) = env::var(CONFIG_ENV) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path);
        }
        eprintln!(
            "{}",
            format!("Warning: {CONFIG_ENV} is set but path doesn't exist: {env_path}").yellow()
        );
    }

    let local = PathBuf::from(DEFAULT_CONFIG);
    if local.exists() {
        return Ok(local);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a style-patcher config.".red(),
        "Try one of:".bold(),
        "1. Create ./style-patcher.toml (see rulesets/ for examples)",
        "2. Specify explicitly: style-patcher apply --config rulesets/buttons-rounded-full.toml",
        "3. Set environment variable: export STYLE_PATCHER_CONFIG=/path/to/style-patcher.toml"
    )
}

fn load_config(cli_config: Option<PathBuf>, root: Option<PathBuf>) -> Result<StyleConfig> {
    let path = resolve_config(cli_config)?;
    let mut config = load_from_path(&path)?;
    if let Some(root) = root {
        config.target.root = std::path::absolute(&root)
            .with_context(|| format!("failed to resolve root {}", root.display()))?;
    }
    Ok(config)
}

/// Collect candidate files under the target root and run the pipeline.
fn run(config: &StyleConfig, dry_run: bool, keep_text: bool) -> Result<ChangeReport> {
    let rules = config.rule_set().context("failed to compile rules")?;
    let scanner = config.scanner(&rules);

    let files = config.collector().collect()?;
    tracing::debug!(count = files.len(), root = %config.target.root.display(), "collected files");

    let mut pipeline = MutationPipeline::new(FsSource, &scanner, &rules)
        .with_exclusions(config.exclusions())
        .dry_run(dry_run)
        .keep_text(keep_text);
    if !dry_run {
        let guard = RootGuard::new(&config.target.root).with_context(|| {
            format!("failed to resolve root {}", config.target.root.display())
        })?;
        pipeline = pipeline.with_guard(guard);
    }

    Ok(pipeline.run(files))
}

fn cmd_apply(
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    format: Format,
) -> Result<()> {
    let config = load_config(config, root)?;
    let dry_run = dry_run || config.target.dry_run;
    let report = run(&config, dry_run, show_diff)?;

    match format {
        Format::Json => print_json(&report)?,
        Format::Text => {
            print_header(&config, dry_run);
            print_files(&report, &config.target.root, show_diff);
            print_summary(&report);
        }
    }

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    show_diff: bool,
    format: Format,
) -> Result<()> {
    let config = load_config(config, root)?;
    let report = run(&config, true, show_diff)?;
    let pending = report.modified().count();

    match format {
        Format::Json => print_json(&report)?,
        Format::Text => {
            println!("{}", "Convention Audit".bold());
            println!("Root: {}", config.target.root.display());
            println!();

            for file in report.modified() {
                println!(
                    "{} {} ({} edit{})",
                    "✗".red(),
                    relative(&file.path, &config.target.root).display(),
                    file.edits,
                    if file.edits == 1 { "" } else { "s" }
                );
                for (rule, count) in &file.fired {
                    println!("    {} x{}", rule.dimmed(), count);
                }
                if show_diff {
                    if let Some(change) = &file.change {
                        display_diff(&file.path, &change.original, &change.mutated);
                    }
                }
            }
            print_failures(&report, &config.target.root);

            let summary = report.summary();
            println!();
            if pending == 0 {
                println!(
                    "{} all {} files follow the conventions",
                    "✓".green(),
                    summary.scanned
                );
            } else {
                println!(
                    "{} {} of {} files need changes",
                    "✗".red(),
                    pending,
                    summary.scanned
                );
            }
        }
    }

    if pending > 0 || report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_rules(config: Option<PathBuf>) -> Result<()> {
    let path = resolve_config(config)?;
    let config = load_from_path(&path)?;

    println!("{} ({})", config.meta.name.bold(), path.display());
    if let Some(description) = &config.meta.description {
        println!("{}", description.dimmed());
    }
    println!();

    for rule in &config.rules {
        let matcher = match &rule.matcher.pattern {
            Some(pattern) => format!("/{pattern}/"),
            None => rule.matcher.tokens.join(" | "),
        };
        println!(
            "{} [{}] {} -> {} {}",
            rule.id.bold(),
            rule.tags.join(", "),
            matcher,
            action_name(&rule.action).cyan(),
            rule.action.token()
        );
        if !rule.satisfied_by.is_empty() {
            println!("    satisfied by: {}", rule.satisfied_by.join(", "));
        }
        if let Some(guard) = &rule.guard {
            println!(
                "    skipped within {} bytes of {:?}",
                guard.window, guard.marker
            );
        }
    }

    Ok(())
}

fn action_name(action: &style_patcher::config::ActionDef) -> &'static str {
    use style_patcher::config::ActionDef;
    match action {
        ActionDef::Replace { .. } => "replace",
        ActionDef::Insert { .. } => "insert",
        ActionDef::Ensure { .. } => "ensure",
        ActionDef::Companion { .. } => "companion",
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn print_json(report: &ChangeReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.summary())?;
    println!("{json}");
    Ok(())
}

fn print_header(config: &StyleConfig, dry_run: bool) {
    if !config.meta.name.is_empty() {
        println!("Rules: {}", config.meta.name);
    }
    println!("Root: {}", config.target.root.display());
    if dry_run {
        println!("{}", "[DRY RUN - showing what would be changed]".cyan());
    }
    println!();
}

fn print_files(report: &ChangeReport, root: &Path, show_diff: bool) {
    for file in &report.files {
        let path = relative(&file.path, root);
        match file.state {
            FileState::Written => {
                println!("{} {}: {} edits", "✓".green(), path.display(), file.edits)
            }
            FileState::WouldWrite => println!(
                "{} {}: would apply {} edits",
                "✓".green(),
                path.display(),
                file.edits
            ),
            FileState::Skipped => println!(
                "{} {}: Already follows conventions",
                "⊙".yellow(),
                path.display()
            ),
            FileState::Failed => {
                if let Some(err) = &file.error {
                    eprintln!("{} {}: Failed - {}", "✗".red(), path.display(), err);
                }
            }
            FileState::NoChange | FileState::Excluded => {}
        }

        for warning in &file.warnings {
            println!("  {} {}", "warning:".yellow(), warning);
        }

        if show_diff {
            if let Some(change) = &file.change {
                display_diff(&file.path, &change.original, &change.mutated);
            }
        }
    }
}

fn print_failures(report: &ChangeReport, root: &Path) {
    for file in &report.files {
        if let Some(err) = &file.error {
            eprintln!(
                "{} {}: Failed - {}",
                "✗".red(),
                relative(&file.path, root).display(),
                err
            );
        }
    }
}

fn print_summary(report: &ChangeReport) {
    let summary = report.summary();

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} scanned", summary.scanned);
    let modified = if summary.dry_run {
        "would change"
    } else {
        "modified"
    };
    println!("  {} {}", format!("{}", summary.modified).green(), modified);
    println!("  {} unchanged", format!("{}", summary.unchanged).yellow());
    println!("  {} excluded", format!("{}", summary.excluded).cyan());
    println!("  {} edits", summary.edits);
    if summary.warnings > 0 {
        println!("  {} warnings", format!("{}", summary.warnings).yellow());
    }
    println!("  {} failed", format!("{}", summary.errors.len()).red());

    if !summary.rules.is_empty() {
        println!();
        println!("{}", "Rules fired:".bold());
        for (id, count) in &summary.rules {
            println!("  {id}: {count}");
        }
    }
}

/// Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for group in diff.grouped_ops(3) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", line);
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }
}
