use super::{apply, read, ruleset, write};
use tempfile::TempDir;

const PANEL: &str = r#"export function Panel({ title }) {
  return (
    <div className="bg-white text-gray-900 border border-gray-200 rounded-lg">
      <h2 className="text-gray-800 font-semibold">{title}</h2>
      <p className="text-gray-600 dark:text-gray-300">Already themed</p>
      <span className="hover:bg-white">hover only</span>
      <footer className="bg-gray-50">footer</footer>
    </div>
  );
}
"#;

const PANEL_FIXED: &str = r#"export function Panel({ title }) {
  return (
    <div className="bg-white dark:bg-gray-800 text-gray-900 dark:text-gray-100 border border-gray-200 dark:border-gray-700 rounded-lg">
      <h2 className="text-gray-800 dark:text-gray-200 font-semibold">{title}</h2>
      <p className="text-gray-600 dark:text-gray-300">Already themed</p>
      <span className="hover:bg-white">hover only</span>
      <footer className="bg-gray-50 dark:bg-gray-900">footer</footer>
    </div>
  );
}
"#;

#[test]
fn test_dark_mode_companions() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Panel.tsx", PANEL);

    let config = ruleset("dark-mode.toml", dir.path());
    let report = apply(&config);

    assert!(!report.has_failures());
    assert_eq!(read(dir.path(), "Panel.tsx"), PANEL_FIXED);

    let summary = report.summary();
    assert_eq!(summary.edits, 5);
    assert_eq!(summary.rules.get("dark-bg-white"), Some(&1));
    assert_eq!(summary.rules.get("dark-text-gray-600"), None);

    // Second run finds every companion in place
    let again = apply(&config);
    assert_eq!(again.summary().modified, 0);
    assert_eq!(read(dir.path(), "Panel.tsx"), PANEL_FIXED);
}
