use super::{apply, read, ruleset, write};
use tempfile::TempDir;

const DASHBOARD: &str = r#"export function Dashboard() {
  return (
    <main className="rounded-3xl min-h-screen">
      <section className="grid gap-4">
        <div className="rounded-2xl bg-white shadow p-6">Stats</div>
        <article
          className="p-4 rounded-3xl border"
        >
          News
        </article>
        <button className="rounded-2xl px-4">Open</button>
        <span className="rounded-3xl">badge</span>
      </section>
    </main>
  );
}
"#;

const DASHBOARD_FIXED: &str = r#"export function Dashboard() {
  return (
    <main className="rounded-lg min-h-screen">
      <section className="grid gap-4">
        <div className="rounded-lg bg-white shadow p-6">Stats</div>
        <article
          className="p-4 rounded-lg border"
        >
          News
        </article>
        <button className="rounded-2xl px-4">Open</button>
        <span className="rounded-3xl">badge</span>
      </section>
    </main>
  );
}
"#;

#[test]
fn test_card_rounding() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pages/Dashboard.tsx", DASHBOARD);
    write(
        dir.path(),
        "components/button.tsx",
        r#"<div className="rounded-3xl">wrapper</div>"#,
    );
    write(
        dir.path(),
        "lib/card.ts",
        r#"export const html = `<div class="rounded-2xl">legacy</div>`;"#,
    );

    let config = ruleset("card-rounding.toml", dir.path());
    let report = apply(&config);

    assert_eq!(read(dir.path(), "pages/Dashboard.tsx"), DASHBOARD_FIXED);
    // Exclusions are case-insensitive file names
    assert_eq!(
        read(dir.path(), "components/button.tsx"),
        r#"<div className="rounded-3xl">wrapper</div>"#
    );
    // `class` attributes in plain .ts sources are scanned too
    assert_eq!(
        read(dir.path(), "lib/card.ts"),
        r#"export const html = `<div class="rounded-lg">legacy</div>`;"#
    );

    let summary = report.summary();
    assert_eq!(summary.modified, 2);
    assert_eq!(summary.edits, 4);
    assert_eq!(summary.rules.get("card-rounded-lg"), Some(&4));
}
