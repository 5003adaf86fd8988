use super::{apply, read, ruleset, write};
use style_patcher::FileState;
use tempfile::TempDir;

const LOGIN_FORM: &str = r#"import { Button } from "@/components/ui/Button";

export default function LoginForm({ onSubmit, loading }) {
  return (
    <form onSubmit={onSubmit} className="space-y-4 rounded-2xl">
      <input className="rounded-md border px-3" />
      <button type="submit" className="w-full py-2 rounded-lg bg-blue-600 text-white">
        {loading ? "..." : "Sign in"}
      </button>
      <button
        type="button"
        className="text-sm underline"
        onClick={() => setMode(mode === "a" ? "b" : "a")}
      >
        Forgot password?
      </button>
      <button className={`px-4 rounded-${size}`}>Dynamic</button>
      <button className={clsx("rounded-md", active && "ring")}>Computed</button>
      <Button className="rounded-md">Shared</Button>
      <buttonGroup className="rounded" />
    </form>
  );
}
"#;

const LOGIN_FORM_FIXED: &str = r#"import { Button } from "@/components/ui/Button";

export default function LoginForm({ onSubmit, loading }) {
  return (
    <form onSubmit={onSubmit} className="space-y-4 rounded-2xl">
      <input className="rounded-md border px-3" />
      <button type="submit" className="w-full py-2 rounded-full bg-blue-600 text-white">
        {loading ? "..." : "Sign in"}
      </button>
      <button
        type="button"
        className="text-sm underline rounded-full"
        onClick={() => setMode(mode === "a" ? "b" : "a")}
      >
        Forgot password?
      </button>
      <button className={`px-4 rounded-${size}`}>Dynamic</button>
      <button className={clsx("rounded-md", active && "ring")}>Computed</button>
      <Button className="rounded-md">Shared</Button>
      <buttonGroup className="rounded" />
    </form>
  );
}
"#;

const BUTTON_COMPONENT: &str = r#"export function Button({ className, ...props }) {
  return <button className="inline-flex rounded-md px-4" {...props} />;
}
"#;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/login/LoginForm.tsx", LOGIN_FORM);
    write(dir.path(), "components/ui/Button.tsx", BUTTON_COMPONENT);
    write(
        dir.path(),
        "components/Nav.jsx",
        r#"<nav><button className="rounded-full p-2">Menu</button></nav>"#,
    );
    dir
}

#[test]
fn test_buttons_rounded_full() {
    let dir = setup();
    let config = ruleset("buttons-rounded-full.toml", dir.path());

    let report = apply(&config);
    assert!(!report.has_failures());

    assert_eq!(read(dir.path(), "app/login/LoginForm.tsx"), LOGIN_FORM_FIXED);
    assert_eq!(read(dir.path(), "components/ui/Button.tsx"), BUTTON_COMPONENT);

    let summary = report.summary();
    assert_eq!(summary.excluded, 0);
    assert_eq!(summary.modified, 1);
    assert_eq!(summary.edits, 2);
    assert_eq!(summary.rules.get("button-rounded-full"), Some(&2));
    // The template-literal button is reported, not rewritten
    assert_eq!(summary.warnings, 1);
}

#[test]
fn test_buttons_rounded_full_idempotent() {
    let dir = setup();
    let config = ruleset("buttons-rounded-full.toml", dir.path());

    apply(&config);
    let report = apply(&config);

    assert_eq!(report.summary().modified, 0);
    assert!(report
        .files
        .iter()
        .all(|f| matches!(f.state, FileState::NoChange)));
    assert_eq!(read(dir.path(), "app/login/LoginForm.tsx"), LOGIN_FORM_FIXED);
}
