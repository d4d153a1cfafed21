use std::path::Path;

use assert_cmd::Command;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("localreads-cli").unwrap();
    cmd.env("LOCALREADS_CONFIG_DIR", home)
        .env(
            "LOCALREADS_DATABASE__URL",
            format!("sqlite:{}", home.join("library.db").display()),
        )
        .env("LOCALREADS_LIBRARY__STATE_FILE", home.join("selection"))
        .env("LOCALREADS_LIBRARY__COVERS_DIR", home.join("covers"))
        .env("LOCALREADS_LIBRARY__BOOKS_DIR", home.join("books"));
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn migrate_on_fresh_database() {
    let home = tempfile::tempdir().unwrap();
    let out = stdout(cli(home.path()).arg("migrate"));
    assert!(out.contains("up to date"));
    assert!(home.path().join("library.db").exists());
}

#[test]
fn scan_then_view_lists_new_books() {
    let home = tempfile::tempdir().unwrap();
    let books = home.path().join("books");
    std::fs::create_dir_all(&books).unwrap();
    std::fs::write(books.join("broken.epub"), b"not a zip").unwrap();

    let scanned = stdout(cli(home.path()).arg("scan"));
    assert!(scanned.contains("1 new books"));

    let view = stdout(cli(home.path()).args(["view", "--counts"]));
    assert!(view.contains("Unread (1)"));
    assert!(view.contains("broken by Unknown Author"));
}

#[test]
fn selection_persists_between_runs() {
    let home = tempfile::tempdir().unwrap();

    stdout(cli(home.path()).args(["select", "hidden"]));
    let stored = std::fs::read_to_string(home.path().join("selection")).unwrap();
    assert_eq!(stored.trim(), "hidden");

    let view = stdout(cli(home.path()).arg("view"));
    assert_eq!(view, "No books.\n");
}

#[test]
fn rejects_malformed_filter() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path()).args(["select", "seven"]).assert().failure();
}

#[test]
fn scanning_missing_directory_fails() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["scan", home.path().join("absent").to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn collections_on_empty_library() {
    let home = tempfile::tempdir().unwrap();
    let out = stdout(cli(home.path()).arg("collections"));
    assert_eq!(out, "No collections.\n");
}
