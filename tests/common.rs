use std::{fs, path::Path, process::Command};

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

pub fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "widgets@example.com"]);
    git(dir, &["config", "user.name", "Widget Sync"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    fs::write(dir.join("README"), "readme\n").unwrap();
    git(dir, &["add", "README"]);
    git(dir, &["commit", "-q", "-m", "Initial commit"]);
}

/// Widgets repository with a committed `war/grapher2` tree next to an
/// empty website repository
pub fn init_pair(root: &Path) {
    let widgets = root.join("widgets");
    init_repo(&widgets);
    init_repo(&root.join("website"));

    fs::create_dir_all(widgets.join("war/grapher2")).unwrap();
    fs::write(widgets.join("war/grapher2/grapher.js"), "var grapher;\n").unwrap();
    git(&widgets, &["add", "war"]);
    git(&widgets, &["commit", "-q", "-m", "Add grapher"]);
}

pub fn head_subject(dir: &Path) -> String {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%s"])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}
