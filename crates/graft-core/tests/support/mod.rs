#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

/// Run git in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = git_command()
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should be installed");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

pub fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).expect("create_dir_all should succeed in test temp dirs");
    git(dir, &["init"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    configure_identity(dir);
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
    }
    fs::write(path, content).expect("write should succeed in test temp dirs");
}

/// `package.json` with `name` and dependencies on `deps`.
pub fn write_manifest(dir: &Path, name: &str, deps: &[&str]) {
    let deps: Vec<String> = deps.iter().map(|d| format!("\"{}\": \"*\"", d)).collect();
    write_file(
        &dir.join("package.json"),
        &format!(
            "{{ \"name\": \"{}\", \"version\": \"1.0.0\", \"dependencies\": {{ {} }} }}\n",
            name,
            deps.join(", ")
        ),
    );
}

pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "--all", "."]);
    git(dir, &["commit", "-m", message]);
}

/// Bare repository at `<root>/remotes/<name>.git` seeded with one commit on
/// master holding a manifest named `name` plus `extra` files.
pub fn seeded_remote(root: &Path, name: &str, extra: &[(&str, &str)]) -> PathBuf {
    let seed = root.join("seed").join(name);
    init_repo(&seed);
    write_manifest(&seed, name, &[]);
    for (file, content) in extra {
        write_file(&seed.join(file), content);
    }
    commit_all(&seed, "seed");

    let bare = root.join("remotes").join(format!("{}.git", name));
    fs::create_dir_all(bare.parent().expect("bare path has a parent"))
        .expect("create_dir_all should succeed in test temp dirs");
    git(
        root,
        &[
            "clone",
            "--bare",
            seed.to_str().expect("utf-8 temp path"),
            bare.to_str().expect("utf-8 temp path"),
        ],
    );
    bare
}

/// Working clone of `remote` at `dest` with a test identity.
pub fn clone_to(remote: &Path, dest: &Path) {
    let parent = dest.parent().expect("clone destination has a parent");
    fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
    git(
        parent,
        &[
            "clone",
            remote.to_str().expect("utf-8 temp path"),
            dest.to_str().expect("utf-8 temp path"),
        ],
    );
    configure_identity(dest);
}

/// Commit subjects from HEAD backwards.
pub fn log_subjects(dir: &Path) -> Vec<String> {
    git(dir, &["log", "--format=%s"])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Commit subjects of `branch` in a bare repository.
pub fn remote_subjects(bare: &Path, branch: &str) -> Vec<String> {
    git(bare, &["log", "--format=%s", branch])
        .lines()
        .map(str::to_string)
        .collect()
}
