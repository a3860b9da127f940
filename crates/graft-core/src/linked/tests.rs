//! Tests for linked-project maintenance against real git repositories.

use std::path::Path;

use tempfile::TempDir;

use super::*;
use crate::git::Git;
use crate::prompt::{Answer, ScriptedPrompter};
use crate::workspace::WorkspaceRegistry;

fn run_git(dir: &Path, args: &[&str]) {
    Git::new(dir)
        .run(args)
        .unwrap_or_else(|e| panic!("git command failed: {:?}: {}", args, e));
}

fn init_repo(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init"]);
    run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

fn write_project(dir: &Path, name: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("package.json"),
        format!(r#"{{ "name": "{}", "version": "1.0.0" }}"#, name),
    )
    .unwrap();
    std::fs::write(dir.join("graft.toml"), "").unwrap();
}

/// Bare repository with one commit on master.
fn bare_remote(root: &Path, name: &str) -> std::path::PathBuf {
    let work = root.join("seed").join(name);
    init_repo(&work);
    write_project(&work, name);
    run_git(&work, &["add", "--all", "."]);
    run_git(&work, &["commit", "-m", "seed"]);
    let bare = root.join("remotes").join(format!("{}.git", name));
    std::fs::create_dir_all(bare.parent().unwrap()).unwrap();
    run_git(
        root,
        &["clone", "--bare", work.to_str().unwrap(), bare.to_str().unwrap()],
    );
    bare
}

#[test]
fn config_file_created_only_for_marked_projects() {
    let temp = TempDir::new().unwrap();
    let marked = temp.path().join("marked");
    write_project(&marked, "marked");
    let plain = temp.path().join("plain");
    std::fs::create_dir_all(&plain).unwrap();
    let registry = WorkspaceRegistry::new();

    let config = registry.resolve(&marked).unwrap().linked().get_config().unwrap();
    assert!(config.projects.is_empty());
    assert!(marked.join(LINKED_PROJECTS_FILE).is_file());

    registry.resolve(&plain).unwrap().linked().get_config().unwrap();
    assert!(!plain.join(LINKED_PROJECTS_FILE).exists());
}

#[test]
fn reconciled_config_is_written_once() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    init_repo(&owner);
    write_project(&owner, "a");
    run_git(&owner, &["remote", "add", "origin", "git@host:org/a.git"]);
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        "{\n  // siblings\n  \"projects\": [ { \"relativeClonePath\": \"b\" }, ],\n}\n",
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();

    let config = project.linked().get_config().unwrap();
    let entry = &config.projects[0];
    assert_eq!(entry.remote_url.as_deref(), Some("git@host:org/b.git"));
    assert_eq!(entry.remote_url_http.as_deref(), Some("https://host/org/b.git"));
    assert_eq!(entry.default_branch.as_deref(), Some("master"));

    let written = std::fs::read_to_string(owner.join(LINKED_PROJECTS_FILE)).unwrap();
    assert!(written.contains("remoteUrlSsh"));

    // A second load finds nothing to change and leaves the bytes alone.
    std::fs::write(owner.join(LINKED_PROJECTS_FILE), &written).unwrap();
    let again = project.linked().get_config().unwrap();
    assert_eq!(again, config);
    assert_eq!(std::fs::read_to_string(owner.join(LINKED_PROJECTS_FILE)).unwrap(), written);
    assert_eq!(project.linked_config_snapshot(), Some(config));
}

#[test]
fn unreadable_config_is_treated_as_empty_and_kept() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    std::fs::write(owner.join(LINKED_PROJECTS_FILE), "{ broken").unwrap();
    let registry = WorkspaceRegistry::new();

    let config = registry.resolve(&owner).unwrap().linked().get_config().unwrap();
    assert!(config.projects.is_empty());
    assert_eq!(
        std::fs::read_to_string(owner.join(LINKED_PROJECTS_FILE)).unwrap(),
        "{ broken"
    );
}

#[test]
fn add_and_remove_entries() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();

    project
        .linked()
        .add(LinkedProject::new("libs/b").with_remote_url("https://host/org/b.git"))
        .unwrap();
    let config = project
        .linked()
        .add(LinkedProject::new("c").with_remote_url("https://host/org/c.git"))
        .unwrap();
    assert_eq!(config.projects.len(), 2);

    let config = project.linked().remove("./libs/b/").unwrap();
    assert_eq!(config.projects.len(), 1);
    assert_eq!(config.projects[0].relative_clone_path, "c");
}

#[test]
fn detect_finds_git_roots_and_unversioned_projects() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    init_repo(&owner.join("b"));
    write_project(&owner.join("unversioned"), "unversioned");
    init_repo(&owner.join("libs").join("c"));
    init_repo(&owner.join("node_modules").join("d"));
    let registry = WorkspaceRegistry::new();
    let linked = registry.resolve(&owner).unwrap();

    let shallow: Vec<_> = linked
        .linked()
        .detect(false, false)
        .into_iter()
        .map(|p| p.relative_clone_path)
        .collect();
    assert_eq!(shallow, vec!["b"]);

    let deep: Vec<_> = linked
        .linked()
        .detect(true, true)
        .into_iter()
        .map(|p| p.relative_clone_path)
        .collect();
    assert_eq!(deep, vec!["b", "libs/c", "unversioned"]);
}

#[test]
fn clone_missing_clones_and_excludes() {
    let temp = TempDir::new().unwrap();
    let remote = bare_remote(temp.path(), "b");
    let owner = temp.path().join("a");
    init_repo(&owner);
    write_project(&owner, "a");
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        format!(
            r#"{{ "projects": [ {{ "relativeClonePath": "b", "remoteUrl": "{}" }} ] }}"#,
            remote.display()
        ),
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();
    // Remember that "b" was missing before the clone.
    assert!(registry.resolve(owner.join("b")).is_none());

    let index = LocalIndex::new(temp.path().join("index").join("projects.json"));
    let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
    let report = project
        .linked()
        .clone_missing(SyncAction::Pull, false, &prompter, &index)
        .unwrap();

    assert_eq!(report.cloned, vec![owner.join("b")]);
    assert!(owner.join("b").join(".git").exists());
    assert_eq!(registry.resolve(owner.join("b")).unwrap().name(), "b");
    let exclude =
        std::fs::read_to_string(owner.join(".git").join("info").join("exclude")).unwrap();
    assert!(exclude.contains("/b"));
    assert_eq!(index.locations().unwrap(), vec![owner.join("b")]);

    let children = project.linked().git_children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name(), "b");
}

#[test]
fn clone_failure_can_be_skipped() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    let missing = temp.path().join("remotes").join("nope.git");
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        format!(
            r#"{{ "projects": [ {{ "relativeClonePath": "b", "remoteUrl": "{}" }} ] }}"#,
            missing.display()
        ),
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();
    let index = LocalIndex::new(temp.path().join("projects.json"));

    let prompter = ScriptedPrompter::new([Answer::pick("Retry"), Answer::pick("Skip")]);
    let report = project
        .linked()
        .clone_missing(SyncAction::Pull, true, &prompter, &index)
        .unwrap();

    assert!(report.cloned.is_empty());
    assert_eq!(report.skipped, vec!["b".to_string()]);
    assert_eq!(prompter.remaining(), 0);
    assert!(!owner.join("b").exists());
}

#[test]
fn existing_plain_folder_is_never_replaced_by_a_clone() {
    let temp = TempDir::new().unwrap();
    let remote = bare_remote(temp.path(), "b");
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    let occupied = owner.join("b");
    std::fs::create_dir_all(&occupied).unwrap();
    std::fs::write(occupied.join("precious.txt"), "keep me").unwrap();
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        format!(
            r#"{{ "projects": [ {{ "relativeClonePath": "b", "remoteUrl": "{}" }} ] }}"#,
            remote.display()
        ),
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();
    let index = LocalIndex::new(temp.path().join("projects.json"));
    let prompter = ScriptedPrompter::new(Vec::<Answer>::new());

    let report = project
        .linked()
        .clone_missing(SyncAction::Pull, true, &prompter, &index)
        .unwrap();

    assert!(report.cloned.is_empty());
    assert_eq!(report.skipped, vec!["b".to_string()]);
    assert_eq!(
        std::fs::read_to_string(occupied.join("precious.txt")).unwrap(),
        "keep me"
    );
    assert!(!occupied.join(".git").exists());
}

#[test]
fn sibling_clone_paths_are_checked_where_they_live() {
    let temp = TempDir::new().unwrap();
    let remote_b = bare_remote(temp.path(), "b");
    let remote_c = bare_remote(temp.path(), "c");
    let ws = temp.path().join("ws");
    let owner = ws.join("a");
    init_repo(&owner);
    write_project(&owner, "a");
    run_git(
        &ws,
        &["clone", remote_b.to_str().unwrap(), ws.join("b").to_str().unwrap()],
    );
    std::fs::write(ws.join("b").join("scratch.txt"), "local work").unwrap();
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        format!(
            r#"{{ "projects": [
                {{ "relativeClonePath": "../b", "remoteUrl": "{}" }},
                {{ "relativeClonePath": "../c", "remoteUrl": "{}" }}
            ] }}"#,
            remote_b.display(),
            remote_c.display()
        ),
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();
    let index = LocalIndex::new(temp.path().join("projects.json"));
    let prompter = ScriptedPrompter::new(Vec::<Answer>::new());

    let report = project
        .linked()
        .clone_missing(SyncAction::Pull, true, &prompter, &index)
        .unwrap();

    assert_eq!(report.cloned, vec![ws.join("c")]);
    assert!(report.skipped.is_empty());
    assert!(ws.join("c").join(".git").exists());
    assert_eq!(
        std::fs::read_to_string(ws.join("b").join("scratch.txt")).unwrap(),
        "local work"
    );
    let exclude = std::fs::read_to_string(owner.join(".git").join("info").join("exclude"))
        .unwrap_or_default();
    assert!(!exclude.contains(".."));

    let mut names: Vec<String> = project
        .linked()
        .git_children()
        .iter()
        .map(|child| child.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn push_with_auto_stage_never_clones() {
    let temp = TempDir::new().unwrap();
    let owner = temp.path().join("a");
    write_project(&owner, "a");
    std::fs::write(
        owner.join(LINKED_PROJECTS_FILE),
        r#"{ "projects": [ { "relativeClonePath": "b", "remoteUrl": "/nowhere/b.git" } ] }"#,
    )
    .unwrap();
    let registry = WorkspaceRegistry::new();
    let project = registry.resolve(&owner).unwrap();
    let index = LocalIndex::new(temp.path().join("projects.json"));
    let prompter = ScriptedPrompter::new(Vec::<Answer>::new());

    let report = project
        .linked()
        .clone_missing(SyncAction::Push, true, &prompter, &index)
        .unwrap();
    assert_eq!(report, CloneReport::default());
}
