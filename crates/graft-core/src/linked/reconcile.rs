//! Pure reconciliation of a declared linked-projects config.

use std::collections::HashSet;

use crate::git::remote::{self, RemoteFlavor};

use super::schema::{LinkedProject, LinkedProjectsConfig};

/// Complete and de-duplicate a config.
///
/// - clone paths are normalized and, when empty, taken from the URL basename
/// - entries without any URL get one derived from `owner_origin`
/// - ssh and http variants are derived from each other
/// - a missing default branch becomes `mainline`
/// - entries sharing a clone path collapse into the first one
///
/// Applying it to its own output changes nothing.
pub fn reconcile(
    config: &LinkedProjectsConfig,
    owner_origin: Option<&str>,
    mainline: &str,
) -> LinkedProjectsConfig {
    let mut seen = HashSet::new();
    let mut projects = Vec::with_capacity(config.projects.len());

    for entry in &config.projects {
        let Some(entry) = reconcile_entry(entry, owner_origin, mainline) else {
            tracing::warn!("dropping linked project without clone path or remote URL");
            continue;
        };
        if !seen.insert(entry.relative_clone_path.clone()) {
            tracing::debug!(
                clone_path = %entry.relative_clone_path,
                "dropping duplicate linked project"
            );
            continue;
        }
        projects.push(entry);
    }

    LinkedProjectsConfig {
        prefix: config.prefix.clone(),
        skip_recursive_push: config.skip_recursive_push,
        projects,
    }
}

fn reconcile_entry(
    entry: &LinkedProject,
    owner_origin: Option<&str>,
    mainline: &str,
) -> Option<LinkedProject> {
    let mut entry = entry.clone();
    entry.relative_clone_path = normalize_clone_path(&entry.relative_clone_path);

    if entry.relative_clone_path.is_empty() {
        entry.relative_clone_path = [
            &entry.remote_url,
            &entry.remote_url_ssh,
            &entry.remote_url_http,
        ]
        .into_iter()
        .flatten()
        .find_map(|url| remote::basename(url))?;
    }

    let has_any_url =
        entry.remote_url.is_some() || entry.remote_url_ssh.is_some() || entry.remote_url_http.is_some();
    if !has_any_url
        && let Some(origin) = owner_origin
        && let Some(name) = remote::basename(&entry.relative_clone_path)
    {
        entry.remote_url = remote::with_basename(origin, &name);
    }

    if let Some(url) = entry.remote_url.clone() {
        match remote::flavor(&url) {
            RemoteFlavor::Ssh => {
                entry.remote_url_ssh.get_or_insert(url.clone());
                if entry.remote_url_http.is_none() {
                    entry.remote_url_http = remote::ssh_to_http(&url);
                }
            }
            RemoteFlavor::Http => {
                entry.remote_url_http.get_or_insert(url.clone());
                if entry.remote_url_ssh.is_none() {
                    entry.remote_url_ssh = remote::http_to_ssh(&url);
                }
            }
            RemoteFlavor::Other => {}
        }
    }
    if entry.remote_url_http.is_none()
        && let Some(ssh) = &entry.remote_url_ssh
    {
        entry.remote_url_http = remote::ssh_to_http(ssh);
    }
    if entry.remote_url_ssh.is_none()
        && let Some(http) = &entry.remote_url_http
    {
        entry.remote_url_ssh = remote::http_to_ssh(http);
    }

    if entry.default_branch.as_deref().is_none_or(str::is_empty) {
        entry.default_branch = Some(mainline.to_string());
    }

    Some(entry)
}

/// `./libs\\core/` → `libs/core`
pub fn normalize_clone_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(projects: Vec<LinkedProject>) -> LinkedProjectsConfig {
        LinkedProjectsConfig {
            projects,
            ..Default::default()
        }
    }

    #[test]
    fn derives_url_from_owner_origin() {
        let input = config(vec![LinkedProject::new("b")]);
        let out = reconcile(&input, Some("git@host:org/a.git"), "master");

        let entry = &out.projects[0];
        assert_eq!(entry.remote_url.as_deref(), Some("git@host:org/b.git"));
        assert_eq!(entry.remote_url_ssh.as_deref(), Some("git@host:org/b.git"));
        assert_eq!(entry.remote_url_http.as_deref(), Some("https://host/org/b.git"));
        assert_eq!(entry.default_branch.as_deref(), Some("master"));
    }

    #[test]
    fn derives_clone_path_from_url() {
        let input = config(vec![
            LinkedProject::default().with_remote_url("https://host/org/utils.git"),
        ]);
        let out = reconcile(&input, None, "main");

        let entry = &out.projects[0];
        assert_eq!(entry.relative_clone_path, "utils");
        assert_eq!(entry.remote_url_ssh.as_deref(), Some("git@host:org/utils.git"));
    }

    #[test]
    fn deduplicates_by_clone_path() {
        let input = config(vec![
            LinkedProject::new("./b/").with_purpose("first"),
            LinkedProject::new("b").with_purpose("second"),
            LinkedProject::new("c"),
        ]);
        let out = reconcile(&input, None, "master");

        assert_eq!(out.projects.len(), 2);
        assert_eq!(out.projects[0].purpose.as_deref(), Some("first"));
        assert_eq!(out.projects[1].relative_clone_path, "c");
    }

    #[test]
    fn is_idempotent() {
        let input = config(vec![
            LinkedProject::new("b"),
            LinkedProject::default().with_remote_url("/srv/git/local.git"),
            LinkedProject::new("nested/c").with_default_branch("develop"),
        ]);
        let once = reconcile(&input, Some("https://host/org/a"), "master");
        let twice = reconcile(&once, Some("https://host/org/a"), "master");
        assert_eq!(once, twice);
    }

    #[test]
    fn drops_entries_without_any_identity() {
        let input = config(vec![LinkedProject::default()]);
        assert!(reconcile(&input, None, "master").projects.is_empty());
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_clone_path("./libs\\core/"), "libs/core");
        assert_eq!(normalize_clone_path(" b "), "b");
    }
}
