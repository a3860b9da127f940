//! Remote URL rewriting.
//!
//! Linked projects usually live next to their owner on the same host, so
//! missing URLs are derived from the owner's `origin` and ssh/http forms are
//! derived from each other by pattern.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFlavor {
    /// `git@host:org/repo.git` or `ssh://...`
    Ssh,
    /// `https://host/org/repo.git`
    Http,
    /// Local paths, `file://` URLs and anything else.
    Other,
}

pub fn flavor(url: &str) -> RemoteFlavor {
    if url.starts_with("ssh://") || scp_parts(url).is_some() {
        RemoteFlavor::Ssh
    } else if url.starts_with("http://") || url.starts_with("https://") {
        RemoteFlavor::Http
    } else {
        RemoteFlavor::Other
    }
}

/// `git@host:org/repo.git` → `https://host/org/repo.git`
pub fn ssh_to_http(url: &str) -> Option<String> {
    if let Some((_, host, path)) = scp_parts(url) {
        return Some(format!("https://{}/{}", host, path));
    }
    if url.starts_with("ssh://") {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        return Some(format!("https://{}{}", host, parsed.path()));
    }
    None
}

/// `https://host/org/repo.git` → `git@host:org/repo.git`
pub fn http_to_ssh(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    let path = parsed.path().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("git@{}:{}", host, path))
}

/// Repository name: last path segment without `.git`.
pub fn basename(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Replace the repository name in `url`, keeping a `.git` suffix if present.
pub fn with_basename(url: &str, name: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let cut = trimmed.rfind(['/', ':'])?;
    let (head, last) = trimmed.split_at(cut + 1);
    if last.is_empty() {
        return None;
    }
    let suffix = if last.ends_with(".git") { ".git" } else { "" };
    Some(format!("{}{}{}", head, name, suffix))
}

/// Owner segment directly above the repository name (`org` in `host:org/repo`).
pub fn organization(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let mut segments = trimmed.rsplit(['/', ':']);
    segments.next()?;
    let owner = segments.next()?;
    if owner.is_empty() || owner.contains('@') || owner.contains('.') {
        return None;
    }
    Some(owner.to_string())
}

/// Split an scp-like `user@host:path` remote.
fn scp_parts(url: &str) -> Option<(&str, &str, &str)> {
    if url.contains("://") {
        return None;
    }
    let (user_host, path) = url.split_once(':')?;
    let (user, host) = user_host.split_once('@')?;
    if user.is_empty() || host.is_empty() || path.is_empty() || host.contains('/') {
        return None;
    }
    Some((user, host, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flavors() {
        assert_eq!(flavor("git@github.com:org/repo.git"), RemoteFlavor::Ssh);
        assert_eq!(flavor("ssh://git@host/org/repo.git"), RemoteFlavor::Ssh);
        assert_eq!(flavor("https://github.com/org/repo.git"), RemoteFlavor::Http);
        assert_eq!(flavor("/srv/git/repo.git"), RemoteFlavor::Other);
        assert_eq!(flavor("file:///srv/git/repo.git"), RemoteFlavor::Other);
    }

    #[test]
    fn rewrites_between_ssh_and_http() {
        assert_eq!(
            ssh_to_http("git@host:org/b.git").as_deref(),
            Some("https://host/org/b.git")
        );
        assert_eq!(
            ssh_to_http("ssh://git@host/org/b.git").as_deref(),
            Some("https://host/org/b.git")
        );
        assert_eq!(
            http_to_ssh("https://host/org/b.git").as_deref(),
            Some("git@host:org/b.git")
        );
        assert_eq!(http_to_ssh("/srv/git/b.git"), None);
        assert_eq!(ssh_to_http("/srv/git/b.git"), None);
    }

    #[test]
    fn basename_and_substitution() {
        assert_eq!(basename("git@host:org/b.git").as_deref(), Some("b"));
        assert_eq!(basename("https://host/org/core/").as_deref(), Some("core"));
        assert_eq!(basename("/srv/git/lib.git").as_deref(), Some("lib"));

        assert_eq!(
            with_basename("git@host:org/a.git", "b").as_deref(),
            Some("git@host:org/b.git")
        );
        assert_eq!(
            with_basename("https://host/org/a", "b").as_deref(),
            Some("https://host/org/b")
        );
    }

    #[test]
    fn organization_is_owner_segment() {
        assert_eq!(organization("git@host:acme/b.git").as_deref(), Some("acme"));
        assert_eq!(
            organization("https://github.com/acme/b.git").as_deref(),
            Some("acme")
        );
        assert_eq!(organization("b.git"), None);
    }
}
