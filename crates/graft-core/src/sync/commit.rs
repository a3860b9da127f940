//! Commit message and branch name derivation.
//!
//! The branch naming convention is `type/ISSUE-1-ISSUE-2-slug-words`. From
//! explicit arguments the message is `type: description (ISSUE-1, ISSUE-2)`;
//! without arguments the convention is read back from the current branch.

use std::fmt;
use std::str::FromStr;

use super::translate::Translator;
use crate::config::schema::TranslationSettings;

/// Description used for action commits when none is given.
pub const ACTION_COMMIT_DESCRIPTION: &str = "sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    Feature,
    Fix,
    Chore,
    Refactor,
    Docs,
    Test,
    Perf,
    Ci,
    Build,
    Release,
    /// No semantic change, just a re-sync. Exempt from message policies.
    Action,
}

impl CommitType {
    pub const ALL: [CommitType; 11] = [
        CommitType::Feature,
        CommitType::Fix,
        CommitType::Chore,
        CommitType::Refactor,
        CommitType::Docs,
        CommitType::Test,
        CommitType::Perf,
        CommitType::Ci,
        CommitType::Build,
        CommitType::Release,
        CommitType::Action,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommitType::Feature => "feature",
            CommitType::Fix => "fix",
            CommitType::Chore => "chore",
            CommitType::Refactor => "refactor",
            CommitType::Docs => "docs",
            CommitType::Test => "test",
            CommitType::Perf => "perf",
            CommitType::Ci => "ci",
            CommitType::Build => "build",
            CommitType::Release => "release",
            CommitType::Action => "action",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "feat" {
            return Ok(CommitType::Feature);
        }
        CommitType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| anyhow::anyhow!("Unknown commit type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitData {
    pub commit_message: String,
    /// Branch the commit belongs on. Empty for action commits.
    pub branch_name: String,
    /// `None` when derived from a branch outside the naming convention.
    pub type_of_commit: Option<CommitType>,
    pub is_action_commit: bool,
    pub issues: Vec<String>,
    /// Human description without type prefix and issue suffix.
    pub description: String,
}

impl CommitData {
    /// Derive from CLI arguments. `None` when there is nothing to derive from.
    pub fn from_args(
        commit_type: Option<CommitType>,
        message: Option<&str>,
        issues: &[String],
    ) -> Option<Self> {
        let message = message.map(str::trim).filter(|m| !m.is_empty());
        let commit_type = match (commit_type, message) {
            (Some(CommitType::Action), _) => CommitType::Action,
            (_, None) => return None,
            (Some(t), Some(_)) => t,
            (None, Some(_)) => CommitType::Feature,
        };
        let description = message.unwrap_or(ACTION_COMMIT_DESCRIPTION).to_string();
        let issues: Vec<String> = issues
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        Some(Self::compose(commit_type, description, issues))
    }

    /// Read the naming convention back from `branch`.
    ///
    /// A branch outside the convention yields its own name as message.
    pub fn from_branch(branch: &str) -> Self {
        let parsed = branch.split_once('/').and_then(|(prefix, rest)| {
            let commit_type = prefix.parse::<CommitType>().ok()?;
            Some((commit_type, rest))
        });
        let Some((commit_type, rest)) = parsed else {
            return Self {
                commit_message: branch.to_string(),
                branch_name: branch.to_string(),
                type_of_commit: None,
                is_action_commit: false,
                issues: Vec::new(),
                description: branch.to_string(),
            };
        };

        let tokens: Vec<&str> = rest.split('-').filter(|t| !t.is_empty()).collect();
        let mut issues = Vec::new();
        let mut i = 0;
        while i + 1 < tokens.len() && is_issue_key(tokens[i]) && is_number(tokens[i + 1]) {
            issues.push(format!("{}-{}", tokens[i], tokens[i + 1]));
            i += 2;
        }
        let description = tokens[i..].join(" ");
        let description = if description.is_empty() && commit_type == CommitType::Action {
            ACTION_COMMIT_DESCRIPTION.to_string()
        } else {
            description
        };

        let mut data = Self::compose(commit_type, description, issues);
        data.branch_name = branch.to_string();
        data
    }

    fn compose(commit_type: CommitType, description: String, issues: Vec<String>) -> Self {
        let is_action_commit = commit_type == CommitType::Action;
        let branch_name = if is_action_commit {
            String::new()
        } else {
            branch_name_for(commit_type, &description, &issues)
        };
        Self {
            commit_message: message_for(commit_type, &description, &issues),
            branch_name,
            type_of_commit: Some(commit_type),
            is_action_commit,
            issues,
            description,
        }
    }

    /// Whether the current branch follows the naming convention.
    pub fn follows_convention(&self) -> bool {
        self.type_of_commit.is_some()
    }

    /// Replace the description with its translation and re-derive the names.
    ///
    /// Any translation failure leaves `self` unchanged.
    pub fn translate(&mut self, translator: &dyn Translator, settings: &TranslationSettings) {
        let Some(commit_type) = self.type_of_commit else {
            return;
        };
        if self.is_action_commit || self.description.trim().is_empty() {
            return;
        }
        match translator.translate(&self.description, &settings.source, &settings.target) {
            Ok(translated) if !translated.trim().is_empty() => {
                let translated = translated.trim().to_string();
                tracing::debug!(from = %self.description, to = %translated, "translated commit description");
                self.commit_message = message_for(commit_type, &translated, &self.issues);
                self.branch_name = branch_name_for(commit_type, &translated, &self.issues);
                self.description = translated;
            }
            Ok(_) => tracing::warn!("translation returned nothing; keeping original message"),
            Err(err) => tracing::warn!("translation failed; keeping original message: {:#}", err),
        }
    }
}

/// Log a warning when argument-derived and branch-derived data disagree.
pub fn warn_on_disagreement(from_args: &CommitData, from_branch: &CommitData) -> bool {
    if !from_branch.follows_convention() || from_args.is_action_commit {
        return false;
    }
    let disagree = from_args.branch_name != from_branch.branch_name
        || from_args.type_of_commit != from_branch.type_of_commit;
    if disagree {
        tracing::warn!(
            arguments = %from_args.branch_name,
            branch = %from_branch.branch_name,
            "commit arguments do not match the current branch"
        );
    }
    disagree
}

fn message_for(commit_type: CommitType, description: &str, issues: &[String]) -> String {
    if issues.is_empty() {
        format!("{}: {}", commit_type, description)
    } else {
        format!("{}: {} ({})", commit_type, description, issues.join(", "))
    }
}

fn branch_name_for(commit_type: CommitType, description: &str, issues: &[String]) -> String {
    let slug = slugify(description);
    let mut parts: Vec<String> = issues.to_vec();
    if !slug.is_empty() {
        parts.push(slug);
    }
    format!("{}/{}", commit_type, parts.join("-"))
}

/// Lowercase words joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn is_issue_key(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Suffixing;

    impl Translator for Suffixing {
        fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            Ok(format!("{} translated", text))
        }
    }

    struct Broken;

    impl Translator for Broken {
        fn translate(&self, _text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
    }

    fn settings() -> TranslationSettings {
        TranslationSettings {
            source: "de".to_string(),
            target: "en".to_string(),
            endpoint: "http://localhost:0".to_string(),
        }
    }

    #[test]
    fn from_args_builds_message_and_branch() {
        let data = CommitData::from_args(
            Some(CommitType::Fix),
            Some("Handle empty input"),
            &["ABC-12".to_string(), "ABC-13".to_string()],
        )
        .unwrap();

        assert_eq!(data.commit_message, "fix: Handle empty input (ABC-12, ABC-13)");
        assert_eq!(data.branch_name, "fix/ABC-12-ABC-13-handle-empty-input");
        assert!(!data.is_action_commit);
    }

    #[test]
    fn from_args_needs_a_message_unless_action() {
        assert!(CommitData::from_args(Some(CommitType::Fix), None, &[]).is_none());
        assert!(CommitData::from_args(None, Some("  "), &[]).is_none());

        let action = CommitData::from_args(Some(CommitType::Action), None, &[]).unwrap();
        assert!(action.is_action_commit);
        assert_eq!(action.commit_message, "action: sync");
        assert!(action.branch_name.is_empty());
    }

    #[test]
    fn from_branch_reverses_convention() {
        let data = CommitData::from_branch("feature/PRJ-7-OPS-2-add-login-page");
        assert_eq!(data.type_of_commit, Some(CommitType::Feature));
        assert_eq!(data.issues, vec!["PRJ-7", "OPS-2"]);
        assert_eq!(data.description, "add login page");
        assert_eq!(data.commit_message, "feature: add login page (PRJ-7, OPS-2)");
        assert_eq!(data.branch_name, "feature/PRJ-7-OPS-2-add-login-page");
    }

    #[test]
    fn from_branch_without_convention_uses_branch_name() {
        let data = CommitData::from_branch("master");
        assert_eq!(data.commit_message, "master");
        assert_eq!(data.branch_name, "master");
        assert!(!data.follows_convention());

        let unknown = CommitData::from_branch("wip/stuff");
        assert_eq!(unknown.commit_message, "wip/stuff");
    }

    #[test]
    fn args_and_branch_agree_on_round_trip() {
        let args = CommitData::from_args(Some(CommitType::Docs), Some("Update readme"), &[]).unwrap();
        let branch = CommitData::from_branch(&args.branch_name);
        assert!(!warn_on_disagreement(&args, &branch));

        let other = CommitData::from_branch("fix/something-else");
        assert!(warn_on_disagreement(&args, &other));
    }

    #[test]
    fn translation_rewrites_message_and_branch() {
        let mut data = CommitData::from_branch("fix/ABC-1-fehler-beheben");
        data.translate(&Suffixing, &settings());
        assert_eq!(data.commit_message, "fix: fehler beheben translated (ABC-1)");
        assert_eq!(data.branch_name, "fix/ABC-1-fehler-beheben-translated");
    }

    #[test]
    fn translation_failure_keeps_message() {
        let mut data = CommitData::from_branch("fix/fehler-beheben");
        let before = data.clone();
        data.translate(&Broken, &settings());
        assert_eq!(data, before);
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Add: the NEW thing!! "), "add-the-new-thing");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn commit_type_parsing() {
        assert_eq!("feat".parse::<CommitType>().unwrap(), CommitType::Feature);
        assert_eq!("Release".parse::<CommitType>().unwrap(), CommitType::Release);
        assert!("wip".parse::<CommitType>().is_err());
    }
}
