//! Operator interaction contract.
//!
//! Orchestrators never talk to the terminal directly. Every confirmation,
//! retry decision and selection goes through a [`Prompter`], so the CLI can
//! plug in terminal widgets and tests can script the answers.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::WorkspaceError;

pub trait Prompter {
    /// Yes/no question.
    fn confirm(&self, question: &str, default: bool) -> anyhow::Result<bool>;

    /// Pick exactly one of `choices`; returns its index.
    fn select(&self, question: &str, choices: &[String], default: usize) -> anyhow::Result<usize>;

    /// Pick any subset of `choices`; returns the selected indices.
    fn multi_select(
        &self,
        question: &str,
        choices: &[String],
        defaults: &[bool],
    ) -> anyhow::Result<Vec<usize>>;

    /// Free-text input.
    fn input(&self, question: &str, default: Option<&str>) -> anyhow::Result<String>;
}

/// Answers every prompt with its default. Backs `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeDefaults;

impl Prompter for AssumeDefaults {
    fn confirm(&self, question: &str, default: bool) -> anyhow::Result<bool> {
        tracing::debug!(question, default, "assuming default answer");
        Ok(default)
    }

    fn select(&self, question: &str, choices: &[String], default: usize) -> anyhow::Result<usize> {
        tracing::debug!(question, choice = ?choices.get(default), "assuming default choice");
        Ok(default)
    }

    fn multi_select(
        &self,
        _question: &str,
        _choices: &[String],
        defaults: &[bool],
    ) -> anyhow::Result<Vec<usize>> {
        Ok(defaults
            .iter()
            .enumerate()
            .filter(|(_, selected)| **selected)
            .map(|(i, _)| i)
            .collect())
    }

    fn input(&self, question: &str, default: Option<&str>) -> anyhow::Result<String> {
        default
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("No default available for prompt: {}", question))
    }
}

/// One pre-recorded answer for a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    /// Select by index.
    Select(usize),
    /// Select by exact choice label.
    Pick(String),
    MultiSelect(Vec<usize>),
    Input(String),
}

impl Answer {
    pub fn pick(label: impl Into<String>) -> Self {
        Self::Pick(label.into())
    }
}

/// Deterministic prompter that replays a fixed list of answers.
///
/// Running out of answers is an error rather than a default, so a test fails
/// loudly when the flow asks something unexpected.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }

    fn next(&self, question: &str) -> anyhow::Result<Answer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        let mut answers = self
            .answers
            .lock()
            .map_err(|_| anyhow::anyhow!("Scripted prompter lock poisoned"))?;
        answers.pop_front().ok_or_else(|| {
            WorkspaceError::NoScriptedAnswer {
                question: question.to_string(),
            }
            .into()
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str, _default: bool) -> anyhow::Result<bool> {
        match self.next(question)? {
            Answer::Confirm(value) => Ok(value),
            other => anyhow::bail!("Expected confirm answer for '{}', got {:?}", question, other),
        }
    }

    fn select(&self, question: &str, choices: &[String], _default: usize) -> anyhow::Result<usize> {
        match self.next(question)? {
            Answer::Select(index) if index < choices.len() => Ok(index),
            Answer::Pick(label) => choices
                .iter()
                .position(|c| *c == label)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a choice of '{}'", label, question)),
            other => anyhow::bail!("Expected select answer for '{}', got {:?}", question, other),
        }
    }

    fn multi_select(
        &self,
        question: &str,
        choices: &[String],
        _defaults: &[bool],
    ) -> anyhow::Result<Vec<usize>> {
        match self.next(question)? {
            Answer::MultiSelect(indices) if indices.iter().all(|i| *i < choices.len()) => {
                Ok(indices)
            }
            other => anyhow::bail!(
                "Expected multi-select answer for '{}', got {:?}",
                question,
                other
            ),
        }
    }

    fn input(&self, question: &str, _default: Option<&str>) -> anyhow::Result<String> {
        match self.next(question)? {
            Answer::Input(text) => Ok(text),
            other => anyhow::bail!("Expected input answer for '{}', got {:?}", question, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scripted_answers_are_replayed_in_order() {
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(false),
            Answer::pick("Skip"),
            Answer::MultiSelect(vec![0, 2]),
        ]);
        let choices = labels(&["Retry", "Skip", "Exit"]);

        assert!(!prompter.confirm("clone?", true).unwrap());
        assert_eq!(prompter.select("retry?", &choices, 0).unwrap(), 1);
        assert_eq!(
            prompter.multi_select("which?", &choices, &[]).unwrap(),
            vec![0, 2]
        );
        assert_eq!(prompter.remaining(), 0);
        assert_eq!(prompter.asked(), vec!["clone?", "retry?", "which?"]);
    }

    #[test]
    fn exhausted_script_is_an_error() {
        let prompter = ScriptedPrompter::default();
        let err = prompter.confirm("anything?", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::NoScriptedAnswer { .. })
        ));
    }

    #[test]
    fn assume_defaults_uses_defaults() {
        let prompter = AssumeDefaults;
        let choices = labels(&["a", "b", "c"]);
        assert!(prompter.confirm("ok?", true).unwrap());
        assert_eq!(prompter.select("pick", &choices, 2).unwrap(), 2);
        assert_eq!(
            prompter
                .multi_select("pick", &choices, &[true, false, true])
                .unwrap(),
            vec![0, 2]
        );
        assert!(prompter.input("name", None).is_err());
    }
}
