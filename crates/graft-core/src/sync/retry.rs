//! Retry menus shown after a failed external operation.

use crate::error::WorkspaceError;
use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryChoice {
    Retry,
    Force,
    Skip,
    SkipLint,
}

/// Which operation failed; decides the offered choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMenu {
    Pull,
    Push,
    Clone,
    Lint,
}

enum Entry {
    Choice(RetryChoice),
    Exit,
}

impl RetryMenu {
    fn entries(self) -> Vec<(&'static str, Entry)> {
        use RetryChoice::*;
        match self {
            RetryMenu::Pull | RetryMenu::Clone => vec![
                ("Retry", Entry::Choice(Retry)),
                ("Skip", Entry::Choice(Skip)),
                ("Exit", Entry::Exit),
            ],
            RetryMenu::Push => vec![
                ("Retry", Entry::Choice(Retry)),
                ("Force push", Entry::Choice(Force)),
                ("Skip", Entry::Choice(Skip)),
                ("Exit", Entry::Exit),
            ],
            RetryMenu::Lint => vec![
                ("Retry", Entry::Choice(Retry)),
                ("Skip lint", Entry::Choice(SkipLint)),
                ("Exit", Entry::Exit),
            ],
        }
    }
}

/// Ask what to do after a failure. "Exit" becomes [`WorkspaceError::ExitRequested`].
///
/// The default answer is the skip entry, so unattended runs never loop.
pub fn ask_retry(
    prompter: &dyn Prompter,
    menu: RetryMenu,
    question: &str,
) -> anyhow::Result<RetryChoice> {
    let mut entries = menu.entries();
    let labels: Vec<String> = entries.iter().map(|(label, _)| label.to_string()).collect();
    let default = entries
        .iter()
        .position(|(_, e)| matches!(e, Entry::Choice(RetryChoice::Skip | RetryChoice::SkipLint)))
        .unwrap_or(0);
    let picked = prompter.select(question, &labels, default)?;
    if picked >= entries.len() {
        anyhow::bail!("Invalid choice {} for '{}'", picked, question);
    }
    match entries.swap_remove(picked).1 {
        Entry::Choice(choice) => {
            tracing::debug!(?menu, ?choice, "retry decision");
            Ok(choice)
        }
        Entry::Exit => Err(WorkspaceError::ExitRequested.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_exit_requested;
    use crate::prompt::{Answer, ScriptedPrompter};

    #[test]
    fn push_menu_offers_force_and_skip() {
        let prompter = ScriptedPrompter::new([Answer::pick("Force push"), Answer::pick("Skip")]);
        assert_eq!(ask_retry(&prompter, RetryMenu::Push, "q").unwrap(), RetryChoice::Force);
        assert_eq!(ask_retry(&prompter, RetryMenu::Push, "q").unwrap(), RetryChoice::Skip);
    }

    #[test]
    fn exit_is_an_error() {
        let prompter = ScriptedPrompter::new([Answer::pick("Exit")]);
        let err = ask_retry(&prompter, RetryMenu::Pull, "q").unwrap_err();
        assert!(is_exit_requested(&err));
    }

    #[test]
    fn unattended_runs_skip() {
        let choice = ask_retry(&crate::prompt::AssumeDefaults, RetryMenu::Lint, "q").unwrap();
        assert_eq!(choice, RetryChoice::SkipLint);
    }

    #[test]
    fn pull_menu_has_no_force() {
        let prompter = ScriptedPrompter::new([Answer::pick("Force push")]);
        assert!(ask_retry(&prompter, RetryMenu::Pull, "q").is_err());
    }
}
