//! Edit scripts: a JSON array of commands replayed through an edit session.
//!
//! ```json
//! [
//!   { "op": "set", "path": "hero.title", "value": "Welcome" },
//!   { "op": "add", "section": "pricing" },
//!   { "op": "reorder", "source": "pricing", "target": "hero" },
//!   { "op": "undo" }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitekit_editor::{EditSession, EditorError, MutationOutcome, SectionChange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditCommand {
    Set { path: String, value: Value },
    Add { section: String },
    Remove { section: String },
    Reorder { source: String, target: String },
    Toggle { section: String },
    Undo,
    Redo,
}

/// What one command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Applied,
    /// Refused or aborted; the message says why
    Skipped(String),
}

/// Summary of a replayed script
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScriptReport {
    pub applied: usize,
    pub skipped: Vec<(usize, String)>,
}

impl EditCommand {
    pub fn run(&self, session: &mut EditSession) -> Result<CommandResult, EditorError> {
        let result = match self {
            EditCommand::Set { path, value } => {
                match session.set(path, value.clone())? {
                    MutationOutcome::Applied { .. } => CommandResult::Applied,
                    MutationOutcome::Aborted(err) => CommandResult::Skipped(err.to_string()),
                }
            }
            EditCommand::Add { section } => change(session.add_section(section)?),
            EditCommand::Remove { section } => change(session.remove_section(section)?),
            EditCommand::Reorder { source, target } => change(session.reorder(source, target)?),
            EditCommand::Toggle { section } => change(session.toggle_visibility(section)?),
            EditCommand::Undo => history(session.undo()?, "nothing to undo"),
            EditCommand::Redo => history(session.redo()?, "nothing to redo"),
        };
        Ok(result)
    }
}

/// Replay `commands` in order. Skipped commands are reported, not fatal.
pub fn run_script(
    session: &mut EditSession,
    commands: &[EditCommand],
) -> Result<ScriptReport, EditorError> {
    let mut report = ScriptReport::default();
    for (index, command) in commands.iter().enumerate() {
        match command.run(session)? {
            CommandResult::Applied => report.applied += 1,
            CommandResult::Skipped(reason) => {
                tracing::warn!("[Script] command {} skipped: {}", index, reason);
                report.skipped.push((index, reason));
            }
        }
    }
    Ok(report)
}

fn change(change: SectionChange) -> CommandResult {
    match change {
        SectionChange::Rejected(rejection) => CommandResult::Skipped(rejection.to_string()),
        _ => CommandResult::Applied,
    }
}

fn history(done: bool, reason: &str) -> CommandResult {
    if done {
        CommandResult::Applied
    } else {
        CommandResult::Skipped(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"[
            { "op": "set", "path": "hero.title", "value": "Hi" },
            { "op": "reorder", "source": "faq", "target": "hero" },
            { "op": "undo" }
        ]"#;

        let commands: Vec<EditCommand> = serde_json::from_str(json).unwrap();
        assert_eq!(
            commands,
            vec![
                EditCommand::Set {
                    path: "hero.title".to_string(),
                    value: Value::from("Hi"),
                },
                EditCommand::Reorder {
                    source: "faq".to_string(),
                    target: "hero".to_string(),
                },
                EditCommand::Undo,
            ]
        );
    }

    #[test]
    fn test_unknown_op_is_an_error() {
        assert!(serde_json::from_str::<EditCommand>(r#"{ "op": "explode" }"#).is_err());
    }
}
