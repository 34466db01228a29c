use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no editor configured; set edit.editor in config.toml or $VISUAL/$EDITOR")]
    NotConfigured,
    #[error("editor command is empty")]
    EmptyCommand,
    #[error("failed to launch editor {command:?}: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },
}

/// Seam for the external text editor so sessions can be driven in tests.
pub trait Editor {
    /// Open `path` and block until the editor exits.
    fn edit(&mut self, path: &Path) -> Result<(), EditorError>;
}

/// Runs a configured command synchronously with the file path appended as
/// the final argument. The exit status is deliberately not checked; the
/// resulting file content is what matters.
#[derive(Debug, Clone)]
pub struct CommandEditor {
    command: String,
}

impl CommandEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Resolution order: explicit config value, then $VISUAL, then $EDITOR.
    pub fn from_config(configured: Option<&str>) -> Result<Self, EditorError> {
        if let Some(command) = configured {
            return Ok(Self::new(command));
        }
        for var in ["VISUAL", "EDITOR"] {
            if let Ok(command) = std::env::var(var) {
                if !command.trim().is_empty() {
                    return Ok(Self::new(command));
                }
            }
        }
        Err(EditorError::NotConfigured)
    }
}

impl Editor for CommandEditor {
    fn edit(&mut self, path: &Path) -> Result<(), EditorError> {
        let mut tokens = self.command.split_whitespace();
        let program = tokens.next().ok_or(EditorError::EmptyCommand)?;
        let status = Command::new(program)
            .args(tokens)
            .arg(path)
            .status()
            .map_err(|source| EditorError::Launch {
                command: self.command.clone(),
                source,
            })?;
        tracing::debug!(editor = %self.command, status = ?status.code(), "editor exited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_command_wins() {
        let editor = CommandEditor::from_config(Some("vim -f")).expect("editor");
        assert_eq!(editor.command, "vim -f");
    }

    #[test]
    fn empty_command_is_rejected_on_use() {
        let mut editor = CommandEditor::new("   ");
        let err = editor.edit(Path::new("/tmp/x.yaml")).expect_err("empty");
        assert!(matches!(err, EditorError::EmptyCommand));
    }

    #[test]
    #[cfg(unix)]
    fn command_receives_path_as_final_argument() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("edited.yaml");
        std::fs::write(&target, "before\n").expect("write");

        // `touch -c` leaves content alone; success here just means the
        // argv split and spawn worked.
        let mut editor = CommandEditor::new("touch -c");
        editor.edit(&target).expect("edit");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "before\n");
    }
}
