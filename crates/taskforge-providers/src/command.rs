use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::{Error, Result, TextCompleter};

/// Completer that pipes the prompt to an external command's stdin and reads
/// its stdout - the shape of CLI-based assistants (`claude -p`, `llm`, a
/// local wrapper script).
pub struct CommandCompleter {
    program: String,
    args: Vec<String>,
}

impl CommandCompleter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl TextCompleter for CommandCompleter {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        which(&self.program)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await?;
            // Close stdin so the command sees EOF.
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Upstream(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn which(program: &str) -> bool {
    if program.contains('/') {
        return std::path::Path::new(program).exists();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(unix)]
    async fn test_pipes_prompt_through_cat() {
        let completer = CommandCompleter::new("cat", vec![]);
        let out = completer.complete("hello completer").await.unwrap();
        assert_eq!(out, "hello completer");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_nonzero_exit_is_upstream_error() {
        let completer = CommandCompleter::new("false", vec![]);
        let err = completer.complete("x").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let completer = CommandCompleter::new("definitely-not-a-real-binary", vec![]);
        assert!(!completer.is_available());
        let err = completer.complete("x").await.unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
    }
}
