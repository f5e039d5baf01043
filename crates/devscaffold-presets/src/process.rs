//! Package-manager command execution with streamed output

use std::process::Stdio;

use async_trait::async_trait;
use devscaffold_fs::NormalizedPath;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{Error, Result};

/// A command as an ordered list of tokens: program first, then arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "Vec<String>")]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl From<CommandLine> for Vec<String> {
    fn from(command: CommandLine) -> Self {
        command.tokens()
    }
}

impl std::fmt::Display for CommandLine {
    /// Renders the command the way a user would type it into a shell.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./#_-".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("\"{}\"", token.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Which stream an output line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of subprocess output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

/// Runs commands and streams their interleaved output line by line.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` to completion and return its exit code.
    ///
    /// A process killed by a signal reports `-1`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the command cannot be started or its
    /// output cannot be read. A non-zero exit is not an error.
    async fn run(
        &self,
        command: &CommandLine,
        sink: &mut (dyn FnMut(OutputLine) + Send),
    ) -> Result<i32>;
}

/// Runs commands as real subprocesses in a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    working_dir: NormalizedPath,
}

impl SystemRunner {
    pub fn new(working_dir: NormalizedPath) -> Self {
        Self { working_dir }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        command: &CommandLine,
        sink: &mut (dyn FnMut(OutputLine) + Send),
    ) -> Result<i32> {
        let rendered = command.to_string();
        let io_error = |source: std::io::Error| Error::CommandIo {
            command: rendered.clone(),
            source,
        };

        tracing::debug!(command = %rendered, cwd = %self.working_dir, "Spawning");
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(self.working_dir.to_native())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::CommandNotFound {
                    command: rendered.clone(),
                },
                _ => io_error(e),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(io_error(std::io::Error::other("output pipes unavailable")));
        };
        let mut stdout = BufReader::new(stdout).lines();
        let mut stderr = BufReader::new(stderr).lines();
        let (mut stdout_open, mut stderr_open) = (true, true);

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout.next_line(), if stdout_open => match line.map_err(io_error)? {
                    Some(text) => sink(OutputLine { stream: OutputStream::Stdout, text }),
                    None => stdout_open = false,
                },
                line = stderr.next_line(), if stderr_open => match line.map_err(io_error)? {
                    Some(text) => sink(OutputLine { stream: OutputStream::Stderr, text }),
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await.map_err(io_error)?;
        let code = status.code().unwrap_or(-1);
        if code != 0 {
            tracing::warn!(command = %rendered, code, "Command exited with non-zero status");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_quotes_only_when_needed() {
        let command = CommandLine::new("ddev")
            .arg("config")
            .arg("--web-environment=\"NIGHTWATCH_DRUPAL_URL=http://web\"");
        assert_eq!(
            command.to_string(),
            r#"ddev config "--web-environment=\"NIGHTWATCH_DRUPAL_URL=http://web\"""#
        );

        let command = CommandLine::new("yarn").args([
            "add",
            "--dev",
            "@lullabot/nightwatch-drupal-commands@https://github.com/Lullabot/nightwatch-drupal-commands.git#main",
        ]);
        assert_eq!(
            command.to_string(),
            "yarn add --dev @lullabot/nightwatch-drupal-commands@https://github.com/Lullabot/nightwatch-drupal-commands.git#main"
        );
    }

    #[test]
    fn test_tokens_put_program_first() {
        let command = CommandLine::new("npm").args(["install", "--save-dev", "nightwatch"]);
        assert_eq!(command.tokens(), vec!["npm", "install", "--save-dev", "nightwatch"]);
    }

    #[test]
    fn test_serializes_as_token_list() {
        let command = CommandLine::new("ddev").arg("restart");
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            serde_json::json!(["ddev", "restart"])
        );
    }
}
