//! External command execution
//!
//! Parsers never see a process: resolvers hand an `Invocation` to a
//! `CommandRunner` and get text back. A runner never fails; anything that
//! goes wrong is logged and surfaces as empty output, which every parser
//! reads as "no facts from this source".

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Argument vector plus capture options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    /// Capture stderr too (appended after stdout)
    pub merge_stderr: bool,
}

impl Invocation {
    pub fn new(argv: &[&str]) -> Self {
        Self {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            merge_stderr: false,
        }
    }

    pub fn merge_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    /// Prefix the command with a privilege-escalation wrapper (`sudo`)
    pub fn elevated(mut self, prefix: &[String]) -> Self {
        if !prefix.is_empty() {
            let mut argv = prefix.to_vec();
            argv.append(&mut self.argv);
            self.argv = argv;
        }
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match shlex::try_join(self.argv.iter().map(String::as_str)) {
            Ok(joined) => f.write_str(&joined),
            Err(_) => write!(f, "{:?}", self.argv),
        }
    }
}

/// "Run command, capture stdout" capability
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `cmd`, feeding `stdin` to it if given; empty text on any failure
    async fn run(&self, cmd: &Invocation, stdin: Option<&str>) -> String;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    async fn run(&self, cmd: &Invocation, stdin: Option<&str>) -> String {
        (**self).run(cmd, stdin).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Empty command line")]
    Empty,

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("IO error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs commands on the local host with a bounded timeout each
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `cmd` and return its output, reporting what went wrong
    ///
    /// A non-zero exit status is not an error: `service --status-all` exits
    /// non-zero whenever one init script does, and its output is still good.
    pub async fn capture(&self, cmd: &Invocation, stdin: Option<&str>) -> Result<String, RunError> {
        let (program, args) = cmd.argv.split_first().ok_or(RunError::Empty)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(if cmd.merge_stderr { Stdio::piped() } else { Stdio::null() })
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

        // Feed stdin from a separate task so a chatty child cannot deadlock
        // against a full stdout pipe
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            let input = input.to_owned();
            let name = cmd.to_string();
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    log::debug!("Writing stdin to `{}` failed: {}", name, e);
                }
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunError::Timeout {
                command: cmd.to_string(),
                after: self.timeout,
            })?
            .map_err(|source| RunError::Io {
                command: cmd.to_string(),
                source,
            })?;

        if !output.status.success() {
            log::debug!("`{}` exited with {}", cmd, output.status);
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if cmd.merge_stderr {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        Ok(text)
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &Invocation, stdin: Option<&str>) -> String {
        match self.capture(cmd, stdin).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}", e);
                String::new()
            }
        }
    }
}
