//! SafeCommandExecutor: allow-listed external command execution
//!
//! # Security Features
//!
//! - **Allow-list validation**: only pre-approved programs can execute
//! - **Injection prevention**: arguments are passed as a vector to
//!   `tokio::process::Command`, never interpolated into a shell string
//! - **Working directory validation**: checked before every execution
//! - **Timeout control**: a hanging process is killed once the timeout elapses
//!
//! # Example
//!
//! ```rust,no_run
//! use plugin_publisher::security::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), plugin_publisher::security::CommandError> {
//! let mut executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! executor.set_timeout(Duration::from_secs(30));
//!
//! let output = executor.execute("npm", &["--version"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Programs SafeCommandExecutor may run
const ALLOWED_COMMANDS: &[&str] = &["npm"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allow-list
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Safe command executor with security controls
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    /// Default working directory
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create an executor whose default working directory is `working_dir`
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
        })
    }

    /// Set command execution timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Configured timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute a command in the default working directory
    pub async fn execute(&self, command: &str, args: &[&str]) -> Result<Output, CommandError> {
        self.execute_in(&self.working_dir, command, args).await
    }

    /// Execute a command in `dir`
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// `Output::status`.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - command not in the allow-list
    /// - `CommandError::InvalidWorkingDirectory` - `dir` does not exist
    /// - `CommandError::ExecutionFailed` - binary not found or execution error
    /// - `CommandError::Timeout` - the process outlived the timeout and was killed
    pub async fn execute_in(
        &self,
        dir: &Path,
        command: &str,
        args: &[&str],
    ) -> Result<Output, CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }
        if !dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(dir.to_path_buf()));
        }

        // npm is a .cmd shim on Windows
        #[cfg(target_os = "windows")]
        let command_name = format!("{}.cmd", command);

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        tracing::debug!(
            command = %command,
            args = ?args,
            dir = %dir.display(),
            "executing command"
        );

        let child = Command::new(&command_name)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| CommandError::Timeout(limit))?,
            None => child.wait_with_output().await,
        };

        output.map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();

        let result = executor.execute("rm", &["-rf", "/"]).await;

        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_rejected_command_with_allowed_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();

        let result = executor.execute("npm; rm -rf /", &[]).await;

        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_missing_per_call_directory() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();

        let result = executor
            .execute_in(&temp_dir.path().join("gone"), "npm", &["--version"])
            .await;

        assert!(matches!(result, Err(CommandError::InvalidWorkingDirectory(_))));
    }

    #[test]
    fn test_timeout_setting() {
        let temp_dir = TempDir::new().unwrap();
        let mut executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        assert_eq!(executor.timeout(), None);

        executor.set_timeout(Duration::from_secs(30));

        assert_eq!(executor.timeout(), Some(Duration::from_secs(30)));
    }
}
