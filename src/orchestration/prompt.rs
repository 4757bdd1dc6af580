//! Operator prompts: interactive terminal and non-interactive (CI) variants

use crate::core::traits::{OperatorPrompt, PromptAnswer};
use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Prompts on stdout and reads answers from stdin
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl StdinPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Print `message` and read one line; `None` on EOF
    async fn read_answer(&self, message: &str) -> anyhow::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(message.as_bytes()).await?;
        stdout.flush().await?;

        let mut reader = BufReader::new(io::stdin());
        let mut answer = String::new();
        let read = reader.read_line(&mut answer).await?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim().to_string()))
    }
}

#[async_trait]
impl OperatorPrompt for StdinPrompt {
    async fn ask_version(&self) -> anyhow::Result<PromptAnswer> {
        Ok(match self.read_answer("Enter version to publish (e.g., 2.0.1): ").await? {
            Some(answer) => PromptAnswer::Answer(answer),
            None => PromptAnswer::Cancelled,
        })
    }

    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        let answer = self.read_answer(&format!("{} (y/N): ", message)).await?;
        Ok(matches!(
            answer.map(|a| a.to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }
}

/// Prompt for automated contexts
///
/// Never supplies a version, so a run without an explicit or derivable
/// version fails with `VersionRequired`. Confirmations get a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct NonInteractivePrompt {
    confirm: bool,
}

impl NonInteractivePrompt {
    /// Create a prompt answering every confirmation with `confirm`
    pub fn new(confirm: bool) -> Self {
        Self { confirm }
    }
}

#[async_trait]
impl OperatorPrompt for NonInteractivePrompt {
    async fn ask_version(&self) -> anyhow::Result<PromptAnswer> {
        tracing::debug!("non-interactive mode, no version can be prompted for");
        Ok(PromptAnswer::Answer(String::new()))
    }

    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        tracing::debug!(question = %message, answer = self.confirm, "auto-answering confirmation");
        Ok(self.confirm)
    }
}
