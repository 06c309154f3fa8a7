/// Confirmation gate before destructive cleanup

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Delete the container
    Proceed,
    /// Leave the container in place
    Keep,
}

#[async_trait]
pub trait Confirmation: Send {
    async fn confirm(&mut self, prompt: &str) -> Result<Gate>;
}

/// Waits for one line on its reader (standard input by default).
/// End of input keeps the container.
#[derive(Debug)]
pub struct StdinConfirmation<R = BufReader<Stdin>> {
    reader: R,
}

impl StdinConfirmation<BufReader<Stdin>> {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinConfirmation<BufReader<Stdin>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinConfirmation<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> Confirmation for StdinConfirmation<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&mut self, prompt: &str) -> Result<Gate> {
        println!("{}", prompt);

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            warn!("Standard input closed before confirmation, keeping the container");
            return Ok(Gate::Keep);
        }
        Ok(Gate::Proceed)
    }
}

/// Answers every prompt with `Proceed`
#[derive(Debug, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&mut self, _prompt: &str) -> Result<Gate> {
        Ok(Gate::Proceed)
    }
}

/// Replays queued answers, then `Keep`. Records the prompts it was shown.
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: VecDeque<Gate>,
    prompts: Vec<String>,
}

impl ScriptedConfirmation {
    pub fn new(answers: impl IntoIterator<Item = Gate>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[async_trait]
impl Confirmation for ScriptedConfirmation {
    async fn confirm(&mut self, prompt: &str) -> Result<Gate> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or(Gate::Keep))
    }
}
