//! Delivering the model's reply to the operator.
//!
//! [`ResponseConsumer`] handles the two axes of output: buffered vs. streamed replies
//! (the [`ChatReply`] variant) and stdout vs. file destinations ([`Destination`]).
//! Response text goes to the `out` writer; token usage reports and write failures go
//! to the `err` writer, so they never interleave with streamed text.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::contract::{ChatError, ChatReply, ChatResponse, ChatStream, TokenUsage};
use crate::files::write_contents;

/// Where the response text ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

/// What the consumer did with a reply.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Printed,
    Streamed { parts: usize },
    Written { path: PathBuf },
    WriteFailed { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("could not write response output: {0}")]
    Output(#[from] io::Error),
}

/// Operator-facing token usage summary.
pub struct TokenUsageReport(pub TokenUsage);

impl fmt::Display for TokenUsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOKEN USAGE:")?;
        writeln!(f, "------------")?;
        writeln!(f, "Completion Tokens: {}", self.0.completion_tokens)?;
        writeln!(f, "Prompt Tokens: {}", self.0.prompt_tokens)?;
        write!(f, "Total Tokens: {}", self.0.total_tokens())
    }
}

pub struct ResponseConsumer<O, E> {
    out: O,
    err: E,
    destination: Destination,
    token_usage: bool,
}

impl<O: Write, E: Write> ResponseConsumer<O, E> {
    pub fn new(out: O, err: E, destination: Destination, token_usage: bool) -> Self {
        Self {
            out,
            err,
            destination,
            token_usage,
        }
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    pub async fn consume(&mut self, reply: ChatReply) -> Result<Delivery, ResponseError> {
        match (reply, self.destination.clone()) {
            (ChatReply::Complete(response), Destination::Stdout) => {
                writeln!(self.out, "{}", response.content)?;
                self.out.flush()?;
                self.report_usage(response.usage)?;
                Ok(Delivery::Printed)
            }
            (ChatReply::Complete(response), Destination::File(path)) => {
                self.write_file(response, path).await
            }
            (ChatReply::Streamed(parts), Destination::Stdout) => {
                self.stream_to_out(parts).await
            }
            (ChatReply::Streamed(parts), Destination::File(path)) => {
                debug!(path = %path.display(), "Collecting streamed reply before writing to file");
                let response = collect_stream(parts).await?;
                self.write_file(response, path).await
            }
        }
    }

    async fn stream_to_out(
        &mut self,
        mut parts: ChatStream,
    ) -> Result<Delivery, ResponseError> {
        let mut written = 0;
        while let Some(part) = parts.next().await {
            let part = match part {
                Ok(part) => part,
                Err(ChatError::Decode(reason)) => {
                    warn!(reason = %reason, "Skipping malformed response part");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            write!(self.out, "{}", part.content)?;
            self.out.flush()?;
            written += 1;

            if part.done {
                match part.usage {
                    Some(usage) => self.report_usage(usage)?,
                    None => debug!("Final response part carried no token counts"),
                }
            }
        }
        info!(parts = written, "Streamed response to stdout");
        Ok(Delivery::Streamed { parts: written })
    }

    async fn write_file(
        &mut self,
        response: ChatResponse,
        path: PathBuf,
    ) -> Result<Delivery, ResponseError> {
        let delivery = match write_contents(&path, &response.content).await {
            Ok(()) => {
                writeln!(
                    self.out,
                    "File created and content written to {}",
                    path.display()
                )?;
                Delivery::Written { path }
            }
            Err(e) => {
                let reason = e.to_string();
                writeln!(self.err, "File could not be created: {}", path.display())?;
                writeln!(self.err, "{reason}")?;
                Delivery::WriteFailed { path, reason }
            }
        };
        self.report_usage(response.usage)?;
        Ok(delivery)
    }

    fn report_usage(&mut self, usage: TokenUsage) -> io::Result<()> {
        if !self.token_usage {
            return Ok(());
        }
        writeln!(self.err)?;
        writeln!(self.err, "{}", TokenUsageReport(usage))?;
        self.err.flush()
    }
}

/// Drains a streamed reply into one response, taking counts from the terminal part.
async fn collect_stream(
    mut parts: ChatStream,
) -> Result<ChatResponse, ResponseError> {
    let mut content = String::new();
    let mut usage = TokenUsage::default();
    while let Some(part) = parts.next().await {
        match part {
            Ok(part) => {
                content.push_str(&part.content);
                if part.done {
                    usage = part.usage.unwrap_or_default();
                }
            }
            Err(ChatError::Decode(reason)) => {
                warn!(reason = %reason, "Skipping malformed response part");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ChatResponse { content, usage })
}
