//! The progress side channel: an ordered, append-only stream of log lines.
//!
//! A batch writes every human-readable progress message to a [`ProgressLog`].
//! Each line is mirrored to the `log` facade and, when a receiver is
//! attached, sent over an unbounded channel so a front end can display it
//! while the batch is still running. A front end that goes away never stops
//! the batch; its lines are simply dropped.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Local};
use futures::Stream;
use log::Level;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// A single progress message.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Warn => write!(f, "Warning: {}", self.message),
            Level::Error => write!(f, "Error: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Sink for progress lines.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    sender: Option<UnboundedSender<LogLine>>,
}

impl ProgressLog {
    /// A log that only forwards to the `log` facade.
    pub fn detached() -> Self {
        Self { sender: None }
    }

    /// Creates a connected log and the stream that receives its lines.
    pub fn channel() -> (Self, LogStream) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            LogStream { receiver },
        )
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Level::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message.into());
    }

    fn emit(&self, level: Level, message: String) {
        log::log!(target: "tsuzuri", level, "{}", message);

        if let Some(sender) = &self.sender {
            // A closed receiver only means nobody is watching anymore.
            let _ = sender.send(LogLine {
                level,
                message,
                timestamp: Local::now(),
            });
        }
    }
}

/// Receiving half of a [`ProgressLog::channel`], usable as a [`Stream`].
///
/// The stream ends once every [`ProgressLog`] clone has been dropped, which
/// happens when the batch that owned them finishes.
#[derive(Debug)]
pub struct LogStream {
    receiver: UnboundedReceiver<LogLine>,
}

impl LogStream {
    /// Waits for the next line, `None` once the batch is done.
    pub async fn next_line(&mut self) -> Option<LogLine> {
        self.receiver.recv().await
    }

    /// Returns every line that is already buffered without waiting.
    pub fn drain_pending(&mut self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        while let Ok(line) = self.receiver.try_recv() {
            lines.push(line);
        }
        lines
    }
}

impl Stream for LogStream {
    type Item = LogLine;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
