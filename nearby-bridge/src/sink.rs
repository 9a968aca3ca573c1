//! JSON-lines output toward the host: one channel envelope per line.

use nearby_core::{encode_action_line, Action, CoreConfig, WireEncodeError};
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("encode: {0}")]
    Encode(#[from] WireEncodeError),
    #[error("write: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes actions as newline-terminated JSON. Flushes after each batch.
pub struct JsonLinesSink<W> {
    writer: W,
    config: CoreConfig,
}

impl<W: AsyncWrite + Unpin> JsonLinesSink<W> {
    pub fn new(writer: W, config: CoreConfig) -> Self {
        Self { writer, config }
    }

    pub async fn send(&mut self, action: &Action) -> Result<(), SinkError> {
        let line = encode_action_line(action, &self.config)?;
        self.writer.write_all(&line).await?;
        Ok(())
    }

    /// Send a batch in order, then flush. Stops at the first error.
    pub async fn send_all(&mut self, actions: &[Action]) -> Result<(), SinkError> {
        for action in actions {
            self.send(action).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
