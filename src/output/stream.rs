//! Async driver that feeds a reader through an [`OutputDecoder`].

use std::borrow::Cow;
use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{OutputDecoder, OutputEvent, ParseSummary};

/// Default channel buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Error type for stream operations.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Failed to read tool output: {0}")]
    Io(#[from] std::io::Error),
}

/// Lazily decodes a tool's stdout into ordered events.
///
/// Events come out in the order their lines were read. The parser is bound
/// to one stream; once it returns `None` it stays exhausted.
pub struct OutputParser<R> {
    lines: Split<BufReader<R>>,
    decoder: OutputDecoder,
    pending: VecDeque<OutputEvent>,
    eof: bool,
}

impl<R> OutputParser<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    #[must_use]
    pub fn new(reader: R, decoder: OutputDecoder) -> Self {
        Self {
            lines: BufReader::new(reader).split(b'\n'),
            decoder,
            pending: VecDeque::new(),
            eof: false,
        }
    }

    /// Next event, reading more lines as needed. `Ok(None)` means the
    /// stream has ended and every event has been delivered.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if reading fails. The stream is treated
    /// as ended afterwards.
    pub async fn next_event(&mut self) -> Result<Option<OutputEvent>, StreamError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.eof {
                return Ok(None);
            }
            match self.lines.next_segment().await {
                Ok(Some(raw)) => {
                    let line = decode_line(&raw);
                    self.pending.extend(self.decoder.feed_line(&line));
                }
                Ok(None) => self.end(),
                Err(e) => {
                    self.end();
                    return Err(e.into());
                }
            }
        }
    }

    fn end(&mut self) {
        self.eof = true;
        self.pending.extend(self.decoder.end_of_stream());
    }

    /// Stop reading and build the aggregate.
    ///
    /// Anything not yet read is ignored; an open message becomes truncated
    /// output, exactly as at a natural end.
    #[must_use]
    pub fn finish(self) -> ParseSummary {
        self.decoder.finish()
    }

    /// Drain the stream, passing each event to `on_event`, and return the
    /// aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if reading fails.
    pub async fn read_all_with<F>(mut self, mut on_event: F) -> Result<ParseSummary, StreamError>
    where
        F: FnMut(OutputEvent),
    {
        while let Some(event) = self.next_event().await? {
            on_event(event);
        }
        Ok(self.finish())
    }

    /// Drain the stream and return the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if reading fails.
    pub async fn read_all(self) -> Result<ParseSummary, StreamError> {
        self.read_all_with(|_| {}).await
    }

    /// Events as a stream. Ends after the last event or the first error.
    ///
    /// The aggregate is not available this way; use
    /// [`OutputParser::read_all_with`] when it is needed.
    pub fn into_stream(self) -> impl futures_core::Stream<Item = Result<OutputEvent, StreamError>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut parser = state?;
            match parser.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(parser))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Decode in a background task, sending events over a channel.
    ///
    /// The task resolves to the aggregate once the stream ends. A dropped
    /// receiver does not stop decoding.
    pub fn into_channel(
        self,
        buffer: usize,
    ) -> (Receiver<OutputEvent>, JoinHandle<Result<ParseSummary, StreamError>>) {
        self.into_channel_with_cancel(buffer, CancellationToken::new())
    }

    /// Like [`OutputParser::into_channel`], but stops reading when `cancel`
    /// fires. A cancelled parse ends like a stream that closed early.
    pub fn into_channel_with_cancel(
        mut self,
        buffer: usize,
        cancel: CancellationToken,
    ) -> (Receiver<OutputEvent>, JoinHandle<Result<ParseSummary, StreamError>>) {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        tracing::debug!(kind = %self.decoder.kind(), "Output parsing cancelled");
                        break;
                    }
                    next = self.next_event() => next?,
                };
                let Some(event) = next else {
                    break;
                };
                if tx.send(event).await.is_err() {
                    tracing::trace!("Event receiver dropped");
                }
            }
            // Deliver what an early end releases before closing the channel.
            self.end();
            while let Some(event) = self.pending.pop_front() {
                let _ = tx.send(event).await;
            }
            Ok(self.finish())
        });
        (rx, handle)
    }
}

/// The JVM writes in the platform charset, so bytes that are not UTF-8 are
/// replaced instead of failing the read.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
