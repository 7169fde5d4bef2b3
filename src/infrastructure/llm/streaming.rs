//! Server-Sent Events parser for streaming completions.
//!
//! Turns the raw byte stream of a streaming response into the text
//! fragments carried by `data:` lines. A `data: [DONE]` line ends the
//! stream; anything after it is ignored. A body that ends before the
//! marker is reported as an error after its last fragment.

use futures::stream::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

use crate::domain::errors::{AgentError, AgentResult};

use super::types::StreamChunk;

const DONE_MARKER: &str = "[DONE]";

/// Outcome of parsing a single SSE line.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    /// A text fragment to yield
    Text(String),
    /// End-of-stream marker
    Done,
    /// Blank line, comment, non-data field, or data without text
    Skip,
}

/// Parse one SSE line (without its trailing newline).
pub fn parse_sse_line(line: &str) -> AgentResult<SseLine> {
    let line = line.trim_end_matches('\r');
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim_start();

    if data == DONE_MARKER {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| AgentError::InvalidResponse(format!("malformed stream chunk: {e}")))?;

    Ok(chunk.into_text().map_or(SseLine::Skip, SseLine::Text))
}

/// Stream adapter from response bytes to text fragments.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
pub struct SseStreamParser<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
    /// Yielded once `pending` is drained
    deferred_error: Option<AgentError>,
}

impl<S> SseStreamParser<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
            deferred_error: None,
        }
    }

    /// Parse every complete line in the buffer.
    ///
    /// Stops at `[DONE]`; the first malformed line is returned as an error.
    fn drain_lines(&mut self) -> AgentResult<()> {
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if self.process_line(&line[..newline])? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Returns true once the end marker has been seen.
    fn process_line(&mut self, raw: &[u8]) -> AgentResult<bool> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| AgentError::InvalidResponse(format!("invalid UTF-8 in stream: {e}")))?;

        match parse_sse_line(line)? {
            SseLine::Text(text) => self.pending.push_back(text),
            SseLine::Done => {
                debug!("Stream completed");
                self.finished = true;
                self.buffer.clear();
                return Ok(true);
            }
            SseLine::Skip => {}
        }
        Ok(false)
    }

    fn fail(&mut self, err: AgentError) -> Poll<Option<AgentResult<String>>> {
        self.finished = true;
        self.pending.clear();
        self.buffer.clear();
        Poll::Ready(Some(Err(err)))
    }
}

impl<S, B, E> Stream for SseStreamParser<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<AgentError>,
{
    type Item = AgentResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(text) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(text)));
            }
            if this.finished {
                return Poll::Ready(this.deferred_error.take().map(Err));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(bytes.as_ref());
                    if let Err(e) = this.drain_lines() {
                        return this.fail(e);
                    }
                }
                Poll::Ready(Some(Err(e))) => return this.fail(e.into()),
                Poll::Ready(None) => {
                    // A final line without a trailing newline still counts.
                    if !this.buffer.is_empty() {
                        let rest = std::mem::take(&mut this.buffer);
                        if let Err(e) = this.process_line(&rest) {
                            return this.fail(e);
                        }
                    }
                    if !this.finished {
                        warn!("Stream ended without a [DONE] marker");
                        this.finished = true;
                        this.deferred_error =
                            Some(AgentError::Network("stream ended before [DONE]".to_string()));
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
