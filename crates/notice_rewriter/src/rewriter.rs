use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::config::{ErrorDetailCapture, RewriterConfig};
use crate::diagnostics::{trim_message, TrimmedError};
use crate::error::{DecodeFailure, RewriteError};
use crate::notice::NoticeRecord;

/// Rewrites a JSON notice stream into `<timestamp> <noticeType> <data>` lines.
///
/// Bytes may arrive in chunks of any size and from any number of threads.
/// Every complete line is decoded, formatted and written to the sink before
/// [`accept`](Self::accept) returns. A trailing partial line is buffered until
/// its newline arrives, and is discarded if the rewriter is dropped first.
///
/// The whole append, extract and sink-write cycle of one call runs under a
/// single lock, so lines reach the sink in the order their bytes were
/// accepted and concurrent callers never interleave within a line.
pub struct NoticeConsoleRewriter<W: Write> {
    state: Mutex<RewriterState<W>>,
}

struct RewriterState<W> {
    sink: W,
    config: RewriterConfig,
    buffer: Vec<u8>,
    /// Start of the bytes not yet handed to the sink. Advanced past each line
    /// before it is written, so a sink that panics never sees it twice.
    head: usize,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    line_number: usize,
    formatted: Vec<u8>,
}

impl<W: Write> NoticeConsoleRewriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_config(sink, RewriterConfig::default())
    }

    pub fn with_config(sink: W, config: RewriterConfig) -> Self {
        Self {
            state: Mutex::new(RewriterState {
                sink,
                config,
                buffer: Vec::new(),
                head: 0,
                scanned: 0,
                line_number: 0,
                formatted: Vec::new(),
            }),
        }
    }

    /// Appends `chunk` and flushes every complete notice line to the sink.
    ///
    /// Returns `chunk.len()`: input is always taken whole. The only error is a
    /// failed sink write. The line being written is lost in that case, and any
    /// further complete lines stay buffered until the next call.
    pub fn accept(&self, chunk: &[u8]) -> Result<usize, RewriteError> {
        let mut state = self.lock();
        state.buffer.extend_from_slice(chunk);
        let (lines, drained) = state.drain_complete_lines();
        trace!(
            chunk_len = chunk.len(),
            lines,
            pending = state.pending_len(),
            "accepted notice chunk"
        );
        drained.map(|()| chunk.len())
    }

    /// Bytes of the buffered, not yet newline-terminated record.
    pub fn pending_len(&self) -> usize {
        self.lock().pending_len()
    }

    /// Number of lines extracted so far, including blank and malformed ones.
    pub fn lines_processed(&self) -> usize {
        self.lock().line_number
    }

    /// Releases the sink. Any unterminated tail is dropped without output.
    pub fn into_inner(self) -> W {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        if state.pending_len() > 0 {
            debug!(
                discarded = state.pending_len(),
                "dropping unterminated notice tail"
            );
        }
        state.sink
    }

    // A panic inside a sink write must not take console output down with it.
    fn lock(&self) -> MutexGuard<'_, RewriterState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> RewriterState<W> {
    fn pending_len(&self) -> usize {
        self.buffer.len() - self.head
    }

    /// Drops the bytes before `head`, including any left by a panicked call.
    fn compact(&mut self) {
        if self.head == 0 {
            return;
        }
        self.buffer.drain(..self.head);
        self.scanned = self.scanned.saturating_sub(self.head);
        self.head = 0;
    }

    /// Returns the number of lines extracted, and the first sink failure.
    fn drain_complete_lines(&mut self) -> (usize, Result<(), RewriteError>) {
        let mut lines = 0;
        let result = loop {
            let search_from = self.head.max(self.scanned);
            let Some(offset) = self.buffer[search_from..]
                .iter()
                .position(|b| *b == b'\n')
            else {
                self.scanned = self.buffer.len();
                break Ok(());
            };
            let newline_idx = search_from + offset;
            let line_start = self.head;
            self.head = newline_idx + 1;
            self.line_number += 1;
            lines += 1;

            if let Err(err) = self.emit_line(line_start, newline_idx) {
                break Err(err);
            }
        };

        self.compact();
        (lines, result)
    }

    fn emit_line(&mut self, start: usize, end: usize) -> Result<(), RewriteError> {
        let line_number = self.line_number;
        let line = &self.buffer[start..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if self.config.skip_blank_lines && line.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let decoded = NoticeRecord::decode(line);
        if let Some((code, message)) = decoded.issue.as_ref() {
            let max = self.config.limits.max_diagnostic_bytes;
            let summary = trim_message(message, max).into_owned();
            debug!(line_number, ?code, %summary, "notice did not decode cleanly");
            if let Some(sink) = self.config.error_sink.as_mut() {
                let details = match self.config.error_detail_capture {
                    ErrorDetailCapture::FullDetails => message.clone(),
                    ErrorDetailCapture::RedactedSummaryOnly => summary.clone(),
                };
                sink.on_error(DecodeFailure {
                    line_number,
                    code: *code,
                    summary,
                    details,
                });
            }
        }

        self.formatted.clear();
        decoded.record.write_line(&mut self.formatted);
        let max = self.config.limits.max_diagnostic_bytes;
        self.sink.write_all(&self.formatted).map_err(|source| {
            warn!(
                line_number,
                error = %TrimmedError::with_limit(&source, max),
                "failed writing notice line to sink"
            );
            RewriteError::SinkWrite {
                line_number,
                source,
            }
        })
    }
}

impl<W: Write> Write for &NoticeConsoleRewriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.accept(buf)?)
    }

    /// Flushes the sink. A partial record is never flushed.
    fn flush(&mut self) -> io::Result<()> {
        self.lock().sink.flush()
    }
}

impl<W: Write> Write for NoticeConsoleRewriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl<W: Write> std::fmt::Debug for NoticeConsoleRewriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("NoticeConsoleRewriter")
            .field("pending", &state.pending_len())
            .field("line_number", &state.line_number)
            .field("config", &state.config)
            .finish()
    }
}
