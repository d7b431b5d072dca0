use std::io;

use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecodeErrorCode {
    /// The line is not valid JSON (including trailing bytes).
    JsonParse,
    /// The line held invalid UTF-8; it was decoded after lossy repair.
    InvalidUtf8,
    /// The line is valid JSON but not an object.
    NotAnObject,
    /// A known member had the wrong JSON type and was left empty.
    FieldType,
}

/// A malformed notice that was recovered locally.
///
/// These never surface through [`crate::NoticeConsoleRewriter::accept`]; they
/// are logged and optionally handed to an [`ErrorDetailSink`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecodeFailure {
    /// 1-based line number within the rewriter's stream.
    pub line_number: usize,
    pub code: DecodeErrorCode,
    pub summary: String,
    pub details: String,
}

pub trait ErrorDetailSink: Send + 'static {
    fn on_error(&mut self, failure: DecodeFailure);
}

impl<F> ErrorDetailSink for F
where
    F: FnMut(DecodeFailure) + Send + 'static,
{
    fn on_error(&mut self, failure: DecodeFailure) {
        self(failure)
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed writing rewritten notice line {line_number} to sink: {source}")]
    SinkWrite {
        line_number: usize,
        #[source]
        source: io::Error,
    },
}

impl From<RewriteError> for io::Error {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::SinkWrite { source, .. } => source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed reading notice stream: {0}")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}
