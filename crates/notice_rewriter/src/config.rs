use crate::diagnostics::DEFAULT_MAX_MESSAGE_BYTES;
use crate::error::ErrorDetailSink;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ErrorDetailCapture {
    /// Error sinks receive the trimmed summary in place of the full decoder message.
    #[default]
    RedactedSummaryOnly,
    FullDetails,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RewriterLimits {
    /// Upper bound on decode-failure text placed into logs and summaries.
    ///
    /// Record length itself is never limited: an unterminated record keeps
    /// growing the buffer until its newline arrives.
    pub max_diagnostic_bytes: usize,
}

impl Default for RewriterLimits {
    fn default() -> Self {
        Self {
            max_diagnostic_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

pub struct RewriterConfig {
    pub limits: RewriterLimits,
    pub error_detail_capture: ErrorDetailCapture,
    pub error_sink: Option<Box<dyn ErrorDetailSink>>,
    /// Drop whitespace-only lines instead of emitting a blank-field line.
    pub skip_blank_lines: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            limits: RewriterLimits::default(),
            error_detail_capture: ErrorDetailCapture::RedactedSummaryOnly,
            error_sink: None,
            skip_blank_lines: false,
        }
    }
}

impl std::fmt::Debug for RewriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriterConfig")
            .field("limits", &self.limits)
            .field("error_detail_capture", &self.error_detail_capture)
            .field("error_sink", &self.error_sink.is_some())
            .field("skip_blank_lines", &self.skip_blank_lines)
            .finish()
    }
}
