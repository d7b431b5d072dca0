#![forbid(unsafe_code)]
//! Console rewriting for newline-delimited JSON notice streams.
//!
//! An instrumented process emits one JSON object per line:
//! `{"noticeType": ..., "data": ..., "timestamp": ...}`. This crate provides:
//! - [`NoticeConsoleRewriter`], a drop-in [`std::io::Write`] sink that buffers
//!   arbitrarily chunked writes and re-emits each complete notice as
//!   `<timestamp> <noticeType> <data>` on a downstream writer.
//! - Tolerant, best-effort decoding ([`NoticeRecord::decode`]) that degrades a
//!   malformed notice to blank fields instead of failing the stream.
//! - Producer-side pumps that feed a reader (sync, or tokio behind the `tokio`
//!   feature) through a rewriter.

mod config;
mod diagnostics;
mod error;
mod forward;
mod notice;
mod rewriter;

pub use config::{ErrorDetailCapture, RewriterConfig, RewriterLimits};
pub use diagnostics::{trim_message, TrimmedError, DEFAULT_MAX_MESSAGE_BYTES};
pub use error::{DecodeErrorCode, DecodeFailure, ErrorDetailSink, ForwardError, RewriteError};
pub use forward::forward_reader;
pub use notice::{Decoded, NoticeRecord};
pub use rewriter::NoticeConsoleRewriter;

#[cfg(feature = "tokio")]
pub use forward::forward_async_reader;
