use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use super::CHUNK_SIZE_BYTES;
use crate::error::ForwardError;
use crate::rewriter::NoticeConsoleRewriter;

/// Feeds `reader` through `rewriter` until end of stream.
///
/// Returns the number of bytes read. Chunks are handed over as read, so a
/// notice is printed as soon as its newline is read rather than at the end.
pub fn forward_reader<R, W>(
    mut reader: R,
    rewriter: &NoticeConsoleRewriter<W>,
) -> Result<u64, ForwardError>
where
    R: Read,
    W: Write,
{
    let mut chunk = [0u8; CHUNK_SIZE_BYTES];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ForwardError::Read(err)),
        };
        rewriter.accept(&chunk[..n])?;
        total += n as u64;
    }
    debug!(
        bytes = total,
        pending = rewriter.pending_len(),
        "notice stream reached end of input"
    );
    Ok(total)
}
