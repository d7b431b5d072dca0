use std::io::Write;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::CHUNK_SIZE_BYTES;
use crate::error::ForwardError;
use crate::rewriter::NoticeConsoleRewriter;

/// Async counterpart of [`crate::forward_reader`].
///
/// The rewriter itself stays synchronous: each chunk is accepted inline, so
/// the sink should be a fast local writer such as stderr.
pub async fn forward_async_reader<R, W>(
    mut reader: R,
    rewriter: &NoticeConsoleRewriter<W>,
) -> Result<u64, ForwardError>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut chunk = vec![0u8; CHUNK_SIZE_BYTES];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
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

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn duplex_stream_is_rewritten_in_order() {
        let (mut writer, reader) = tokio::io::duplex(16);
        let rewriter = NoticeConsoleRewriter::new(Vec::new());

        let produce = async move {
            for n in 0..3 {
                let line = format!(
                    "{{\"noticeType\":\"N{n}\",\"data\":{{\"n\":{n}}},\"timestamp\":\"T{n}\"}}\n"
                );
                writer.write_all(line.as_bytes()).await.unwrap();
            }
            writer.shutdown().await.unwrap();
        };
        let (_, forwarded) = tokio::join!(produce, forward_async_reader(reader, &rewriter));
        forwarded.unwrap();

        let out = String::from_utf8(rewriter.into_inner()).unwrap();
        assert_eq!(
            out,
            "T0 N0 {\"n\":0}\nT1 N1 {\"n\":1}\nT2 N2 {\"n\":2}\n"
        );
    }
}
