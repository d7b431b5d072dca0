mod sync;

#[cfg(feature = "tokio")]
mod tokio;

pub use sync::forward_reader;

#[cfg(feature = "tokio")]
pub use self::tokio::forward_async_reader;

const CHUNK_SIZE_BYTES: usize = 8192;
