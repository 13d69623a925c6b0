//! Response body types
//!
//! Every handler answers with the same boxed body so that fixed plaintext
//! replies and streamed file contents share one response type.

use std::io;
use std::path::Path;

use futures::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::logger;

/// Body type shared by all responses
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Body holding a fixed buffer
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Body with no content
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body that streams `reader` (normally an open file) in chunks of at most
/// `chunk_size` bytes. `source` only labels log lines.
///
/// The stream owns the reader, so a file handle is closed when the body
/// completes, fails, or is dropped because the connection went away. A read
/// error after the headers are sent is yielded as a body error, which makes
/// hyper abort the connection instead of finishing a truncated response
/// cleanly.
pub fn stream_body<R>(reader: R, chunk_size: usize, source: &Path) -> ResponseBody
where
    R: AsyncRead + Send + Sync + Unpin + 'static,
{
    let source = source.display().to_string();
    let stream = ReaderStream::with_capacity(reader, chunk_size.max(1))
        .inspect_err(move |e| {
            logger::log_error(&format!("Read of '{source}' failed mid-stream: {e}"));
        })
        .map_ok(Frame::data);

    StreamBody::new(stream).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::fs::File;
    use tokio::io::{AsyncReadExt, ReadBuf};

    /// Reader that always fails
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("disk went away")))
        }
    }

    /// Endless reader that records when it is dropped
    struct TrackedReader {
        released: Arc<AtomicBool>,
    }

    impl AsyncRead for TrackedReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let n = buf.remaining().min(16);
            buf.put_slice(&b"xxxxxxxxxxxxxxxx"[..n]);
            Poll::Ready(Ok(()))
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_full_body_collects() {
        let body = full_body("hello");
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let bytes = empty_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_stream_body_spans_chunks() {
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&content).unwrap();

        let file = File::open(tmp.path()).await.unwrap();
        let body = stream_body(file, 1024, tmp.path());
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], &content[..]);
    }

    #[tokio::test]
    async fn test_stream_body_zero_chunk_size_still_reads() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abc").unwrap();

        let file = File::open(tmp.path()).await.unwrap();
        let bytes = stream_body(file, 0, tmp.path())
            .collect()
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&bytes[..], b"abc");
    }

    #[tokio::test]
    async fn test_read_error_after_prefix_fails_body() {
        let reader = (&b"partial output\n"[..]).chain(BrokenReader);
        let mut body = stream_body(reader, 4096, Path::new("job.out"));

        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap(), Bytes::from_static(b"partial output\n"));

        let second = body.frame().await.unwrap();
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_read_error_fails_collect() {
        let reader = (&b"partial"[..]).chain(BrokenReader);
        let result = stream_body(reader, 4096, Path::new("job.out"))
            .collect()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dropping_body_releases_reader() {
        let released = Arc::new(AtomicBool::new(false));
        let reader = TrackedReader {
            released: Arc::clone(&released),
        };
        let mut body = stream_body(reader, 64, Path::new("endless"));

        assert!(body.frame().await.unwrap().is_ok());
        assert!(!released.load(Ordering::SeqCst));

        drop(body);
        assert!(released.load(Ordering::SeqCst));
    }
}
