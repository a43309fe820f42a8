//! Line transport adapter.
//!
//! Reads and writes carriage-return-terminated lines over an already-open
//! duplex byte stream.  The adapter does not open sockets or resolve
//! addresses; the caller supplies the connected stream and the session
//! owns the deadline around each read.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::codec::TERMINATOR;

/// Upper bound on one line.  The protocol caps parameters at 128 bytes, so
/// a line past this length means the peer is not speaking PJLink.
pub const MAX_LINE_LEN: usize = 512;

/// CR-delimited line reader/writer over a duplex byte stream.
pub struct LineTransport<T> {
    inner: BufReader<T>,
}

impl<T: AsyncRead + AsyncWrite + Unpin> LineTransport<T> {
    pub fn new(stream: T) -> Self {
        Self {
            inner: BufReader::new(stream),
        }
    }

    /// Reads one line, stripping the terminator.
    ///
    /// Returns `Ok(None)` on a clean end-of-stream before any byte of a new
    /// line.  A stream that ends mid-line, a line that exceeds
    /// [`MAX_LINE_LEN`] without a terminator, or non-UTF-8 bytes all
    /// surface as errors.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line: Vec<u8> = Vec::with_capacity(32);
        loop {
            let (done, used) = {
                let chunk = self.inner.fill_buf().await?;
                if chunk.is_empty() {
                    if line.is_empty() {
                        return Ok(None);
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed before the line terminator",
                    ));
                }
                match chunk.iter().position(|&b| b == TERMINATOR) {
                    Some(pos) => {
                        line.extend_from_slice(&chunk[..pos]);
                        (true, pos + 1)
                    }
                    None => {
                        line.extend_from_slice(chunk);
                        (false, chunk.len())
                    }
                }
            };
            self.inner.consume(used);
            if done {
                break;
            }
            if line.len() > MAX_LINE_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "line exceeds the maximum length without a terminator",
                ));
            }
        }

        String::from_utf8(line)
            .map(Some)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "line is not valid UTF-8"))
    }

    /// Writes one pre-rendered line (terminator included) and flushes.
    pub async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
