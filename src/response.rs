use std::io::{self, Read, Write};

use crate::error::{ErrorKind, Result};
use crate::request::DEFAULT_CHUNK_SIZE;

/// The raw bytes coming back from the server.
///
/// Nothing is interpreted. The status line, headers and body are all passed through as they arrive.
#[derive(Debug)]
pub struct Response<R> {
    inner: R,
    chunk_size: usize,
}

impl<R> Response<R>
where
    R: Read,
{
    /// Wrap a connection, reading it in chunks of `chunk_size` bytes.
    pub fn new(inner: R, chunk_size: usize) -> Response<R> {
        Response {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Wrap a connection with the default chunk size.
    pub fn with_default_chunk_size(inner: R) -> Response<R> {
        Response::new(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Copy the response to `writer` until the peer closes the connection.
    ///
    /// Every chunk is written and flushed as soon as it is read, so output starts before the transfer ends.
    /// Returns the number of bytes copied.
    pub fn write_to<W>(mut self, mut writer: W) -> Result<u64>
    where
        W: Write,
    {
        let mut buf = vec![0u8; self.chunk_size];
        let mut count = 0u64;

        loop {
            let n = match self.inner.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!("read failed after {} bytes: {}", count, err);
                    return Err(ErrorKind::Receive(err).into());
                }
            };

            trace!("received chunk of {} bytes", n);

            writer.write_all(&buf[..n]).map_err(ErrorKind::Output)?;
            writer.flush().map_err(ErrorKind::Output)?;
            count += n as u64;
        }

        debug!("peer closed the connection, {} bytes received", count);

        Ok(count)
    }

    /// Read the whole response into a `Vec` of bytes.
    pub fn bytes(self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Give back the underlying connection.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
