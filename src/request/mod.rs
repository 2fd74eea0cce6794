use std::io::prelude::*;

use http::{Method, Version};

use crate::error::{ErrorKind, Result};
use crate::parsing::ParsedUrl;

mod settings;

pub use self::settings::{Settings, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_REQUEST_SIZE};

/// A `GET` request head that has been formatted and checked against the size limit.
#[derive(Debug)]
pub struct PreparedRequest {
    head: Vec<u8>,
}

impl PreparedRequest {
    /// Format the request for `url`.
    ///
    /// Fails with `ErrorKind::RequestTooLarge` when the head is longer than the configured maximum.
    pub fn new(url: &ParsedUrl, settings: &Settings) -> Result<PreparedRequest> {
        let method = Method::GET;
        let version = Version::HTTP_11;
        let target = url.request_target();

        debug!("{} {} {:?}", method.as_str(), target, version);

        let head = format!(
            "{} {} {:?}\r\nHost: {}\r\nConnection: close\r\n\r\n",
            method.as_str(),
            target,
            version,
            url.authority(),
        )
        .into_bytes();

        if head.len() > settings.max_request_size {
            return Err(ErrorKind::RequestTooLarge {
                size: head.len(),
                max: settings.max_request_size,
            }
            .into());
        }

        Ok(PreparedRequest { head })
    }

    /// Get the bytes that will be sent.
    pub fn as_bytes(&self) -> &[u8] {
        &self.head
    }

    /// Write the whole request to `writer`.
    ///
    /// Short writes are continued until every byte is out. A write that accepts nothing, or fails, is a
    /// `ErrorKind::Send` error.
    pub fn send<W>(&self, mut writer: W) -> Result<usize>
    where
        W: Write,
    {
        debug!("sending request of {} bytes", self.head.len());

        writer.write_all(&self.head).map_err(ErrorKind::Send)?;
        writer.flush().map_err(ErrorKind::Send)?;

        Ok(self.head.len())
    }
}

/// Format the request for `url` and send it over `writer`.
///
/// Nothing is written when the request is too large.
pub fn send_request<W>(writer: W, url: &ParsedUrl, settings: &Settings) -> Result<usize>
where
    W: Write,
{
    PreparedRequest::new(url, settings)?.send(writer)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::*;

    /// Accepts at most `limit` bytes per call.
    struct Trickle {
        written: Vec<u8>,
        limit: usize,
        calls: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn url(raw: &str) -> ParsedUrl {
        ParsedUrl::parse(raw).unwrap()
    }

    #[test]
    fn test_format() {
        let req = PreparedRequest::new(&url("example.com:80/index.html"), &Settings::default()).unwrap();
        assert_eq!(
            req.as_bytes(),
            &b"GET /index.html HTTP/1.1\r\nHost: example.com:80\r\nConnection: close\r\n\r\n"[..]
        );
    }

    #[test]
    fn test_format_empty_path() {
        let req = PreparedRequest::new(&url("localhost:3490/"), &Settings::default()).unwrap();
        assert_eq!(
            req.as_bytes(),
            &b"GET / HTTP/1.1\r\nHost: localhost:3490\r\nConnection: close\r\n\r\n"[..]
        );
    }

    #[test]
    fn test_request_too_large_sends_nothing() {
        let path = "a".repeat(DEFAULT_MAX_REQUEST_SIZE);
        let url = url(&format!("example.com:80/{}", path));
        let mut sink = Vec::new();

        let err = send_request(&mut sink, &url, &Settings::default()).unwrap_err();
        match err.kind() {
            ErrorKind::RequestTooLarge { size, max } => {
                assert!(size > max);
                assert_eq!(*max, DEFAULT_MAX_REQUEST_SIZE);
            }
            err => panic!("Unexpected error: {:?}", err),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_request_at_limit_is_sent() {
        let url = url("example.com:80/x");
        let len = PreparedRequest::new(&url, &Settings::default()).unwrap().as_bytes().len();

        let mut sink = Vec::new();
        let sent = send_request(&mut sink, &url, &Settings::default().max_request_size(len)).unwrap();
        assert_eq!(sent, len);
        assert_eq!(sink.len(), len);

        let err = send_request(Vec::new(), &url, &Settings::default().max_request_size(len - 1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::RequestTooLarge { .. }));
    }

    #[test]
    fn test_short_writes_are_completed() {
        let url = url("example.com:80/index.html");
        let mut writer = Trickle {
            written: Vec::new(),
            limit: 3,
            calls: 0,
        };

        let sent = send_request(&mut writer, &url, &Settings::default()).unwrap();
        let expected = PreparedRequest::new(&url, &Settings::default()).unwrap();
        assert_eq!(sent, expected.as_bytes().len());
        assert_eq!(writer.written, expected.as_bytes());
        assert!(writer.calls > 1);
    }

    #[test]
    fn test_stalled_write_is_send_error() {
        let mut writer = Trickle {
            written: Vec::new(),
            limit: 0,
            calls: 0,
        };

        let err = send_request(&mut writer, &url("example.com:80/"), &Settings::default()).unwrap_err();
        match err.kind() {
            ErrorKind::Send(err) => assert_eq!(err.kind(), io::ErrorKind::WriteZero),
            err => panic!("Unexpected error: {:?}", err),
        }
    }
}
