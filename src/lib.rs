//! This project is a bare bones HTTP/1.1 client. Given a `HOSTNAME:PORT/PATH` string it connects to the host,
//! sends a single `GET` request and copies whatever comes back to an output, byte for byte.
//!
//! The response is never interpreted: status line, headers and body are passed through untouched. There is no
//! TLS, no redirection handling, no connection reuse and no retry.
//!
//! # Quick start
//! ```no_run
//! use std::io;
//!
//! let url = rawget::ParsedUrl::parse("localhost:3490/d20")?;
//! rawget::run(&url, &rawget::Settings::default(), io::stdout())?;
//! # Ok::<(), rawget::Error>(())
//! ```
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod error;
mod happy;
mod parsing;
mod request;
mod response;
mod streams;

use std::io::{Read, Write};

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::parsing::ParsedUrl;
pub use crate::request::{send_request, PreparedRequest, Settings, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_REQUEST_SIZE};
pub use crate::response::Response;
use crate::streams::BaseStream;

/// Fetch `url` and stream the raw response to `out`.
///
/// Returns the number of response bytes written once the server closes the connection. The connection is closed
/// on every path out of this function.
pub fn run<W>(url: &ParsedUrl, settings: &Settings, out: W) -> Result<u64>
where
    W: Write,
{
    let stream = BaseStream::connect(url, settings)?;
    exchange(stream, url, settings, out)
}

/// Parse `raw` and fetch it, see `run`.
pub fn get<W>(raw: &str, settings: &Settings, out: W) -> Result<u64>
where
    W: Write,
{
    let url = ParsedUrl::parse(raw)?;
    run(&url, settings, out)
}

fn exchange<S, W>(mut stream: S, url: &ParsedUrl, settings: &Settings, out: W) -> Result<u64>
where
    S: Read + Write,
    W: Write,
{
    send_request(&mut stream, url, settings)?;
    Response::new(stream, settings.chunk_size).write_to(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_sends_request_and_copies_reply() {
        let url = ParsedUrl::parse("example.com:80/index.html").unwrap();
        let reply = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\na\x00b".to_vec();
        let mut stream = BaseStream::mock(reply.clone());
        let mut out = Vec::new();

        let count = exchange(&mut stream, &url, &Settings::default(), &mut out).unwrap();
        assert_eq!(count, reply.len() as u64);
        assert_eq!(out, reply);
        assert_eq!(
            stream.written(),
            &b"GET /index.html HTTP/1.1\r\nHost: example.com:80\r\nConnection: close\r\n\r\n"[..]
        );
    }

    #[test]
    fn test_exchange_too_large_touches_nothing() {
        let url = ParsedUrl::parse("example.com:80/index.html").unwrap();
        let mut stream = BaseStream::mock(b"unread".to_vec());
        let mut out = Vec::new();

        let err = exchange(&mut stream, &url, &Settings::default().max_request_size(8), &mut out).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::RequestTooLarge { .. }));
        assert!(stream.written().is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_get_rejects_malformed_url_before_connecting() {
        let mut out = Vec::new();
        let err = get("example.com", &Settings::default(), &mut out).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedUrl { .. }));
        assert!(out.is_empty());
    }
}
