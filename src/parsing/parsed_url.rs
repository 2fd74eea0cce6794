use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// The `hostname`, `port` and `path` of a `HOSTNAME:PORT/PATH` string.
///
/// The three parts are owned copies of the input. `hostname` is never empty and contains neither `:` nor `/`,
/// `port` is never empty and contains neither `:` nor `/`, and `path` never starts with the `/` that separated it
/// from the port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUrl {
    hostname: String,
    port: String,
    path: String,
}

impl ParsedUrl {
    /// Split `raw` into its hostname, port and path.
    ///
    /// Everything before the first `/` is the authority and everything after it is the path. The authority is then
    /// split on its first `:`. Input missing either delimiter is rejected with `ErrorKind::MalformedUrl`.
    ///
    /// # Example
    /// ```
    /// let url = rawget::ParsedUrl::parse("example.com:80/index.html").unwrap();
    /// assert_eq!(url.hostname(), "example.com");
    /// assert_eq!(url.port(), "80");
    /// assert_eq!(url.path(), "index.html");
    /// ```
    pub fn parse(raw: &str) -> Result<ParsedUrl> {
        let malformed = |reason: &'static str| -> Error {
            ErrorKind::MalformedUrl {
                input: raw.to_owned(),
                reason,
            }
            .into()
        };

        let (authority, path) = raw.split_once('/').ok_or_else(|| malformed("missing '/' before the path"))?;
        let (hostname, port) = authority
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' between hostname and port"))?;

        if hostname.is_empty() {
            return Err(malformed("empty hostname"));
        }
        if port.is_empty() {
            return Err(malformed("empty port"));
        }
        if port.contains(':') {
            return Err(malformed("more than one ':' before the path"));
        }

        Ok(ParsedUrl {
            hostname: hostname.to_owned(),
            port: port.to_owned(),
            path: path.to_owned(),
        })
    }

    /// Get the hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the port, exactly as it was written.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Get the path, without its leading `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `hostname:port`, as sent in the `Host` header and used to resolve the host.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// The path with its leading `/` restored, as sent on the request line.
    pub fn request_target(&self) -> String {
        format!("/{}", self.path)
    }
}

impl FromStr for ParsedUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<ParsedUrl> {
        ParsedUrl::parse(s)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}/{}", self.hostname, self.port, self.path)
    }
}

#[cfg(test)]
fn assert_malformed(raw: &str) {
    match ParsedUrl::parse(raw) {
        Err(err) => match err.kind() {
            ErrorKind::MalformedUrl { input, .. } => assert_eq!(input, raw),
            err => panic!("Unexpected error: {:?}", err),
        },
        Ok(url) => panic!("Unexpected url: {:?}", url),
    }
}

#[test]
fn test_parse_full() {
    let url = ParsedUrl::parse("example.com:80/index.html").unwrap();
    assert_eq!(url.hostname(), "example.com");
    assert_eq!(url.port(), "80");
    assert_eq!(url.path(), "index.html");
}

#[test]
fn test_parse_empty_path() {
    let url = ParsedUrl::parse("example.com:80/").unwrap();
    assert_eq!(url.hostname(), "example.com");
    assert_eq!(url.port(), "80");
    assert_eq!(url.path(), "");
    assert_eq!(url.request_target(), "/");
}

#[test]
fn test_parse_splits_on_first_delimiters() {
    let url = ParsedUrl::parse("localhost:3490/d20/a:b/c").unwrap();
    assert_eq!(url.hostname(), "localhost");
    assert_eq!(url.port(), "3490");
    assert_eq!(url.path(), "d20/a:b/c");
    assert_eq!(url.request_target(), "/d20/a:b/c");
    assert_eq!(url.authority(), "localhost:3490");
}

#[test]
fn test_parse_keeps_port_as_written() {
    let url: ParsedUrl = "10.0.0.1:http/x".parse().unwrap();
    assert_eq!(url.hostname(), "10.0.0.1");
    assert_eq!(url.port(), "http");
}

#[test]
fn test_parse_owns_its_parts() {
    let raw = String::from("example.com:8080/a/b");
    let url = ParsedUrl::parse(&raw).unwrap();
    drop(raw);
    assert_eq!(url.to_string(), "example.com:8080/a/b");
}

#[test]
fn test_parse_no_delimiters() {
    assert_malformed("example.com");
}

#[test]
fn test_parse_no_slash() {
    assert_malformed("example.com:80");
}

#[test]
fn test_parse_colon_only_in_path() {
    assert_malformed("example.com/a:b");
}

#[test]
fn test_parse_empty_parts() {
    assert_malformed("");
    assert_malformed(":80/index.html");
    assert_malformed("example.com:/index.html");
    assert_malformed("/");
}

#[test]
fn test_parse_two_colons() {
    assert_malformed("example.com:80:81/");
}
