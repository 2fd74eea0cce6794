use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::result;

/// Kinds of errors produced while fetching a URL.
///
/// Every kind names the stage of the pipeline that failed. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The command line did not contain exactly one URL.
    #[error("usage: client HOSTNAME:PORT/PATH")]
    Usage,
    /// The URL is not of the shape `HOSTNAME:PORT/PATH`.
    #[error("malformed url {input:?}: {reason}")]
    MalformedUrl {
        /// The raw input that was rejected.
        input: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The host could not be resolved or no connection could be established.
    #[error("connection failed: {0}")]
    Connection(#[source] io::Error),
    /// The formatted request does not fit in the request buffer.
    #[error("request of {size} bytes exceeds the maximum of {max} bytes")]
    RequestTooLarge {
        /// Size of the formatted request.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Sending the request failed or stopped making progress.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    /// Reading the response from the connection failed.
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    /// Writing the response to the output failed.
    #[error("output failed: {0}")]
    Output(#[source] io::Error),
}

/// A type that contains all the errors that can possibly occur while fetching a URL.
#[derive(Debug)]
pub struct Error(pub(crate) Box<ErrorKind>);

impl Error {
    /// Get a reference to the `ErrorKind` inside.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume this `Error` and get the `ErrorKind` inside.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the underlying I/O error, if this error was caused by one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self.kind() {
            ErrorKind::Connection(err) | ErrorKind::Send(err) | ErrorKind::Receive(err) | ErrorKind::Output(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, w: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, w)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<ErrorKind> for Error {
    fn from(err: ErrorKind) -> Error {
        Error(Box::new(err))
    }
}

/// Wrapper for the `Result` type with an `Error`.
pub type Result<T = ()> = result::Result<T, Error>;

#[test]
fn test_display_names_stage() {
    let err = Error::from(ErrorKind::Send(io::ErrorKind::BrokenPipe.into()));
    assert!(err.to_string().starts_with("send failed"));

    let err = Error::from(ErrorKind::RequestTooLarge { size: 20000, max: 16384 });
    assert_eq!(
        err.to_string(),
        "request of 20000 bytes exceeds the maximum of 16384 bytes"
    );
}

#[test]
fn test_source_is_io_error() {
    let err = Error::from(ErrorKind::Receive(io::ErrorKind::ConnectionReset.into()));
    let source = err.source().and_then(|e| e.downcast_ref::<io::Error>());
    assert_eq!(source.map(|e| e.kind()), Some(io::ErrorKind::ConnectionReset));
    assert_eq!(err.io_error().map(|e| e.kind()), Some(io::ErrorKind::ConnectionReset));
}

#[test]
fn test_malformed_has_no_source() {
    let err = Error::from(ErrorKind::MalformedUrl {
        input: "example.com".into(),
        reason: "missing '/'",
    });
    assert!(err.source().is_none());
    assert!(err.io_error().is_none());
}

#[test]
fn test_into_kind() {
    let err = Error::from(ErrorKind::Usage);
    assert!(matches!(err.into_kind(), ErrorKind::Usage));

    match Error::from(ErrorKind::Connection(io::ErrorKind::ConnectionRefused.into())).into_kind() {
        ErrorKind::Connection(err) => assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused),
        err => panic!("Unexpected error: {:?}", err),
    }
}
