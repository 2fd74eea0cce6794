#[cfg(test)]
use std::io::Cursor;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{ErrorKind, Result};
use crate::happy;
use crate::parsing::ParsedUrl;
use crate::request::Settings;

/// The one connection used for an exchange.
///
/// The socket is shut down and closed when this value is dropped, whichever way the exchange ends.
#[derive(Debug)]
pub enum BaseStream {
    Plain {
        stream: TcpStream,
        timeout: Option<mpsc::Sender<()>>,
    },
    #[cfg(test)]
    Mock {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    },
}

impl BaseStream {
    /// Connect to the host and port of `url`.
    ///
    /// Resolution and connection failures are reported as `ErrorKind::Connection`.
    pub fn connect(url: &ParsedUrl, settings: &Settings) -> Result<BaseStream> {
        let authority = url.authority();

        debug!("trying to connect to {}", authority);

        let stream = happy::connect(&authority, settings.connect_timeout).map_err(ErrorKind::Connection)?;
        stream
            .set_read_timeout(settings.read_timeout)
            .map_err(ErrorKind::Connection)?;

        let timeout = settings
            .timeout
            .map(|timeout| watchdog(&stream, timeout))
            .transpose()
            .map_err(ErrorKind::Connection)?;

        Ok(BaseStream::Plain { stream, timeout })
    }

    #[cfg(test)]
    pub fn mock(bytes: Vec<u8>) -> BaseStream {
        BaseStream::Mock {
            input: Cursor::new(bytes),
            output: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn written(&self) -> &[u8] {
        match self {
            BaseStream::Mock { output, .. } => output.as_slice(),
            _ => &[][..],
        }
    }
}

/// Shut the socket down once `timeout` elapses, unless the returned sender is used or dropped first.
fn watchdog(stream: &TcpStream, timeout: Duration) -> io::Result<mpsc::Sender<()>> {
    let stream = stream.try_clone()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
            debug!("deadline of {:?} reached, shutting the connection down", timeout);
            drop(rx);
            let _ = stream.shutdown(Shutdown::Both);
        }
    });
    Ok(tx)
}

impl Read for BaseStream {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BaseStream::Plain { stream, timeout } => read_timeout(stream, buf, timeout),
            #[cfg(test)]
            BaseStream::Mock { input, .. } => input.read(buf),
        }
    }
}

impl Write for BaseStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BaseStream::Plain { stream, .. } => stream.write(buf),
            #[cfg(test)]
            BaseStream::Mock { output, .. } => output.write(buf),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        match self {
            BaseStream::Plain { stream, .. } => stream.flush(),
            #[cfg(test)]
            BaseStream::Mock { .. } => Ok(()),
        }
    }
}

impl Drop for BaseStream {
    fn drop(&mut self) {
        if let BaseStream::Plain { stream, .. } = self {
            debug!("closing connection");
            // The peer may already be gone, there is nothing left to report.
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// A read that hits end of stream after the watchdog fired is the deadline, not the peer closing.
fn read_timeout(stream: &mut impl Read, buf: &mut [u8], timeout: &Option<mpsc::Sender<()>>) -> io::Result<usize> {
    let read = stream.read(buf)?;

    if let Some(timeout) = timeout {
        if read == 0 && !buf.is_empty() && timeout.send(()).is_err() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "overall timeout elapsed"));
        }
    }

    Ok(read)
}

#[test]
fn test_mock_records_writes() {
    let mut stream = BaseStream::mock(b"reply".to_vec());
    stream.write_all(b"request").unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).unwrap();
    assert_eq!(reply, b"reply");
    assert_eq!(stream.written(), b"request");
}

#[test]
fn test_connect_refused_is_connection_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = ParsedUrl::parse(&format!("127.0.0.1:{}/", port)).unwrap();

    let err = BaseStream::connect(&url, &Settings::default()).unwrap_err();
    match err.kind() {
        ErrorKind::Connection(err) => assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused),
        err => panic!("Unexpected error: {:?}", err),
    }
}

#[test]
fn test_bad_port_is_connection_error() {
    let url = ParsedUrl::parse("127.0.0.1:http-alt/").unwrap();
    let err = BaseStream::connect(&url, &Settings::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Connection(_)));
}

#[test]
fn test_deadline_turns_eof_into_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = ParsedUrl::parse(&format!("127.0.0.1:{}/", listener.local_addr().unwrap().port())).unwrap();
    let server = thread::spawn(move || {
        let (_sock, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(500));
    });

    let settings = Settings::default().timeout(Duration::from_millis(100));
    let mut stream = BaseStream::connect(&url, &settings).unwrap();
    let mut buf = [0u8; 16];
    let err = stream.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);

    server.join().unwrap();
}
