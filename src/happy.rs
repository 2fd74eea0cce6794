use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Head start given to each connection attempt before the next one is launched.
const RACE_DELAY: Duration = Duration::from_millis(200);

/// Resolve `authority` (`hostname:port`) and connect to it.
///
/// When the name resolves to a single address it is connected directly. Otherwise the addresses are ordered IPv6
/// first, alternating families, and attempts are launched one after the other with a small delay. The first
/// attempt to succeed wins. If every attempt fails, the first error is returned.
///
/// Each attempt is bounded by `timeout`.
pub fn connect(authority: &str, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = resolve(authority)?;

    if let [addr] = &addrs[..] {
        debug!("{} resolved to {} only, connecting directly", authority, addr);
        return TcpStream::connect_timeout(addr, timeout);
    }

    debug!("{} resolved to {} addresses, racing them", authority, addrs.len());

    race(interleave(addrs), timeout)
}

fn resolve(authority: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<_> = authority.to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", authority),
        ));
    }
    Ok(addrs)
}

/// Alternate address families, IPv6 first, keeping the resolver's order within a family.
fn interleave(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let (v6, v4): (Vec<_>, Vec<_>) = addrs.into_iter().partition(|a| a.is_ipv6());
    let mut ordered = Vec::with_capacity(v6.len() + v4.len());
    let mut v6 = v6.into_iter();
    let mut v4 = v4.into_iter();

    loop {
        match (v6.next(), v4.next()) {
            (None, None) => break,
            (a, b) => ordered.extend(a.into_iter().chain(b)),
        }
    }

    ordered
}

fn race(addrs: Vec<SocketAddr>, timeout: Duration) -> io::Result<TcpStream> {
    let start = Instant::now();
    let (tx, rx) = channel();
    let mut first_err = None;

    for addr in addrs {
        let tx = tx.clone();
        thread::spawn(move || {
            trace!("attempting {}", addr);
            let _ = tx.send((addr, TcpStream::connect_timeout(&addr, timeout)));
        });

        // Give this attempt a head start, but take any result that comes in meanwhile.
        match rx.recv_timeout(RACE_DELAY) {
            Ok((addr, Ok(sock))) => {
                debug!("connected to {} in {}ms", addr, start.elapsed().as_millis());
                return Ok(sock);
            }
            Ok((addr, Err(err))) => {
                debug!("could not connect to {}: {}", addr, err);
                first_err.get_or_insert(err);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => unreachable!("sender held by the loop"),
        }
    }

    // Only the attempt threads hold senders now, the channel closes when they are all done.
    drop(tx);

    if let Some(sock) = drain(&rx, &mut first_err) {
        debug!("connected in {}ms", start.elapsed().as_millis());
        return Ok(sock);
    }

    debug!("no address accepted a connection after {}ms", start.elapsed().as_millis());

    Err(first_err.unwrap_or_else(|| io::ErrorKind::ConnectionRefused.into()))
}

fn drain(rx: &Receiver<(SocketAddr, io::Result<TcpStream>)>, first_err: &mut Option<io::Error>) -> Option<TcpStream> {
    for (addr, result) in rx.iter() {
        match result {
            Ok(sock) => {
                debug!("connected to {}", addr);
                return Some(sock);
            }
            Err(err) => {
                debug!("could not connect to {}: {}", addr, err);
                first_err.get_or_insert(err);
            }
        }
    }
    None
}

#[cfg(test)]
fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

#[test]
fn test_interleave_even() {
    let input = vec![addr("1.1.1.1:80"), addr("[::1]:80"), addr("2.2.2.2:80"), addr("[::2]:80")];
    let expected = vec![addr("[::1]:80"), addr("1.1.1.1:80"), addr("[::2]:80"), addr("2.2.2.2:80")];
    assert_eq!(interleave(input), expected);
}

#[test]
fn test_interleave_more_v4() {
    let input = vec![addr("1.1.1.1:80"), addr("2.2.2.2:80"), addr("[::1]:80"), addr("3.3.3.3:80")];
    let expected = vec![addr("[::1]:80"), addr("1.1.1.1:80"), addr("2.2.2.2:80"), addr("3.3.3.3:80")];
    assert_eq!(interleave(input), expected);
}

#[test]
fn test_interleave_more_v6() {
    let input = vec![addr("[::1]:80"), addr("[::2]:80"), addr("[::3]:80"), addr("1.1.1.1:80")];
    let expected = vec![addr("[::1]:80"), addr("1.1.1.1:80"), addr("[::2]:80"), addr("[::3]:80")];
    assert_eq!(interleave(input), expected);
}

#[test]
fn test_invalid_port_fails_resolution() {
    assert!(resolve("localhost:notaport").is_err());
    assert!(resolve("localhost:70000").is_err());
}

#[test]
fn test_connect_to_listener() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let authority = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    let sock = connect(&authority, Duration::from_secs(5)).unwrap();
    assert_eq!(sock.peer_addr().unwrap(), listener.local_addr().unwrap());
}

#[test]
fn test_race_reports_first_error() {
    // Bind then drop to get ports that refuse connections.
    let refused: Vec<SocketAddr> = (0..2)
        .map(|_| std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap())
        .collect();
    let err = race(refused, Duration::from_secs(5)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
}
