use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

fn client(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_client"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run client")
}

/// A listener that fails the test if anything connects to it before it is dropped.
fn tripwire() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn assert_usage(output: &Output) {
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: client HOSTNAME:PORT/PATH"), "stderr: {}", stderr);
}

#[test]
fn test_no_arguments() {
    assert_usage(&client(&[]));
}

#[test]
fn test_too_many_arguments() {
    let (listener, port) = tripwire();
    let first = format!("127.0.0.1:{}/a", port);
    let second = format!("127.0.0.1:{}/b", port);

    assert_usage(&client(&[&first, &second]));
    assert!(listener.accept().is_err(), "client connected despite bad usage");
}

#[test]
fn test_malformed_url() {
    let output = client(&["example.com"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed url"), "stderr: {}", stderr);
}

#[test]
fn test_help_exits_zero() {
    let output = client(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("HOSTNAME:PORT/PATH"));
}

/// Serves a single connection: reads the request head, replies with `reply` and closes.
fn serve_once(reply: Vec<u8>) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") && stream.read(&mut byte).unwrap() == 1 {
            head.push(byte[0]);
        }
        stream.write_all(&reply).unwrap();
        stream.shutdown(Shutdown::Both).unwrap();
    });
    (port, handle)
}

#[test]
fn test_immediate_close_exits_zero() {
    let (port, server) = serve_once(Vec::new());

    let output = client(&[&format!("127.0.0.1:{}/", port)]);
    server.join().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_streams_response_to_stdout() {
    let reply = b"HTTP/1.1 500 Internal Server Error\r\n\r\nbinary\x00tail".to_vec();
    let (port, server) = serve_once(reply.clone());

    let output = client(&[&format!("127.0.0.1:{}/index.html", port)]);
    server.join().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(output.stdout, reply);
}

#[test]
fn test_connection_failure_exits_one() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let output = client(&[&format!("127.0.0.1:{}/", port)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("connection failed"));
}
