use std::time::Duration;

/// Largest request head that will be sent.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 16384;
/// Number of bytes read from the connection at once.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs for a single exchange.
///
/// Defaults block on reads forever, like a plain socket would, and only bound the connection attempts.
#[derive(Clone, Debug)]
pub struct Settings {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_request_size: usize,
    pub(crate) chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            timeout: None,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    /// Sets a connect timeout for each connection attempt.
    ///
    /// Default is 30 seconds.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Sets a read timeout for the response.
    ///
    /// Default is no timeout.
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = Some(duration);
        self
    }

    /// Sets an overall deadline for the exchange, counted from the moment the connection is established.
    ///
    /// Default is no deadline.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the largest request head that may be sent.
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.max_request_size = size;
        self
    }

    /// Sets how many bytes are read from the connection at once.
    ///
    /// A size of zero is raised to one byte.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.connect_timeout, Duration::from_secs(30));
    assert_eq!(settings.read_timeout, None);
    assert_eq!(settings.timeout, None);
    assert_eq!(settings.max_request_size, 16384);
    assert_eq!(settings.chunk_size, 4096);
}

#[test]
fn test_setters() {
    let settings = Settings::default()
        .connect_timeout(Duration::from_secs(1))
        .read_timeout(Duration::from_millis(250))
        .timeout(Duration::from_secs(5))
        .max_request_size(64)
        .chunk_size(7);
    assert_eq!(settings.connect_timeout, Duration::from_secs(1));
    assert_eq!(settings.read_timeout, Some(Duration::from_millis(250)));
    assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
    assert_eq!(settings.max_request_size, 64);
    assert_eq!(settings.chunk_size, 7);
}

#[test]
fn test_zero_chunk_size_is_clamped() {
    let settings = Settings::default().chunk_size(0);
    assert_eq!(settings.chunk_size, 1);
}
