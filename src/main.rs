use std::io;
use std::process;
use std::time::Duration;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgAction, Parser};
use log::LevelFilter;

use rawget::{Error, ErrorKind, ParsedUrl, Settings};

/// Fetch HOSTNAME:PORT/PATH with a single HTTP/1.1 GET and print the raw response.
#[derive(Debug, Parser)]
#[command(name = "client", version)]
struct Cli {
    /// What to fetch, e.g. localhost:3490/d20.
    #[arg(value_name = "HOSTNAME:PORT/PATH")]
    url: String,

    /// Give up on each connection attempt after this many seconds.
    #[arg(long, value_name = "SECS", value_parser = parse_secs, default_value = "30")]
    connect_timeout: Duration,

    /// Fail when the server sends nothing for this many seconds.
    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    read_timeout: Option<Duration>,

    /// Fail when the whole exchange takes longer than this many seconds.
    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    timeout: Option<Duration>,

    /// Log more to stderr, repeat for more detail. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default().connect_timeout(self.connect_timeout);
        if let Some(read_timeout) = self.read_timeout {
            settings = settings.read_timeout(read_timeout);
        }
        if let Some(timeout) = self.timeout {
            settings = settings.timeout(timeout);
        }
        settings
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("{:?} is not a number of seconds", s))?;
    let duration = Duration::try_from_secs_f64(secs).map_err(|_| format!("{:?} is out of range", s))?;
    if duration.is_zero() {
        return Err(format!("{:?} must be a positive number of seconds", s));
    }
    Ok(duration)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                let _ = err.print();
                process::exit(0);
            }
            _ => {
                eprintln!("{}", Error::from(ErrorKind::Usage));
                eprint!("{}", err);
                process::exit(1);
            }
        },
    };

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let settings = cli.settings();
    log::debug!("{:?}", settings);

    let stdout = io::stdout();
    let result = ParsedUrl::parse(&cli.url).and_then(|url| rawget::run(&url, &settings, stdout.lock()));

    match result {
        Ok(count) => log::info!("transfer complete, {} bytes", count),
        Err(err) => {
            log::debug!("{:?}", err);
            eprintln!("client: {}", err);
            process::exit(1);
        }
    }
}

#[test]
fn test_parse_secs() {
    assert_eq!(parse_secs("2"), Ok(Duration::from_secs(2)));
    assert_eq!(parse_secs("0.5"), Ok(Duration::from_millis(500)));
    assert!(parse_secs("0").is_err());
    assert!(parse_secs("-1").is_err());
    assert!(parse_secs("soon").is_err());
    assert!(parse_secs("NaN").is_err());
    assert!(parse_secs("inf").is_err());
    assert!(parse_secs("1e30").is_err());
    assert!(parse_secs("1e-12").is_err());
}

#[test]
fn test_cli_rejects_out_of_range_timeout() {
    let err = Cli::try_parse_from(["client", "--timeout", "1e30", "localhost:80/"]).unwrap_err();
    assert_eq!(err.kind(), ClapErrorKind::ValueValidation);
}

#[test]
fn test_cli_settings() {
    let cli = Cli::try_parse_from(["client", "--read-timeout", "1.5", "-vv", "localhost:80/"]).unwrap();
    assert_eq!(cli.url, "localhost:80/");
    assert_eq!(cli.connect_timeout, Duration::from_secs(30));
    assert_eq!(cli.read_timeout, Some(Duration::from_millis(1500)));
    assert_eq!(cli.timeout, None);
    assert_eq!(cli.log_level(), LevelFilter::Debug);
}

#[test]
fn test_cli_argument_count() {
    assert!(Cli::try_parse_from(["client"]).is_err());
    assert!(Cli::try_parse_from(["client", "a:1/", "b:2/"]).is_err());
}
