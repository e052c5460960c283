//! Command-line interface for session-pager.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use lexopt::prelude::*;

/// Command-line arguments.
///
/// Every setting is optional so that unset flags fall through to the
/// environment, the config file, and finally the defaults.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Session lifetime in seconds.
    pub ttl_secs: Option<u64>,
    /// Records per page.
    pub page_size: Option<usize>,
    /// Milliseconds between prune passes.
    pub prune_interval_ms: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                result.host = Some(parse_value(&mut parser, "host")?);
            }
            Short('p') | Long("port") => {
                result.port = Some(parse_value(&mut parser, "port")?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("ttl") => {
                result.ttl_secs = Some(parse_value(&mut parser, "ttl")?);
            }
            Short('s') | Long("page-size") => {
                result.page_size = Some(parse_value(&mut parser, "page-size")?);
            }
            Short('i') | Long("prune-interval") => {
                result.prune_interval_ms = Some(parse_value(&mut parser, "prune-interval")?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_value<T: std::str::FromStr>(
    parser: &mut lexopt::Parser,
    name: &'static str,
) -> Result<T, ArgsError> {
    let value: String = parser.value()?.parse()?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-pager {version}
Paginated, time-limited result session store

USAGE:
    session-pager [OPTIONS]

OPTIONS:
    -H, --host <ADDR>            Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>            Port to listen on [default: 3000]
    -c, --config <FILE>          Path to configuration file (JSON)
    -t, --ttl <SECS>             Session lifetime in seconds [default: 300]
    -s, --page-size <N>          Records per page [default: 100]
    -i, --prune-interval <MS>    Milliseconds between prune passes [default: 1000]
    -l, --log-level <LVL>        Log level (error, warn, info, debug, trace)
    -h, --help                   Print help
    -V, --version                Print version

ENVIRONMENT VARIABLES:
    SESSION_PAGER_HOST               Host address (overrides config)
    SESSION_PAGER_PORT               Port number (overrides config)
    SESSION_PAGER_TTL_SECS           Session lifetime (overrides config)
    SESSION_PAGER_PAGE_SIZE          Records per page (overrides config)
    SESSION_PAGER_PRUNE_INTERVAL_MS  Prune interval (overrides config)
    SESSION_PAGER_LOG_LEVEL          Log level (overrides config)
    RUST_LOG                         Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:3000, 5 minute sessions)
    session-pager

    # Short-lived sessions with small pages
    session-pager -t 60 -s 20

    # Start with config file
    session-pager -c /etc/session-pager/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-pager {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
