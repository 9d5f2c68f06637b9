//! Command-line interface for shell-scribe.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

use crate::transcript::RecordFormat;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Shell executable to spawn.
    pub shell: Option<String>,
    /// Arguments for the shell (everything after `--`).
    pub shell_args: Vec<String>,
    /// Transcript file path.
    pub log_file: Option<PathBuf>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Line that ends the session.
    pub exit_token: Option<String>,
    /// Transcript record format.
    pub format: Option<RecordFormat>,
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
    use lexopt::prelude::*;

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
            Short('s') | Long("shell") => {
                result.shell = Some(parser.value()?.parse()?);
            }
            Short('o') | Long("log-file") => {
                result.log_file = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("exit-token") => {
                let value: String = parser.value()?.parse()?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidValue("exit-token", value));
                }
                result.exit_token = Some(value);
            }
            Short('f') | Long("format") => {
                let value: String = parser.value()?.parse()?;
                result.format = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("format", value))?,
                );
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result
                    .shell_args
                    .push(val.into_string().map_err(|v| {
                        ArgsError::UnexpectedArgument(v.to_string_lossy().into())
                    })?);
                // Everything after the first positional belongs to the shell.
                for raw in parser.raw_args()? {
                    let arg = raw
                        .into_string()
                        .map_err(|v| ArgsError::UnexpectedArgument(v.to_string_lossy().into()))?;
                    result.shell_args.push(arg);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"shell-scribe {version}
Record an interactive shell session to a sanitized, noise-filtered transcript

USAGE:
    shell-scribe [OPTIONS] [-- SHELL_ARGS...]

OPTIONS:
    -s, --shell <PATH>      Shell to run [default: $SHELL or /bin/sh]
    -o, --log-file <FILE>   Transcript file [default: log.txt]
    -c, --config <FILE>     Path to configuration file (JSON)
    -e, --exit-token <TOK>  Line that ends the session [default: exitt]
    -f, --format <FMT>      Record format: plain, annotated [default: plain]
    -l, --log-level <LVL>   Diagnostic log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SHELL_SCRIBE_SHELL       Shell to run (overrides config)
    SHELL_SCRIBE_LOG_FILE    Transcript file (overrides config)
    SHELL_SCRIBE_EXIT_TOKEN  Exit token (overrides config)
    SHELL_SCRIBE_LOG_LEVEL   Diagnostic log level (overrides config)
    RUST_LOG                 Alternative log level setting

EXAMPLES:
    # Record a session with the default shell into ./log.txt
    shell-scribe

    # Record bash without rc files, with timestamps
    shell-scribe -s /bin/bash -f annotated -o session.log -- --norc

    # Use a config file with custom prompt patterns
    shell-scribe -c ~/.config/shell-scribe.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("shell-scribe {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Argument that is not valid UTF-8.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("shell-scribe")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.shell.is_none());
        assert!(result.log_file.is_none());
        assert!(result.shell_args.is_empty());
        assert!(!result.help);
    }

    #[test]
    fn test_short_options() {
        let result = parse_args_from(args(&["-s", "/bin/bash", "-o", "s.log", "-e", "bye"])).unwrap();
        assert_eq!(result.shell.as_deref(), Some("/bin/bash"));
        assert_eq!(result.log_file, Some(PathBuf::from("s.log")));
        assert_eq!(result.exit_token.as_deref(), Some("bye"));
    }

    #[test]
    fn test_long_options() {
        let result = parse_args_from(args(&[
            "--shell",
            "/bin/zsh",
            "--log-file",
            "/tmp/t.log",
            "--format",
            "annotated",
        ]))
        .unwrap();
        assert_eq!(result.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(result.log_file, Some(PathBuf::from("/tmp/t.log")));
        assert_eq!(result.format, Some(RecordFormat::Annotated));
    }

    #[test]
    fn test_shell_args_after_double_dash() {
        let result = parse_args_from(args(&["-s", "/bin/bash", "--", "--norc", "-i"])).unwrap();
        assert_eq!(result.shell_args, vec!["--norc", "-i"]);
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/scribe.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/scribe.json")));
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse_args_from(args(&["-h"])).unwrap().help);
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
        assert!(parse_args_from(args(&["--version"])).unwrap().version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_format() {
        assert!(parse_args_from(args(&["-f", "xml"])).is_err());
    }

    #[test]
    fn test_blank_exit_token() {
        assert!(parse_args_from(args(&["-e", "  "])).is_err());
    }

    #[test]
    fn test_unknown_flag() {
        assert!(parse_args_from(args(&["--port", "80"])).is_err());
    }
}
