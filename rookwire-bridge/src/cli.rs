//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Rookwire bridge command-line arguments
///
/// Values given here override the config file.
#[derive(Parser, Debug)]
#[command(name = "rookwire", about = "Chessboard serial bridge")]
pub struct CliArgs {
    /// Path to a TOML config file (embedded defaults otherwise)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serial port of the board controller
    #[arg(long)]
    pub port: Option<String>,

    /// Log filter (error, warn, info, debug, trace or a directive list)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = CliArgs::parse_from([
            "rookwire",
            "--port",
            "/dev/ttyACM0",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }
}
