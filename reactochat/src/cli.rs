//! Command-line interface.

use clap::Parser;

/// Reactochat server: an edge-triggered epoll reactor that fans chat
/// messages out to every connected client.
#[derive(Debug, Parser)]
#[command(name = "reactochat", version, about)]
pub struct Cli {
    /// One or more ports to listen on. The reference server accepts this as
    /// `server <port> [<port>...]`; Reactochat keeps that shape but each
    /// port gets its own listening socket registered into the same reactor.
    /// When omitted, the port from `--config` (or its built-in default) is
    /// used instead (§10.4).
    #[arg(num_args = 0..)]
    pub ports: Vec<u16>,

    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Overridden by `RUST_LOG` when set; falls back to `--config`'s
    /// `log_level` (or its built-in default) when omitted.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to an optional TOML config file. Missing file or parse failure
    /// falls back to built-in defaults, matching the client's `config.ini`
    /// discipline.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_port() {
        let cli = Cli::parse_from(["reactochat", "9000"]);
        assert_eq!(cli.ports, vec![9000]);
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn parses_multiple_ports_and_flags() {
        let cli = Cli::parse_from([
            "reactochat",
            "9000",
            "9001",
            "--log-level",
            "debug",
            "--config",
            "reactochat.toml",
        ]);
        assert_eq!(cli.ports, vec![9000, 9001]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert_eq!(cli.config, Some("reactochat.toml".into()));
    }

    #[test]
    fn ports_are_optional_when_config_supplies_one() {
        let cli = Cli::parse_from(["reactochat"]);
        assert!(cli.ports.is_empty());
    }
}
