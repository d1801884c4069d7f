use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_ACCESS_TTL_MINUTES, ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT, ENV_RATE_LIMIT_AUTH_RPM,
    ENV_RATE_LIMIT_ENABLED, ENV_REFRESH_TTL_DAYS,
};

#[derive(Parser)]
#[command(name = "studyline")]
#[command(version, about = "Student progress tracking server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable debug mode (verbose request logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Access token lifetime in minutes
    #[arg(long, global = true, env = ENV_ACCESS_TTL_MINUTES)]
    pub access_ttl_minutes: Option<u64>,

    /// Refresh token lifetime in days
    #[arg(long, global = true, env = ENV_REFRESH_TTL_DAYS)]
    pub refresh_ttl_days: Option<u64>,

    /// Enable or disable per-IP rate limiting on auth endpoints
    #[arg(long, global = true, env = ENV_RATE_LIMIT_ENABLED)]
    pub rate_limit_enabled: Option<bool>,

    /// Auth endpoint rate limit (requests per minute per IP)
    #[arg(long, global = true, env = ENV_RATE_LIMIT_AUTH_RPM)]
    pub rate_limit_auth_rpm: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default when no subcommand is given)
    Start,
    /// Populate an empty database with demo users, students and a curriculum
    Seed,
}

/// CLI-sourced configuration values, extracted from parsed arguments
#[derive(Debug, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub access_ttl_minutes: Option<u64>,
    pub refresh_ttl_days: Option<u64>,
    pub rate_limit_enabled: Option<bool>,
    pub rate_limit_auth_rpm: Option<u32>,
}

/// Parse command line arguments into config values and an optional subcommand
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();

    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        debug: cli.debug,
        access_ttl_minutes: cli.access_ttl_minutes,
        refresh_ttl_days: cli.refresh_ttl_days,
        rate_limit_enabled: cli.rate_limit_enabled,
        rate_limit_auth_rpm: cli.rate_limit_auth_rpm,
    };

    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::try_parse_from(["studyline"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parses_seed_subcommand() {
        let cli = Cli::try_parse_from(["studyline", "seed"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed)));
    }

    #[test]
    fn test_cli_parses_server_options() {
        let cli =
            Cli::try_parse_from(["studyline", "--host", "0.0.0.0", "--port", "9000"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9000));
    }
}
