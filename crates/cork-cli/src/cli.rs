use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cork",
    about = "Corkboard: a posts backend with likes, comments and attachments",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "CORK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print the resolved configuration
    Config(ConfigArgs),
    /// Open the document store and check that it answers
    Ping(PingArgs),
}

/// Flags that take precedence over the config file and environment.
#[derive(Args, Clone, Debug, Default)]
pub struct Overrides {
    /// Listening port
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Document-store connection string (memory://, file://<dir>, mongodb://…)
    #[arg(long)]
    pub db: Option<String>,
    /// Directory for uploaded files
    #[arg(long)]
    pub uploads: Option<PathBuf>,
    /// The single origin allowed to call the API
    #[arg(long)]
    pub origin: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: Overrides,
    /// Print the connection string without masking credentials
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(Args)]
pub struct PingArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "cork", "serve", "--port", "8080", "--db", "memory://", "--origin", "https://a.example",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.overrides.port, Some(8080));
        assert_eq!(args.overrides.db.as_deref(), Some("memory://"));
        assert_eq!(args.overrides.origin.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn parse_config_json() {
        let cli = Cli::try_parse_from(["cork", "config", "--format", "json", "--show-secrets"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        let Command::Config(args) = cli.command else {
            panic!("expected config");
        };
        assert!(args.show_secrets);
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(Cli::try_parse_from(["cork", "serve", "--port", "99999"]).is_err());
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["cork"]).is_err());
    }
}
