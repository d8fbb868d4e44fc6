use std::path::Path;

use colored::Colorize;
use cork_server::{CorkServer, ServerConfig};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(cli.config.as_deref(), args).await,
        Command::Config(args) => cmd_config(cli.config.as_deref(), &cli.format, args),
        Command::Ping(args) => cmd_ping(cli.config.as_deref(), args).await,
    }
}

impl Overrides {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(db) = &self.db {
            config.database_url = Some(db.clone());
        }
        if let Some(uploads) = &self.uploads {
            config.uploads_dir = uploads.clone();
        }
        if let Some(origin) = &self.origin {
            config.allowed_origin = origin.clone();
        }
    }
}

/// Defaults, then the config file, then the environment, then flags.
pub fn resolve_config(file: Option<&Path>, overrides: &Overrides) -> anyhow::Result<ServerConfig> {
    let base = match file {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let mut config = base.apply_env()?;
    overrides.apply(&mut config);
    Ok(config)
}

async fn cmd_serve(file: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(file, &args.overrides)?;
    debug!(bind = %config.bind_addr, uploads = %config.uploads_dir.display(), "resolved configuration");
    let server = CorkServer::connect(config).await?;
    server.serve().await?;
    Ok(())
}

fn cmd_config(file: Option<&Path>, format: &OutputFormat, args: ConfigArgs) -> anyhow::Result<()> {
    let config = resolve_config(file, &args.overrides)?;
    let config = if args.show_secrets { config } else { config.redacted() };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            print!("{}", toml::to_string(&config)?);
            if let Err(e) = config.validate() {
                println!("{} {e}", "✗".red().bold());
            }
        }
    }
    Ok(())
}

async fn cmd_ping(file: Option<&Path>, args: PingArgs) -> anyhow::Result<()> {
    let config = resolve_config(file, &args.overrides)?;
    let url = config.database_url()?;
    let scheme = cork_store::StoreUrl::parse(url)?.scheme();
    let store = cork_store::connect(url).await?;
    match store.ping().await {
        Ok(()) => {
            println!("{} {} store is ready", "✓".green().bold(), scheme.cyan());
            Ok(())
        }
        Err(e) => {
            println!("{} {} store is unavailable", "✗".red().bold(), scheme.cyan());
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cork.toml");
        std::fs::write(
            &path,
            "database_url = \"file://posts\"\nallowed_origin = \"https://file.example\"\n",
        )
        .unwrap();

        let overrides = Overrides {
            origin: Some("https://flag.example".into()),
            uploads: Some("/tmp/cork-uploads".into()),
            ..Default::default()
        };
        let config = resolve_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.allowed_origin, "https://flag.example");
        assert_eq!(config.uploads_dir, std::path::PathBuf::from("/tmp/cork-uploads"));
    }

    #[test]
    fn port_flag_sets_bind_port() {
        let mut config = ServerConfig::default();
        Overrides {
            port: Some(9000),
            db: Some("memory://".into()),
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_url().unwrap(), "memory://");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let missing = Path::new("/definitely/not/here/cork.toml");
        assert!(resolve_config(Some(missing), &Overrides::default()).is_err());
    }
}
