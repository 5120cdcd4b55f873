//! Command-line arguments
//!
//! Flags override values from the environment and config file.

use std::path::PathBuf;

use clap::Parser;
use s3manager_domain::Config;

#[derive(Debug, Clone, Parser)]
#[command(name = "s3manager", version, about = "S3 Manager web server")]
pub struct Cli {
    /// Config file (TOML or JSON). Probes standard locations when omitted.
    #[arg(short, long, env = "S3MANAGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Sign in without an identity provider
    #[arg(long)]
    pub local_dev_mode: bool,

    /// Emit logs as JSON
    #[arg(long, env = "S3MANAGER_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Apply flag overrides to `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.local_dev_mode {
            config.server.local_dev_mode = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["s3manager", "--host", "127.0.0.1", "-p", "9000", "--local-dev-mode"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(config.server.local_dev_mode);
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::parse_from(["s3manager"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
