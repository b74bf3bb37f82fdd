use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scrapes current-affairs portals, rewrites each new article with a chat
/// model and stores the result.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true, env = "CA_DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run ingestion once for every source
    Run,

    /// Serve the HTTP API
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the stored articles for a date as JSON
    Articles {
        /// Date in dd/mm/yyyy form
        #[arg(short, long)]
        date: String,
    },

    /// Print how many articles are stored for a date
    Status {
        /// Date in dd/mm/yyyy form
        #[arg(short, long)]
        date: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_global_config() {
        let cli = Cli::parse_from(["ca-digest", "run", "--config", "/etc/ca-digest.toml"]);
        assert_eq!(cli.command, Command::Run);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ca-digest.toml")));
    }

    #[test]
    fn test_articles_date() {
        let cli = Cli::parse_from(["ca-digest", "articles", "-d", "02/06/2025"]);
        assert_eq!(
            cli.command,
            Command::Articles {
                date: "02/06/2025".to_string()
            }
        );
    }

    #[test]
    fn test_serve_bind_override() {
        let cli = Cli::parse_from(["ca-digest", "serve", "--bind", "0.0.0.0:8080"]);
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: Some("0.0.0.0:8080".to_string())
            }
        );
    }

    #[test]
    fn test_status_requires_date() {
        assert!(Cli::try_parse_from(["ca-digest", "status"]).is_err());
    }
}
