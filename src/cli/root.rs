use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use tracing::debug;

use super::ask::AskCommand;
use crate::config::Config;
use crate::server;

/// Interview assistant - practice answers, organised into sessions
#[derive(Parser)]
#[command(
    name = "interview-assistant",
    version,
    about = "Generate interview answers and keep them in named sessions",
    long_about = r#"Serves a small JSON API that answers interview questions with a language model
and records each question/answer pair in the caller's active session.

Examples:
  interview-assistant                          # Serve on 0.0.0.0:5000
  interview-assistant serve --port 8080        # Serve on another port
  interview-assistant ask "Why this company?"  # Answer a single question"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long = "database-url", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeCommand),
    /// Answer a single question non-interactively
    Ask(AskCommand),
}

#[derive(Args, Default)]
pub struct ServeCommand {
    /// Address to listen on (overrides INTERVIEW_HOST)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides INTERVIEW_PORT)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let mut config = Config::init()?;
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        debug!("Configuration initialized: {:?}", config);

        match self.command.unwrap_or_else(|| Commands::Serve(ServeCommand::default())) {
            Commands::Serve(serve) => {
                if let Some(host) = serve.host {
                    config.host = host;
                }
                if let Some(port) = serve.port {
                    config.port = port;
                }
                server::serve(&config).await
            }
            Commands::Ask(ask) => ask.execute(&config).await,
        }
    }
}
