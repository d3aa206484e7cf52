use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::session::CreateForm;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scorecard-chat")]
#[command(version)]
#[command(about = "Build a hiring scorecard by chatting with the WhoaAI assistant")]
pub struct Args {
    /// Job title; becomes the scorecard name and guides the conversation
    #[arg(long, short = 'j')]
    pub job_title: String,

    /// Continue an existing conversation by thread ID
    #[arg(long, short = 't')]
    pub thread_id: Option<String>,

    /// Bearer token for protected endpoints
    #[arg(long, env = "SCORECARD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// WebSocket endpoint (overrides WEBSOCKET_URL and the config file)
    #[arg(long)]
    pub ws_url: Option<String>,

    /// REST API base URL (overrides API_BASE_URL and the config file)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Seconds to wait for the connection and for each reply frame
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to a TOML config file (defaults to ./scorecard-chat.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, mut config: ClientConfig) -> Result<ClientConfig, ConfigError> {
        if let Some(url) = &self.ws_url {
            config.ws_url = url.clone();
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.exchange_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn create_form(&self) -> CreateForm {
        CreateForm {
            job_title: self.job_title.clone(),
            thread_id: self.thread_id.clone(),
            auth_token: self.token.clone(),
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "scorecard_chat=info,warn",
            _ => "scorecard_chat=debug,info",
        }
    }
}
