//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::ProjectDirs;

use crate::session::SessionIntervals;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "booking-timer")]
#[command(about = "Durable service-duration timer reconciled against booking status")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Base URL of the booking REST API
    #[arg(long, default_value = "http://127.0.0.1:8000/api")]
    pub api_url: String,

    /// Bearer token sent with booking API requests
    #[arg(long)]
    pub api_token: Option<String>,

    /// Booking API request timeout in seconds
    #[arg(long, default_value = "10")]
    pub request_timeout: u64,

    /// Directory holding persisted timer records
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Countdown tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Booking status poll interval in seconds
    #[arg(long, default_value = "15")]
    pub poll_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn intervals(&self) -> SessionIntervals {
        SessionIntervals {
            tick: Duration::from_millis(self.tick_ms.max(1)),
            poll: Duration::from_secs(self.poll_secs.max(1)),
        }
    }

    /// Location of the timer record file, defaulting to the platform data directory
    pub fn store_path(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("com", "booking-timer", "booking-timer")
                .ok_or_else(|| anyhow!("Failed to get project directories"))?
                .data_dir()
                .to_path_buf(),
        };
        Ok(dir.join("timers.json"))
    }
}
