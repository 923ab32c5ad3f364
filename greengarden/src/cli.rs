//! Command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use greengarden_api::{ClientConfig, DEFAULT_BASE_URL, SERVER_ENV_VAR};
use greengarden_core::layout::DEFAULT_BUFFER;
use greengarden_core::LayoutMetrics;

/// Green Garden High Story: chat with Su Tang from your terminal.
#[derive(Parser, Debug)]
#[command(name = "greengarden", version, about)]
pub struct Args {
    /// Game server root URL.
    #[arg(long, env = SERVER_ENV_VAR, default_value = DEFAULT_BASE_URL)]
    pub server: String,

    /// Give up on a request after this many seconds. Waits forever if unset.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Rows kept free below the chat log.
    #[arg(long, default_value_t = DEFAULT_BUFFER)]
    pub buffer_rows: u16,

    /// Run as a line-oriented client on stdin/stdout instead of the TUI.
    #[arg(long)]
    pub headless: bool,

    /// Where log output goes. The TUI owns the terminal, so logs never go to stdout.
    #[arg(long, default_value = "greengarden.log")]
    pub log_file: PathBuf,

    /// Log filter override (e.g. debug, greengarden_core=trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.server.clone())
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
    }

    pub fn layout(&self) -> LayoutMetrics {
        LayoutMetrics {
            buffer: self.buffer_rows,
            ..LayoutMetrics::default()
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
