// Command-line and environment configuration.
use crate::ftt_models::{FTTError, FTTModels, Result};
use crate::ftt_regions::Region;
use crate::ftt_state::Viewport;
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ftt", version, about = "Live map of Finnish trains from the Digitraffic feed")]
pub struct Args {
    /// Train location feed to poll
    #[arg(long, env = "FTT_FEED_URL", default_value = FTTModels::FEED_URL)]
    pub feed_url: String,

    /// Seconds between feed ticks
    #[arg(long, default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub request_timeout_secs: u64,

    /// Initial region filter, e.g. "Uusimaa" or "central-finland"
    #[arg(long, default_value = "All")]
    pub region: String,

    /// Hide map markers outside the selected region
    #[arg(long)]
    pub filter_map_by_region: bool,

    /// Print the train list to the terminal instead of opening a window
    #[arg(long)]
    pub console: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FTTConfig {
    pub feed_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub region: Region,
    pub viewport: Viewport,
    pub filter_map_by_region: bool,
    pub console: bool,
}

impl Default for FTTConfig {
    fn default() -> Self {
        FTTConfig {
            feed_url: FTTModels::FEED_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            region: Region::All,
            viewport: Viewport::default(),
            filter_map_by_region: false,
            console: false,
        }
    }
}

impl FTTConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        if args.feed_url.trim().is_empty() {
            return Err(FTTError::ConfigError("feed URL must not be empty".to_string()));
        }
        if args.poll_interval_secs == 0 {
            return Err(FTTError::ConfigError("poll interval must be at least 1 second".to_string()));
        }
        if args.request_timeout_secs == 0 {
            return Err(FTTError::ConfigError("request timeout must be at least 1 second".to_string()));
        }

        Ok(FTTConfig {
            feed_url: args.feed_url.trim().to_string(),
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            region: args.region.parse()?,
            viewport: Viewport::default(),
            filter_map_by_region: args.filter_map_by_region,
            console: args.console,
        })
    }
}
