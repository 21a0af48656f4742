use crate::application::gateway::DEFAULT_THEME_COLOR;
use crate::application::poller::DEFAULT_POLL_INTERVAL;
use crate::error::{PaymentError, Result};
use crate::infrastructure::terminal_checkout::DEFAULT_CHECKOUT_SCRIPT_URL;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection and checkout settings, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Base URL of the registration API; every endpoint is resolved against it
    #[arg(long, env = "RACEPAY_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Public key of the payment gateway account
    #[arg(long, env = "RACEPAY_GATEWAY_KEY", hide_env_values = true)]
    pub gateway_key: Option<String>,

    /// Where the gateway's checkout script is served from
    #[arg(long, env = "RACEPAY_CHECKOUT_SCRIPT_URL", default_value = DEFAULT_CHECKOUT_SCRIPT_URL)]
    pub checkout_script_url: String,

    /// Delay between payment status checks, in milliseconds
    #[arg(long, env = "RACEPAY_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Per-request timeout for backend calls, in milliseconds
    #[arg(long, env = "RACEPAY_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Race categories open for registration
    #[arg(long, env = "RACEPAY_CATEGORIES", value_delimiter = ',', default_values = ["3k", "5k", "10k"])]
    pub categories: Vec<String>,

    /// Path to a persistent session cache. Needs the `session-rocksdb` feature.
    #[arg(long, env = "RACEPAY_SESSION_DB")]
    pub session_db: Option<PathBuf>,

    /// Accent colour of the checkout modal
    #[arg(long, default_value = DEFAULT_THEME_COLOR)]
    pub theme_color: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub gateway_key: Option<String>,
    pub checkout_script_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub categories: Vec<String>,
    pub session_db: Option<PathBuf>,
    pub theme_color: String,
}

impl Config {
    /// Validates the arguments.
    ///
    /// A missing gateway key is not an error here: it only matters once a
    /// checkout is about to open.
    pub fn load(args: ConfigArgs) -> Result<Self> {
        let api_base = args.api_base.trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(PaymentError::Config("API base URL is empty".to_string()));
        }

        let poll_interval = millis_or("poll interval", args.poll_interval_ms, DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(PaymentError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        let request_timeout = millis_or("request timeout", args.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT);

        let categories: Vec<String> = args
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if categories.is_empty() {
            return Err(PaymentError::Config(
                "at least one race category must be configured".to_string(),
            ));
        }

        let gateway_key = args
            .gateway_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if gateway_key.is_none() {
            warn!("RACEPAY_GATEWAY_KEY not set, checkout will be unavailable");
        }

        Ok(Self {
            api_base,
            gateway_key,
            checkout_script_url: args.checkout_script_url,
            poll_interval,
            request_timeout,
            categories,
            session_db: args.session_db,
            theme_color: args.theme_color,
        })
    }
}

fn millis_or(name: &str, value: Option<u64>, default: Duration) -> Duration {
    match value {
        Some(ms) => Duration::from_millis(ms),
        None => {
            info!("{name} not set, using default: {}ms", default.as_millis());
            default
        }
    }
}
