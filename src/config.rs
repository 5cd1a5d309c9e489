use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Settings for `serve`. Each flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[arg(long, env = "ROI_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "ROI_PORT", default_value_t = 3000)]
    pub port: u16,
    #[arg(
        long,
        env = "ROI_DATA_FILE",
        help = "JSON document holding saved scenarios; in-memory when omitted"
    )]
    pub data_file: Option<PathBuf>,
    #[arg(
        long,
        env = "ROI_STORE_TIMEOUT_MS",
        default_value_t = 5000,
        help = "Upper bound for a single scenario store call"
    )]
    pub store_timeout_ms: u64,
    #[arg(long, env = "ROI_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,
}

impl ServeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("--port must be > 0".to_string());
        }
        if self.store_timeout_ms == 0 {
            return Err("--store-timeout-ms must be > 0".to_string());
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
