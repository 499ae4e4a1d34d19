// Configuration module entry point
// Layers an optional config file and RESTMUX_* environment variables over defaults

mod types;

use std::net::SocketAddr;
use std::time::Duration;

use crate::mux::MuxOptions;

// Re-export public types
pub use types::{Config, DemoConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Prefix of environment overrides, e.g. `RESTMUX_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "RESTMUX";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.json", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "restmux")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.if_range", "evaluate")?
            .set_default("demo.people", 100)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Dispatch options derived from the `http` section
    pub fn mux_options(&self) -> MuxOptions {
        MuxOptions {
            if_range: self.http.if_range,
            server_name: self.http.server_name.clone(),
        }
    }
}

impl PerformanceConfig {
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout)
    }

    pub const fn read(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub const fn write(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }
}
