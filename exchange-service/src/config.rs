//! Bootstrap configuration, read from environment variables with documented
//! defaults. Spec.md excludes configuration *sourcing* from the engine
//! itself; this struct is the bootstrap binary's own minimal surface for it,
//! a plain struct rather than a config-loading crate.

use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the trade log file.
    pub data_dir: String,
    /// File name of the trade log, relative to `data_dir`.
    pub trade_log_file: String,
    /// Seeds `reference_price` before any trade has occurred (see
    /// DESIGN.md's "initial reference price" open-question decision).
    pub bootstrap_reference_price: i64,
    /// Address the Axum HTTP surface binds to.
    pub bind_addr: SocketAddr,
    /// Multicast group the Threshold Notifier publishes to.
    pub multicast_group: SocketAddr,
    /// Local interface used to join the multicast group; `UNSPECIFIED`
    /// lets the OS pick.
    pub multicast_interface: std::net::Ipv4Addr,
}

impl Config {
    /// Reads every field from its environment variable, falling back to the
    /// documented default and logging which source was used.
    pub fn from_env() -> Self {
        let data_dir = env_or("EXCHANGE_DATA_DIR", "./data");
        let trade_log_file = env_or("EXCHANGE_TRADE_LOG_FILE", "StoricoOrdini.json");
        let bootstrap_reference_price = env_or("EXCHANGE_BOOTSTRAP_REFERENCE_PRICE", "58000000")
            .parse()
            .expect("EXCHANGE_BOOTSTRAP_REFERENCE_PRICE must be an integer number of millis");
        let bind_addr = env_or("EXCHANGE_BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .expect("EXCHANGE_BIND_ADDR must be a host:port address");
        let multicast_group = env_or("EXCHANGE_MULTICAST_GROUP", "239.1.1.1:9100")
            .parse()
            .expect("EXCHANGE_MULTICAST_GROUP must be a host:port address");
        let multicast_interface = env_or("EXCHANGE_MULTICAST_INTERFACE", "0.0.0.0")
            .parse()
            .expect("EXCHANGE_MULTICAST_INTERFACE must be an IPv4 address");

        Self {
            data_dir,
            trade_log_file,
            bootstrap_reference_price,
            bind_addr,
            multicast_group,
            multicast_interface,
        }
    }

    pub fn trade_log_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.trade_log_file)
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) => v,
        Err(_) => {
            tracing::debug!(key, default, "using default config value");
            default.to_string()
        }
    }
}
