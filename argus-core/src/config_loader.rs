use std::env;

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Load configuration from `$CONFIG_DIR/$RUN_MODE.yaml` (defaults: `.`,
/// `dev`) with `ARGUS_*` environment variables layered on top.
pub fn load<T: DeserializeOwned>() -> T {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "dev".into());
    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| ".".into());
    load_from(&config_dir, &run_mode)
}

pub fn load_from<T: DeserializeOwned>(config_dir: &str, run_mode: &str) -> T {
    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
        .add_source(Environment::with_prefix("ARGUS").separator("__"))
        .build()
        .expect("Failed to build configuration");

    debug!("Loading configuration from: {}", config_dir);

    match config.try_deserialize::<T>() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {:?}", e);
            panic!("Failed to load configuration.");
        }
    }
}
