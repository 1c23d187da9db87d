use getset::Getters;
use serde::Deserialize;

use super::telemetry::TelemetryConfig;

#[derive(Default, Deserialize, Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct UploadServerConfig {
    #[serde(default)]
    host: HostConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
}

#[derive(Deserialize, Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct HostConfig {
    #[serde(default = "HostConfig::default_address")]
    bind_address: String,
    #[serde(default = "HostConfig::default_port")]
    bind_port: u16,
    /// Upper bound of one multipart request, in bytes.
    #[serde(default = "HostConfig::default_max_chunk_bytes")]
    max_chunk_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_address: Self::default_address(),
            bind_port: Self::default_port(),
            max_chunk_bytes: Self::default_max_chunk_bytes(),
        }
    }
}

impl HostConfig {
    fn default_address() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_max_chunk_bytes() -> usize {
        100 * 1024 * 1024
    }
}

#[derive(Deserialize, Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct StorageConfig {
    /// Directory holding staging areas and artifacts.
    #[serde(default = "StorageConfig::default_root")]
    root: String,
    #[serde(default = "StorageConfig::default_merge_timeout_secs")]
    merge_timeout_secs: u64,
    /// Staging areas idle for longer are removed.
    #[serde(default = "StorageConfig::default_staging_ttl_secs")]
    staging_ttl_secs: u64,
    #[serde(default = "StorageConfig::default_sweep_interval_secs")]
    sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            merge_timeout_secs: Self::default_merge_timeout_secs(),
            staging_ttl_secs: Self::default_staging_ttl_secs(),
            sweep_interval_secs: Self::default_sweep_interval_secs(),
        }
    }
}

impl StorageConfig {
    fn default_root() -> String {
        "uploads".to_string()
    }

    fn default_merge_timeout_secs() -> u64 {
        10 * 60
    }

    fn default_staging_ttl_secs() -> u64 {
        24 * 60 * 60
    }

    fn default_sweep_interval_secs() -> u64 {
        60 * 60
    }
}

/// Layers `config.yaml`, yaml files named on the command line and `UPLOAD__*`
/// environment variables, later sources win.
pub fn build_config() -> anyhow::Result<config::Config> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = config::Config::builder().add_source(
        config::File::with_name("config")
            .required(false)
            .format(config::FileFormat::Yaml),
    );
    for arg in args {
        if arg.ends_with("yaml") || arg.ends_with("yml") {
            config = config.add_source(
                config::File::from(std::path::Path::new(arg.as_str()))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            );
        }
    }
    config = config.add_source(
        config::Environment::with_prefix("UPLOAD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(config.build()?)
}
