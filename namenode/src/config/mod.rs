use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utilities::result::Result;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub node_id: String,
    pub num_datanodes: usize,
    pub replication_factor: usize,
    pub block_size: usize,
    pub heartbeat_interval_ms: u64,
    pub storage_root: String,
    pub log_level: String,
    pub log_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "namenode_0".to_string(),
            num_datanodes: 3,
            replication_factor: 2,
            block_size: 4,
            heartbeat_interval_ms: 5000,
            storage_root: "./temp/namenode/storage".to_string(),
            log_level: "info".to_string(),
            log_base: "./temp/namenode/logs".to_string(),
        }
    }
}

impl Config {
    /// a topology can become undersized later through kills and removals,
    /// but starting out oversubscribed is always a mistake
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err("block_size must be at least 1 byte".into());
        }
        if self.replication_factor == 0 {
            return Err("replication_factor must be at least 1".into());
        }
        if self.replication_factor > self.num_datanodes {
            return Err(format!(
                "replication_factor {} can't exceed num_datanodes {}",
                self.replication_factor, self.num_datanodes
            )
            .into());
        }
        Ok(())
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
    let config_file_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| format!("./namenode/config/{}.yaml", env));
    Figment::new()
        .merge(Serialized::default("default", Config::default()))
        .merge(Yaml::file(config_file_path))
        .extract()
        .unwrap()
});
