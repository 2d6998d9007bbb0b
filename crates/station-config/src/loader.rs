use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::StationConfig;

/// 环境变量前缀，例如 `STATION__DEVICE__PASSWORD`
pub const ENV_PREFIX: &str = "STATION";

/// 配置加载器
pub struct ConfigLoader {
    config_path: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// 使用其他环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 加载配置：TOML 文件（可选）叠加环境变量
    pub fn load(&self) -> Result<StationConfig> {
        let mut builder = Config::builder();

        if self.config_path.exists() {
            builder = builder.add_source(File::new(
                self.config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并验证
    pub fn load_validated(&self) -> Result<StationConfig> {
        let config = self.load()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(config: &StationConfig) -> Result<()> {
        if config.device.ip.trim().is_empty() {
            return Err(anyhow!("device.ip must not be empty"));
        }

        if config.device.password.is_empty() {
            return Err(anyhow!("device.password must not be empty"));
        }

        if config.device.timeout_secs == 0 {
            return Err(anyhow!("device.timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}
