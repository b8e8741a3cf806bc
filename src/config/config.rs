use crate::errors::error::AppError;
use crate::utils::validate_range;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub ethereum: EthereumConfig,
    pub export: ExportConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EthereumConfig {
    pub rpc_url: String,
    /// 逗号分隔，每个 key 对应连接池中的一个 provider；为空时直接使用 rpc_url
    #[serde(default)]
    pub api_keys: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// 导出任务参数（闭区间 [start_block, end_block]）
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub start_block: u64,
    pub end_block: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub include_genesis_traces: bool,
    #[serde(default)]
    pub include_daofork_traces: bool,
    /// "-" 为 stdout，否则为文件路径
    #[serde(default = "default_output")]
    pub output: String,
    pub genesis_alloc_path: Option<String>,
    pub daofork_state_changes_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 1,
            max_delay_secs: 60,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_workers() -> usize {
    5
}

fn default_output() -> String {
    "-".to_string()
}

impl Config {
    /// config/default → config/{APP_ENVIRONMENT} → 环境变量 APP__SECTION__KEY
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_range(self.export.start_block, self.export.end_block)?;
        if self.export.max_workers == 0 {
            return Err(AppError::Validation("max_workers 必须 >= 1".to_string()));
        }
        if self.export.include_genesis_traces && self.export.genesis_alloc_path.is_none() {
            return Err(AppError::Validation(
                "include_genesis_traces 已开启但未配置 genesis_alloc_path".to_string(),
            ));
        }
        if self.export.include_daofork_traces && self.export.daofork_state_changes_path.is_none() {
            return Err(AppError::Validation(
                "include_daofork_traces 已开启但未配置 daofork_state_changes_path".to_string(),
            ));
        }
        Ok(())
    }
}
