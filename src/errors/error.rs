use ethers_providers::ProviderError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum AppError {
    /// 区块范围非法（start_block > end_block），任何工作开始前就失败
    #[error("无效的区块范围: start_block={start} 大于 end_block={end}")]
    InvalidBlockRange { start: u64, end: u64 },

    /// 节点返回的 result 为空：节点未同步、未开启 tracing 或 debug API 被禁用
    #[error(
        "Response from the node is None for block {block}. Is the node fully synced? Is the node started with tracing enabled? Is debug_traceBlockByNumber enabled?"
    )]
    NodeResponseMissing { block: u64 },

    // 网络/RPC 层错误，执行器会按重试策略重试
    #[error("无效的provider: {0}")]
    ProviderError(String),

    #[error("Malformed trace: {0}")]
    MalformedTrace(String),

    #[error("导出错误: {0}")]
    Export(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Join error: {0}")]
    JoinError(#[from] JoinError),

    #[error("类型转换错误: {0}")]
    ConversionError(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("无效的地址: {0}")]
    InvalidAddress(String),

    /// 内部不可预期错误（兜底）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AppError {
    /// 只有传输层错误是暂时性的，其余错误（配置、数据）重试也不会成功
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ProviderError(_))
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}
