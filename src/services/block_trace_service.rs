use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::log_debug;
use crate::models::RawTrace;
use std::sync::Arc;

/// 单区块 trace 拉取
pub struct BlockTraceService {
    provider: Arc<dyn ProviderTrait>,
}

impl BlockTraceService {
    pub fn new(provider: Arc<dyn ProviderTrait>) -> Self {
        Self { provider }
    }

    /// 节点 result 为 null 时返回 `NodeResponseMissing`（配置/运维问题，不跳过）；
    /// 空数组是合法结果
    pub async fn fetch(&self, block_number: u64) -> Result<Vec<RawTrace>, AppError> {
        let traces = self
            .provider
            .trace_block_by_number(block_number)
            .await?
            .ok_or(AppError::NodeResponseMissing {
                block: block_number,
            })?;
        log_debug!("区块 {} 返回 trace {} 条", block_number, traces.len());
        Ok(traces)
    }
}
