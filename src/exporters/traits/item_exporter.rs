use crate::errors::error::AppError;
use crate::models::InternalTransactionItem;
use async_trait::async_trait;

/// 导出目标（sink）。`export_item` 会被多个 worker 并发调用，实现方自行保证安全。
#[async_trait]
pub trait ItemExporter: Send + Sync {
    /// 幂等：重复调用不会重新获取资源
    async fn open(&self) -> Result<(), AppError>;
    async fn export_item(&self, item: &InternalTransactionItem) -> Result<(), AppError>;
    async fn close(&self) -> Result<(), AppError>;
}
