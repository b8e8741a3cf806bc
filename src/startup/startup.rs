use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::error::AppError;
use crate::exporters::{ExportTarget, ItemExporter, JsonLinesExporter};
use crate::infrastructure::executor::RetryPolicy;
use crate::infrastructure::provider::{EthereumProvider, ProviderTrait};
use crate::log_info;
use crate::services::{
    BlockTraceService, ExportInternalTransactionsJob, FileSpecialTraceSource, SpecialTraceRegistry,
};

/// 应用程序启动与管理结构体（一次性批量导出任务）
pub struct Application {
    pub job: ExportInternalTransactionsJob,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl Application {
    /// 构建应用实例（初始化 provider/导出器/特殊 trace，不执行导出）
    pub fn build(config: Config) -> Result<Self> {
        config.validate()?;
        let export = &config.export;

        // 1. 先初始化 Provider
        let provider = Arc::new(EthereumProvider::new(&config.ethereum)?) as Arc<dyn ProviderTrait>;

        // 2. 特殊 trace 只在开启时加载数据文件
        let genesis_path = export
            .genesis_alloc_path
            .as_deref()
            .filter(|_| export.include_genesis_traces)
            .map(Path::new);
        let daofork_path = export
            .daofork_state_changes_path
            .as_deref()
            .filter(|_| export.include_daofork_traces)
            .map(Path::new);
        let special_source = Arc::new(FileSpecialTraceSource::load(genesis_path, daofork_path)?);
        let special_traces = SpecialTraceRegistry::from_flags(
            special_source,
            export.include_genesis_traces,
            export.include_daofork_traces,
        );

        // 3. 导出器
        let exporter = Arc::new(JsonLinesExporter::new(ExportTarget::from_output(&export.output)))
            as Arc<dyn ItemExporter>;

        let retry_policy = RetryPolicy::new(
            config.retry.max_retries,
            config.retry.base_delay(),
            config.retry.max_delay(),
        );

        let job = ExportInternalTransactionsJob::new(
            export.start_block,
            export.end_block,
            BlockTraceService::new(provider),
            exporter,
            special_traces,
            export.max_workers,
            retry_policy,
        )?;

        log_info!(
            "导出任务构建完成: 区块 {} → {} | genesis={} daofork={} | 输出 {}",
            export.start_block,
            export.end_block,
            export.include_genesis_traces,
            export.include_daofork_traces,
            export.output
        );
        Ok(Self { job })
    }

    /// 执行导出，失败时导出器已在任务内部关闭
    pub async fn run(self) -> anyhow::Result<()> {
        self.job.run().await?;
        Ok(())
    }
}
