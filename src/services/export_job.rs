use crate::errors::error::AppError;
use crate::exporters::ItemExporter;
use crate::infrastructure::executor::{BatchWorkExecutor, RetryPolicy};
use crate::infrastructure::parser::TraceParser;
use crate::models::InternalTransactionItem;
use crate::models::domain::internal_transaction::calculate_internal_transaction_indexes;
use crate::services::block_trace_service::BlockTraceService;
use crate::services::special_trace_service::SpecialTraceRegistry;
use crate::utils::validate_range;
use crate::{log_debug, log_error, log_info};
use std::sync::{Arc, Mutex};

/// trace RPC 按区块调用，单元大小固定为 1
const BLOCKS_PER_UNIT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Opened,
    Running,
    Completed,
    Failed,
    Closed,
}

/// 单个区块单元的处理上下文，由所有 worker 共享（只读 + 导出器自身的并发约定）
struct BlockExportContext {
    fetcher: BlockTraceService,
    parser: TraceParser,
    special_traces: SpecialTraceRegistry,
    exporter: Arc<dyn ItemExporter>,
}

impl BlockExportContext {
    async fn export_batch(&self, block_number_batch: Vec<u64>) -> Result<(), AppError> {
        for block_number in block_number_batch {
            self.export_block(block_number).await?;
        }
        Ok(())
    }

    /// 特殊 trace 在前，节点 trace 在后；index 在整块收集完成后分配
    async fn export_block(&self, block_number: u64) -> Result<usize, AppError> {
        log_debug!("Exporting internal transactions for block_number={}", block_number);

        let mut internal_transactions = self.special_traces.traces_for(block_number);
        let special_count = internal_transactions.len();

        let raw_traces = self.fetcher.fetch(block_number).await?;
        let (traces, skipped_count) = self.parser.parse_block_traces(raw_traces, block_number)?;
        internal_transactions.extend(traces);

        calculate_internal_transaction_indexes(&mut internal_transactions);

        for internal_transaction in &internal_transactions {
            self.exporter
                .export_item(&InternalTransactionItem::from(internal_transaction))
                .await?;
        }

        log_info!(
            "区块 {} 导出内部交易 {} 笔（特殊 {} 笔），跳过 trace {} 条",
            block_number,
            internal_transactions.len(),
            special_count,
            skipped_count
        );
        Ok(internal_transactions.len())
    }
}

/// 导出 [start_block, end_block] 的内部交易。
///
/// 状态流转：`Idle -> Opened -> Running -> (Completed | Failed) -> Closed`，
/// 导出器只在 open 和 close 时获取/释放资源，失败路径也保证 close 恰好一次。
/// 不同区块之间的输出顺序不保证（并发 > 1 时），同一区块内按 index 递增。
pub struct ExportInternalTransactionsJob {
    start_block: u64,
    end_block: u64,
    executor: BatchWorkExecutor,
    context: Arc<BlockExportContext>,
    state: Mutex<JobState>,
}

impl ExportInternalTransactionsJob {
    pub fn new(
        start_block: u64,
        end_block: u64,
        fetcher: BlockTraceService,
        exporter: Arc<dyn ItemExporter>,
        special_traces: SpecialTraceRegistry,
        max_workers: usize,
        retry_policy: RetryPolicy,
    ) -> Result<Self, AppError> {
        validate_range(start_block, end_block)?;

        Ok(Self {
            start_block,
            end_block,
            executor: BatchWorkExecutor::new(BLOCKS_PER_UNIT, max_workers, retry_policy),
            context: Arc::new(BlockExportContext {
                fetcher,
                parser: TraceParser::new(),
                special_traces,
                exporter,
            }),
            state: Mutex::new(JobState::Idle),
        })
    }

    pub fn state(&self) -> JobState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(JobState::Failed)
    }

    fn transition(&self, next: JobState) {
        if let Ok(mut state) = self.state.lock() {
            log_debug!("导出任务状态 {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        if self.state() != JobState::Idle {
            return Err(AppError::Internal(format!(
                "导出任务只能运行一次，当前状态 {:?}",
                self.state()
            )));
        }

        log_info!(
            "开始导出内部交易: 区块 {} → {}，worker {} 个",
            self.start_block,
            self.end_block,
            self.executor.max_workers()
        );

        let exporter = self.context.exporter.clone();
        let result = match exporter.open().await {
            Ok(()) => {
                self.transition(JobState::Opened);
                self.transition(JobState::Running);
                let result = self.export().await;
                self.transition(if result.is_ok() {
                    JobState::Completed
                } else {
                    JobState::Failed
                });
                result
            }
            Err(e) => {
                self.transition(JobState::Failed);
                Err(e)
            }
        };

        let closed = exporter.close().await;
        self.transition(JobState::Closed);

        match (result, closed) {
            (Err(e), Err(close_err)) => {
                log_error!("导出失败后关闭导出器也失败: {}", close_err);
                Err(e)
            }
            (Err(e), Ok(())) => {
                log_error!("导出内部交易失败: {}", e);
                Err(e)
            }
            (Ok(()), closed) => {
                if closed.is_ok() {
                    log_info!("内部交易导出完成: 区块 {} → {}", self.start_block, self.end_block);
                }
                closed
            }
        }
    }

    async fn export(&self) -> Result<(), AppError> {
        let context = self.context.clone();
        let total_items = (self.end_block - self.start_block).saturating_add(1);
        self.executor
            .execute(
                self.start_block..=self.end_block,
                move |block_number_batch: Vec<u64>| {
                    let context = context.clone();
                    async move { context.export_batch(block_number_batch).await }
                },
                total_items,
            )
            .await
    }
}
