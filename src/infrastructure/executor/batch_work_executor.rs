use super::{ProgressLogger, RetryPolicy};
use crate::errors::error::AppError;
use crate::{log_error, log_info};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// 有界并发的批量执行器。
///
/// 把 items 切成大小为 `batch_size` 的工作单元，最多 `max_workers` 个单元同时运行；
/// 单元失败时按 `RetryPolicy` 重试，重试耗尽或遇到不可重试错误后停止提交新单元，
/// 等已派发的单元结束，再把第一个错误返回给调用方（fail-fast）。
pub struct BatchWorkExecutor {
    batch_size: usize,
    max_workers: usize,
    retry_policy: RetryPolicy,
}

impl BatchWorkExecutor {
    pub fn new(batch_size: usize, max_workers: usize, retry_policy: RetryPolicy) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_workers: max_workers.max(1),
            retry_policy,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub async fn execute<T, I, F, Fut>(
        &self,
        items: I,
        work: F,
        total_items: u64,
    ) -> Result<(), AppError>
    where
        T: Clone + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let work = Arc::new(work);
        let progress = Arc::new(ProgressLogger::new("batch work", total_items));
        progress.start();

        let mut tasks: JoinSet<Result<(), AppError>> = JoinSet::new();
        let mut failure: Option<AppError> = None;
        let mut items = items.into_iter();

        'submit: loop {
            let batch: Vec<T> = items.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }

            // 等待空闲 worker
            while tasks.len() >= self.max_workers {
                if let Some(joined) = tasks.join_next().await {
                    if let Err(e) = flatten_join(joined) {
                        failure = Some(e);
                        break 'submit;
                    }
                }
            }

            let work = work.clone();
            let retry_policy = self.retry_policy.clone();
            let progress = progress.clone();
            tasks.spawn(async move {
                let item_count = batch.len() as u64;
                retry_policy.execute(|| (*work)(batch.clone())).await?;
                progress.track(item_count);
                Ok(())
            });
        }

        if failure.is_some() {
            log_info!("停止提交新任务，等待 {} 个已派发任务结束", tasks.len());
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = flatten_join(joined) {
                match failure {
                    None => failure = Some(e),
                    Some(_) => log_error!("已派发任务失败: {}", e),
                }
            }
        }

        match failure {
            Some(e) => {
                log_error!(
                    "批量任务失败，已处理 {} 项: {}",
                    progress.processed(),
                    e
                );
                Err(e)
            }
            None => {
                progress.finish();
                Ok(())
            }
        }
    }
}

fn flatten_join(joined: Result<Result<(), AppError>, JoinError>) -> Result<(), AppError> {
    joined.map_err(AppError::from)?
}
