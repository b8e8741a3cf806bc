use crate::errors::error::AppError;
use crate::log_warn;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// 单元级重试策略：指数退避 + 0~10% 随机抖动，只重试 `is_retryable()` 的错误
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（0 = 只执行一次）
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// 第 `attempt` 次重试前的等待时间（attempt 从 1 开始）
    pub fn delay_for(&self, attempt: usize) -> Duration {
        // 指数最高限制在 2^10
        let exponent = attempt.saturating_sub(1).min(10) as u32;
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << exponent);

        // 抖动防止多个 worker 同一时间点“齐射”节点
        let jitter = rand::thread_rng().gen_range(0..=(delay_ms / 10 + 1));

        Duration::from_millis(delay_ms.saturating_add(jitter)).min(self.max_delay)
    }

    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    log_warn!(
                        "任务失败 (第 {}/{} 次重试)，等待 {:?}: {}",
                        attempt,
                        self.max_retries,
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(1_000));
        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(111));
        let third = policy.delay_for(3);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(441));
        assert_eq!(policy.delay_for(8), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn retries_transport_errors_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = fast_policy(3)
            .execute(|| {
                let c = counter.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        return Err(AppError::ProviderError("connection refused".into()));
                    }
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), AppError> = fast_policy(2)
            .execute(|| {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::ProviderError("timeout".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(AppError::ProviderError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn node_response_missing_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), AppError> = fast_policy(5)
            .execute(|| {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::NodeResponseMissing { block: 9 })
                }
            })
            .await;
        assert!(matches!(result, Err(AppError::NodeResponseMissing { block: 9 })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
