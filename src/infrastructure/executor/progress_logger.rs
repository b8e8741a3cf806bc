use crate::log_info;
use crate::utils::format::format_count;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

const LOG_PERCENTAGE_STEP: u64 = 10;

/// 进度日志：每跨过 10% 打一行
pub struct ProgressLogger {
    name: String,
    total_items: u64,
    processed: AtomicU64,
    last_logged_step: AtomicU64,
    started_at: Instant,
}

impl ProgressLogger {
    pub fn new(name: &str, total_items: u64) -> Self {
        Self {
            name: name.to_string(),
            total_items,
            processed: AtomicU64::new(0),
            last_logged_step: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn start(&self) {
        log_info!(
            "开始 {}，共 {} 项",
            self.name,
            format_count(self.total_items)
        );
    }

    /// 返回累计已处理数量
    pub fn track(&self, item_count: u64) -> u64 {
        let processed = self.processed.fetch_add(item_count, Ordering::SeqCst) + item_count;
        if self.total_items == 0 {
            return processed;
        }

        let percentage = processed.saturating_mul(100) / self.total_items;
        let step = percentage / LOG_PERCENTAGE_STEP;
        let previous = self.last_logged_step.fetch_max(step, Ordering::SeqCst);
        if step > previous {
            log_info!(
                "{}: 已处理 {} 项，进度 {}%",
                self.name,
                format_count(processed),
                percentage
            );
        }
        processed
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        log_info!(
            "{} 完成：共处理 {} 项，耗时 {:?}",
            self.name,
            format_count(self.processed()),
            self.started_at.elapsed()
        );
    }
}
