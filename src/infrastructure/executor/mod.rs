mod batch_work_executor;
mod progress_logger;
mod retry_policy;

pub use batch_work_executor::BatchWorkExecutor;
pub use progress_logger::ProgressLogger;
pub use retry_policy::RetryPolicy;
