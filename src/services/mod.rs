pub mod block_trace_service;
pub mod export_job;
pub mod special_trace_service;

pub use block_trace_service::BlockTraceService;
pub use export_job::ExportInternalTransactionsJob;
pub use special_trace_service::{FileSpecialTraceSource, SpecialTraceRegistry};
