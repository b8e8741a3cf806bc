/// 主网 DAO 硬分叉区块
pub const DAOFORK_BLOCK_NUMBER: u64 = 1_920_000;

pub const GENESIS_BLOCK_NUMBER: u64 = 0;

pub const DEBUG_TRACE_BLOCK_BY_NUMBER: &str = "debug_traceBlockByNumber";

pub const CALL_TRACER: &str = "callTracer";
