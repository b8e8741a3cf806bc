use ethers_core::types::U256;

pub const TRACE_TYPE_CALL: &str = "call";
pub const TRACE_TYPE_GENESIS: &str = "genesis";
pub const TRACE_TYPE_DAOFORK: &str = "daofork";

/// 内部交易（子调用中的转账）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternalTransaction {
    pub block_number: u64,
    // 合成记录（genesis/daofork）没有交易哈希
    pub transaction_hash: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub value: U256,
    pub trace_type: String,
    pub error: Option<String>,
    // 区块内全部记录收集完成后才分配
    pub index: Option<u64>,
}

impl InternalTransaction {
    pub fn new(block_number: u64, trace_type: &str, value: U256) -> Self {
        Self {
            block_number,
            trace_type: trace_type.to_string(),
            value,
            ..Default::default()
        }
    }
}

/// 按最终输出顺序分配 index，从 0 开始
pub fn calculate_internal_transaction_indexes(internal_transactions: &mut [InternalTransaction]) {
    for (ind, internal_transaction) in internal_transactions.iter_mut().enumerate() {
        internal_transaction.index = Some(ind as u64);
    }
}
