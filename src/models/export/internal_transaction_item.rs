use crate::models::domain::{EntityType, InternalTransaction};
use crate::utils::format::u256_to_bigdecimal;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 交给导出器的唯一输出形态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalTransactionItem {
    #[serde(rename = "type")]
    pub item_type: EntityType,
    pub block_number: u64,
    pub transaction_hash: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub value: BigDecimal,
    pub index: Option<u64>,
}

impl From<&InternalTransaction> for InternalTransactionItem {
    fn from(internal_transaction: &InternalTransaction) -> Self {
        Self {
            item_type: EntityType::InternalTransaction,
            block_number: internal_transaction.block_number,
            transaction_hash: internal_transaction.transaction_hash.clone(),
            from_address: internal_transaction.from_address.clone(),
            to_address: internal_transaction.to_address.clone(),
            value: u256_to_bigdecimal(internal_transaction.value),
            index: internal_transaction.index,
        }
    }
}
