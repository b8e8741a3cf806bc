use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 可导出的记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Block,
    Transaction,
    Receipt,
    Log,
    TokenTransfer,
    Trace,
    Contract,
    Token,
    InternalTransaction,
}

impl EntityType {
    /// 流式管道可选的全部类型（receipt 不单独流式导出）
    pub const ALL_FOR_STREAMING: [EntityType; 8] = [
        EntityType::Block,
        EntityType::Transaction,
        EntityType::Log,
        EntityType::TokenTransfer,
        EntityType::Trace,
        EntityType::Contract,
        EntityType::Token,
        EntityType::InternalTransaction,
    ];

    /// 托管节点（无 trace/debug API）可支持的子集
    pub const ALL_FOR_INFURA: [EntityType; 4] = [
        EntityType::Block,
        EntityType::Transaction,
        EntityType::Log,
        EntityType::TokenTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Block => "block",
            EntityType::Transaction => "transaction",
            EntityType::Receipt => "receipt",
            EntityType::Log => "log",
            EntityType::TokenTransfer => "token_transfer",
            EntityType::Trace => "trace",
            EntityType::Contract => "contract",
            EntityType::Token => "token",
            EntityType::InternalTransaction => "internal_transaction",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "block" => Ok(EntityType::Block),
            "transaction" => Ok(EntityType::Transaction),
            "receipt" => Ok(EntityType::Receipt),
            "log" => Ok(EntityType::Log),
            "token_transfer" => Ok(EntityType::TokenTransfer),
            "trace" => Ok(EntityType::Trace),
            "contract" => Ok(EntityType::Contract),
            "token" => Ok(EntityType::Token),
            "internal_transaction" => Ok(EntityType::InternalTransaction),
            other => Err(format!("unknown entity type: {}", other)),
        }
    }
}
