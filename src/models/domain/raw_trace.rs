use crate::errors::error::AppError;
use crate::utils::{quantity_to_u256, quantity_to_u64};
use ethers_core::types::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 节点返回的数值字段：quantity 字符串或 JSON 数字。
///
/// 负数、小数、布尔等无法表示为无符号整数的值落入 `Other`，由调用方决定丢弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceValue {
    Number(u64),
    Quantity(String),
    Other(Value),
}

impl TraceValue {
    pub fn to_u256(&self) -> Result<U256, AppError> {
        match self {
            TraceValue::Number(n) => Ok(U256::from(*n)),
            TraceValue::Quantity(s) => quantity_to_u256(s),
            TraceValue::Other(v) => Err(AppError::MalformedTrace(format!("非整数数值: {}", v))),
        }
    }

    pub fn to_u64(&self) -> Result<u64, AppError> {
        match self {
            TraceValue::Number(n) => Ok(*n),
            TraceValue::Quantity(s) => quantity_to_u64(s),
            TraceValue::Other(v) => Err(AppError::MalformedTrace(format!("非整数数值: {}", v))),
        }
    }
}

// 字段形态不对时当作缺失，不让单条 trace 拖垮整个区块的解码
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_calls<'de, D>(deserializer: D) -> Result<Vec<RawTrace>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = lenient::<D, Vec<Value>>(deserializer)?.unwrap_or_default();
    Ok(values.into_iter().map(RawTrace::from).collect())
}

/// `debug_traceBlockByNumber` 返回的单条 trace，在 RPC 边界一次性解码。
///
/// 兼容两种形态：
/// - 扁平 trace 对象（`type`/`value`/`transactionHash`/`action`/`result`）
/// - callTracer 信封 `{txHash, result: <call frame>}`，frame 内通过 `calls` 嵌套子调用
///
/// parity 风格的 `result`（gasUsed/output）没有 frame 字段，解码成空 frame 且不会被展开。
///
/// 除 `value` 外的字段类型不符时按缺失处理；非对象元素解码为空 trace，由解析器计入跳过数。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    #[serde(rename = "type", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub trace_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TraceValue>,
    #[serde(rename = "blockNumber", default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<TraceValue>,
    #[serde(rename = "transactionHash", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(rename = "txHash", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub action: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawTrace>>,
    #[serde(default, deserialize_with = "lenient_calls", skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<RawTrace>,
}

impl From<Value> for RawTrace {
    fn from(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

impl RawTrace {
    /// 小写的 trace 类型（geth 返回 "CALL"）
    pub fn kind(&self) -> Option<String> {
        self.trace_type.as_ref().map(|t| t.trim().to_lowercase())
    }

    /// 先序展开整棵调用树；子调用继承所属交易哈希
    pub fn into_frames(self) -> Vec<RawTrace> {
        let mut frames = Vec::new();
        self.flatten_into(None, &mut frames);
        frames
    }

    fn flatten_into(mut self, parent_tx_hash: Option<&str>, frames: &mut Vec<RawTrace>) {
        if self.trace_type.is_none() {
            if let Some(inner) = self.result.take() {
                if inner.trace_type.is_some() {
                    let mut frame = *inner;
                    if frame.transaction_hash.is_none() {
                        frame.transaction_hash = self
                            .tx_hash
                            .or(self.transaction_hash)
                            .or_else(|| parent_tx_hash.map(str::to_string));
                    }
                    frame.flatten_into(parent_tx_hash, frames);
                    return;
                }
                self.result = Some(inner);
            }
        }

        if self.transaction_hash.is_none() {
            self.transaction_hash = self
                .tx_hash
                .clone()
                .or_else(|| parent_tx_hash.map(str::to_string));
        }

        let calls = std::mem::take(&mut self.calls);
        let tx_hash = self.transaction_hash.clone();
        frames.push(self);
        for call in calls {
            call.flatten_into(tx_hash.as_deref(), frames);
        }
    }
}
