use crate::errors::error::AppError;
use crate::log_debug;
use crate::models::InternalTransaction;
use crate::models::RawTrace;
use crate::models::domain::internal_transaction::TRACE_TYPE_CALL;
use crate::models::domain::TraceValue;

/// trace → 内部交易的映射，无副作用
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceParser;

impl TraceParser {
    pub fn new() -> Self {
        Self
    }

    /// 只保留 value > 0 的 call；其他类型（create/selfdestruct/零值调用）返回 None。
    ///
    /// value 是负数、小数或非标量时同样返回 None；quantity 字符串无法解码时返回
    /// `MalformedTrace`，由调用方让整个区块单元失败。
    pub fn parse_internal_transaction(
        &self,
        raw_trace: &RawTrace,
    ) -> Result<Option<InternalTransaction>, AppError> {
        if raw_trace.kind().as_deref() != Some(TRACE_TYPE_CALL) {
            return Ok(None);
        }

        let value = match &raw_trace.value {
            None | Some(TraceValue::Other(_)) => return Ok(None),
            Some(value) => value.to_u256()?,
        };
        if value.is_zero() {
            return Ok(None);
        }

        // blockNumber 不可靠，调用方会用请求的区块号覆盖
        let block_number = raw_trace
            .block_number
            .as_ref()
            .and_then(|b| b.to_u64().ok())
            .unwrap_or_default();

        let mut internal_transaction = InternalTransaction::new(block_number, TRACE_TYPE_CALL, value);
        internal_transaction.transaction_hash = raw_trace.transaction_hash.clone();
        if let Some(error) = raw_trace.error.as_ref().filter(|e| !e.is_empty()) {
            internal_transaction.error = Some(error.clone());
        }

        Ok(Some(internal_transaction))
    }

    /// 解析单个区块的全部 trace：展开调用树，过滤，写入请求的区块号。
    ///
    /// 返回 (内部交易, 跳过的 trace 数)
    pub fn parse_block_traces(
        &self,
        raw_traces: Vec<RawTrace>,
        block_number: u64,
    ) -> Result<(Vec<InternalTransaction>, usize), AppError> {
        let mut internal_transactions = Vec::new();
        let mut skipped_count = 0;

        for frame in raw_traces.into_iter().flat_map(RawTrace::into_frames) {
            match self.parse_internal_transaction(&frame)? {
                Some(mut internal_transaction) => {
                    internal_transaction.block_number = block_number;
                    internal_transactions.push(internal_transaction);
                }
                None => skipped_count += 1,
            }
        }

        log_debug!(
            "区块 {} 解析出内部交易 {} 笔，跳过 trace {} 条",
            block_number,
            internal_transactions.len(),
            skipped_count
        );
        Ok((internal_transactions, skipped_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::U256;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawTrace {
        serde_json::from_value(value).unwrap()
    }

    fn parse(value: Value) -> Option<InternalTransaction> {
        TraceParser::new().parse_internal_transaction(&raw(value)).unwrap()
    }

    #[test]
    fn positive_call_is_retained_with_decoded_value() {
        let tx = parse(json!({"type": "call", "value": "0x5"})).unwrap();
        assert_eq!(tx.value, U256::from(5));
        assert_eq!(tx.trace_type, "call");
        assert_eq!(tx.index, None);
    }

    #[test]
    fn zero_value_call_is_dropped() {
        assert!(parse(json!({"type": "call", "value": "0x0"})).is_none());
        assert!(parse(json!({"type": "call", "value": 0})).is_none());
        assert!(parse(json!({"type": "call"})).is_none());
    }

    #[test]
    fn non_call_kinds_are_dropped_regardless_of_value() {
        for kind in ["create", "create2", "suicide", "selfdestruct", "delegatecall", "staticcall", "reward"] {
            assert!(parse(json!({"type": kind, "value": "0xde0b6b3a7640000"})).is_none(), "{kind}");
        }
        assert!(parse(json!({"value": "0x5"})).is_none());
    }

    #[test]
    fn non_call_with_garbage_value_is_dropped_not_failed() {
        assert!(parse(json!({"type": "create", "value": "0xnothex"})).is_none());
    }

    #[test]
    fn malformed_call_value_is_an_error() {
        let err = TraceParser::new()
            .parse_internal_transaction(&raw(json!({"type": "call", "value": "0xnothex"})))
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedTrace(_)));
    }

    #[test]
    fn unusable_values_are_dropped_not_failed() {
        for value in [json!(-1), json!(-0.5), json!(1.5), json!(true), json!({"wei": 5})] {
            assert!(parse(json!({"type": "call", "value": value.clone()})).is_none(), "{value}");
            assert!(parse(json!({"type": "create", "value": value.clone()})).is_none(), "{value}");
        }
        assert!(parse(json!({"type": 7, "value": "0x5"})).is_none());
    }

    #[test]
    fn odd_sibling_does_not_lose_the_rest_of_the_block() {
        let traces: Vec<RawTrace> = vec![
            json!({"type": "create", "value": -1}),
            json!({"type": "call", "value": -1}),
            json!({"type": "create", "value": 1.5}),
            json!({"type": 7, "value": "0x9"}),
            json!("garbage"),
            json!({"type": "call", "value": "0x5", "transactionHash": "0xabc"}),
        ]
        .into_iter()
        .map(RawTrace::from)
        .collect();

        let (txs, skipped) = TraceParser::new().parse_block_traces(traces, 42).unwrap();
        assert_eq!(skipped, 5);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].value, U256::from(5));
        assert_eq!(txs[0].block_number, 42);
        assert_eq!(txs[0].transaction_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn geth_uppercase_call_is_retained() {
        let tx = parse(json!({"type": "CALL", "value": "0x10"})).unwrap();
        assert_eq!(tx.value, U256::from(16));
    }

    #[test]
    fn copies_hash_and_non_empty_error() {
        let tx = parse(json!({
            "type": "call",
            "value": "0x1",
            "blockNumber": 7,
            "transactionHash": "0xabc",
            "error": "Reverted"
        }))
        .unwrap();
        assert_eq!(tx.block_number, 7);
        assert_eq!(tx.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(tx.error.as_deref(), Some("Reverted"));

        let tx = parse(json!({"type": "call", "value": "0x1", "error": ""})).unwrap();
        assert_eq!(tx.error, None);
    }

    #[test]
    fn block_traces_get_requested_block_number() {
        let traces = vec![
            raw(json!({"type": "call", "value": "0x1", "blockNumber": 999})),
            raw(json!({"type": "create", "value": "0x1"})),
            raw(json!({"type": "call", "value": "0x2"})),
        ];
        let (txs, skipped) = TraceParser::new().parse_block_traces(traces, 100).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(|t| t.block_number == 100));
        assert_eq!(txs[0].value, U256::from(1));
        assert_eq!(txs[1].value, U256::from(2));
    }

    #[test]
    fn nested_call_tracer_frames_are_retained_in_order() {
        let traces = vec![raw(json!({
            "txHash": "0xfeed",
            "result": {
                "type": "CALL",
                "value": "0x0",
                "calls": [
                    {"type": "CALL", "value": "0x3"},
                    {"type": "CALL", "value": "0x4", "error": "out of gas"}
                ]
            }
        }))];
        let (txs, skipped) = TraceParser::new().parse_block_traces(traces, 5).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(txs.iter().map(|t| t.value.as_u64()).collect::<Vec<_>>(), vec![3, 4]);
        assert!(txs.iter().all(|t| t.transaction_hash.as_deref() == Some("0xfeed")));
        assert_eq!(txs[1].error.as_deref(), Some("out of gas"));
    }

    #[test]
    fn empty_trace_list_yields_nothing() {
        let (txs, skipped) = TraceParser::new().parse_block_traces(vec![], 100).unwrap();
        assert!(txs.is_empty());
        assert_eq!(skipped, 0);
    }
}
