use crate::config::EthereumConfig;
use crate::errors::error::AppError;
use crate::infrastructure::protocol::constants::{CALL_TRACER, DEBUG_TRACE_BLOCK_BY_NUMBER};
use crate::log_info;
use crate::models::RawTrace;
use crate::utils::block_number_to_hex;
use async_trait::async_trait;
use ethers_providers::{Http, JsonRpcClient, Provider};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait ProviderTrait: Send + Sync {
    /// `None` 表示节点 result 字段为空（null），空数组表示该区块确实没有 trace
    async fn trace_block_by_number(
        &self,
        block_number: u64,
    ) -> Result<Option<Vec<RawTrace>>, AppError>;
}

#[derive(Debug, Serialize)]
struct TracerConfig {
    tracer: &'static str,
}

pub struct EthereumProvider<P = Http> {
    providers: Vec<Arc<Provider<P>>>,
    index: AtomicUsize,
}

/// 带 api key 的节点地址：base 不以 '/' 结尾时 key 作为路径，否则直接拼接
pub fn keyed_rpc_url(rpc_url: &str, key: &str) -> Result<Url, AppError> {
    if rpc_url.ends_with('/') {
        Url::parse(&format!("{}{}", rpc_url, key))
            .map_err(|e| AppError::InvalidUrl(format!("{}: {}", rpc_url, e)))
    } else {
        let mut url =
            Url::parse(rpc_url).map_err(|e| AppError::InvalidUrl(format!("{}: {}", rpc_url, e)))?;
        url.set_path(&format!("/{}", key));
        Ok(url)
    }
}

impl EthereumProvider<Http> {
    pub fn new(config: &EthereumConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::ProviderError(format!("构建 HTTP 客户端失败: {}", e)))?;

        let keys = config
            .api_keys
            .split(',')
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>();

        let urls = if keys.is_empty() {
            vec![
                Url::parse(&config.rpc_url)
                    .map_err(|e| AppError::InvalidUrl(format!("{}: {}", config.rpc_url, e)))?,
            ]
        } else {
            keys.iter()
                .map(|key| keyed_rpc_url(&config.rpc_url, key))
                .collect::<Result<Vec<_>, _>>()?
        };

        let providers = urls
            .into_iter()
            .map(|url| Provider::new(Http::new_with_client(url, client.clone())))
            .collect::<Vec<_>>();

        log_info!("成功初始化 {} 个RPC Provider", providers.len());

        Self::from_providers(providers)
    }
}

impl<P: JsonRpcClient> EthereumProvider<P> {
    pub fn from_providers(providers: Vec<Provider<P>>) -> Result<Self, AppError> {
        if providers.is_empty() {
            return Err(AppError::Validation("至少需要一个 RPC Provider".to_string()));
        }
        Ok(Self {
            providers: providers.into_iter().map(Arc::new).collect(),
            index: AtomicUsize::new(0),
        })
    }

    /// 轮询选择 provider
    pub fn get_provider(&self) -> Arc<Provider<P>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }
}

/// 逐条解码 result 数组，单条 trace 形态异常不影响同区块的其他 trace。
///
/// result 既不是 null 也不是数组时，重试也不会变化，返回 `MalformedTrace`。
fn decode_block_traces(block_number: u64, result: Value) -> Result<Option<Vec<RawTrace>>, AppError> {
    match result {
        Value::Null => Ok(None),
        Value::Array(values) => Ok(Some(values.into_iter().map(RawTrace::from).collect())),
        other => Err(AppError::MalformedTrace(format!(
            "区块 {} 的 trace 结果不是数组: {}",
            block_number,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl<P: JsonRpcClient> ProviderTrait for EthereumProvider<P> {
    async fn trace_block_by_number(
        &self,
        block_number: u64,
    ) -> Result<Option<Vec<RawTrace>>, AppError> {
        let provider = self.get_provider();
        let params = (
            block_number_to_hex(block_number),
            TracerConfig {
                tracer: CALL_TRACER,
            },
        );
        // 只让传输层解出 JSON 信封，result 自己解码，避免确定性的数据问题被当成网络错误重试
        let result = provider
            .request::<_, Value>(DEBUG_TRACE_BLOCK_BY_NUMBER, params)
            .await?;
        decode_block_traces(block_number, result)
    }
}
