use crate::errors::error::AppError;
use crate::infrastructure::protocol::constants::{DAOFORK_BLOCK_NUMBER, GENESIS_BLOCK_NUMBER};
use crate::{log_info, log_warn};
use crate::models::InternalTransaction;
use crate::models::domain::internal_transaction::{TRACE_TYPE_DAOFORK, TRACE_TYPE_GENESIS};
use crate::utils::{quantity_to_u256, to_normalized_address};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// 无法通过 trace 获取的历史余额变动（创世分配、DAO 硬分叉资金转移）
pub trait SpecialTraceSource: Send + Sync {
    fn genesis_traces(&self) -> Vec<InternalTransaction>;
    fn daofork_traces(&self) -> Vec<InternalTransaction>;
}

#[derive(Debug, Deserialize, Default)]
struct GenesisAllocFile {
    #[serde(default)]
    allocations: Vec<GenesisAllocation>,
}

#[derive(Debug, Deserialize)]
struct GenesisAllocation {
    address: String,
    value: String,
}

#[derive(Debug, Deserialize, Default)]
struct DaoForkStateChangesFile {
    #[serde(default)]
    state_changes: Vec<DaoForkStateChange>,
}

#[derive(Debug, Deserialize)]
struct DaoForkStateChange {
    from_address: String,
    to_address: String,
    value: String,
}

pub fn parse_genesis_alloc(content: &str) -> Result<Vec<InternalTransaction>, AppError> {
    let file: GenesisAllocFile = toml::from_str(content)?;
    file.allocations
        .into_iter()
        .map(|allocation| {
            let mut trace = InternalTransaction::new(
                GENESIS_BLOCK_NUMBER,
                TRACE_TYPE_GENESIS,
                quantity_to_u256(&allocation.value)?,
            );
            trace.to_address = Some(to_normalized_address(&allocation.address)?);
            Ok(trace)
        })
        .collect()
}

pub fn parse_daofork_state_changes(content: &str) -> Result<Vec<InternalTransaction>, AppError> {
    let file: DaoForkStateChangesFile = toml::from_str(content)?;
    file.state_changes
        .into_iter()
        .map(|change| {
            let mut trace = InternalTransaction::new(
                DAOFORK_BLOCK_NUMBER,
                TRACE_TYPE_DAOFORK,
                quantity_to_u256(&change.value)?,
            );
            trace.from_address = Some(to_normalized_address(&change.from_address)?);
            trace.to_address = Some(to_normalized_address(&change.to_address)?);
            Ok(trace)
        })
        .collect()
}

fn read_data_file(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|e| {
        AppError::Validation(format!("无法读取文件 '{}': {}", path.display(), e))
    })
}

/// 从 TOML 数据文件加载的特殊 trace，启动时一次性解析
#[derive(Debug, Default)]
pub struct FileSpecialTraceSource {
    genesis: Vec<InternalTransaction>,
    daofork: Vec<InternalTransaction>,
}

impl FileSpecialTraceSource {
    pub fn load(genesis_path: Option<&Path>, daofork_path: Option<&Path>) -> Result<Self, AppError> {
        let genesis = match genesis_path {
            Some(path) => parse_genesis_alloc(&read_data_file(path)?)?,
            None => Vec::new(),
        };
        let daofork = match daofork_path {
            Some(path) => parse_daofork_state_changes(&read_data_file(path)?)?,
            None => Vec::new(),
        };
        log_info!(
            "特殊 trace 加载完成: genesis {} 条, daofork {} 条",
            genesis.len(),
            daofork.len()
        );
        Ok(Self { genesis, daofork })
    }
}

impl SpecialTraceSource for FileSpecialTraceSource {
    fn genesis_traces(&self) -> Vec<InternalTransaction> {
        self.genesis.clone()
    }

    fn daofork_traces(&self) -> Vec<InternalTransaction> {
        self.daofork.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTraceKind {
    Genesis,
    DaoFork,
}

impl SpecialTraceKind {
    fn traces(&self, source: &dyn SpecialTraceSource) -> Vec<InternalTransaction> {
        match self {
            SpecialTraceKind::Genesis => source.genesis_traces(),
            SpecialTraceKind::DaoFork => source.daofork_traces(),
        }
    }
}

/// 区块号 → 特殊 trace 类型的策略表，同一区块内按注册顺序输出
pub struct SpecialTraceRegistry {
    source: Arc<dyn SpecialTraceSource>,
    table: BTreeMap<u64, Vec<SpecialTraceKind>>,
}

impl SpecialTraceRegistry {
    pub fn new(source: Arc<dyn SpecialTraceSource>) -> Self {
        Self {
            source,
            table: BTreeMap::new(),
        }
    }

    pub fn register(mut self, block_number: u64, kind: SpecialTraceKind) -> Self {
        self.table.entry(block_number).or_default().push(kind);
        self
    }

    /// genesis 先于 daofork 注册
    pub fn from_flags(
        source: Arc<dyn SpecialTraceSource>,
        include_genesis_traces: bool,
        include_daofork_traces: bool,
    ) -> Self {
        let mut registry = Self::new(source);
        if include_genesis_traces {
            registry = registry.register(GENESIS_BLOCK_NUMBER, SpecialTraceKind::Genesis);
        }
        if include_daofork_traces {
            registry = registry.register(DAOFORK_BLOCK_NUMBER, SpecialTraceKind::DaoFork);
        }
        for (block_number, kind) in registry.empty_kinds() {
            log_warn!(
                "已开启 {:?} 特殊 trace，但数据为空：区块 {} 不会输出该类记录，请检查数据文件",
                kind,
                block_number
            );
        }
        registry
    }

    /// 已注册但数据源为空的 (区块号, 类型)
    pub fn empty_kinds(&self) -> Vec<(u64, SpecialTraceKind)> {
        self.table
            .iter()
            .flat_map(|(block_number, kinds)| kinds.iter().map(move |kind| (*block_number, *kind)))
            .filter(|(_, kind)| kind.traces(self.source.as_ref()).is_empty())
            .collect()
    }

    pub fn kinds_for(&self, block_number: u64) -> &[SpecialTraceKind] {
        self.table
            .get(&block_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn traces_for(&self, block_number: u64) -> Vec<InternalTransaction> {
        self.kinds_for(block_number)
            .iter()
            .flat_map(|kind| kind.traces(self.source.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::U256;

    const GENESIS: &str = r#"
        [[allocations]]
        address = "0x000D836201318ec6899a67540690382780743280"
        value = "200000000000000000000"

        [[allocations]]
        address = "0x001762430ea9c3a26e5749afdb70da5f78ddbb8c"
        value = "0xad78ebc5ac6200000"
    "#;

    const DAOFORK: &str = r#"
        [[state_changes]]
        from_address = "0xBB9bc244D798123fDe783fCc1C72d3Bb8C189413"
        to_address = "0xbf4ed7b27f1d666546e30d74d50d173d20bca754"
        value = "1000"
    "#;

    struct StaticSource;

    impl SpecialTraceSource for StaticSource {
        fn genesis_traces(&self) -> Vec<InternalTransaction> {
            parse_genesis_alloc(GENESIS).unwrap()
        }

        fn daofork_traces(&self) -> Vec<InternalTransaction> {
            parse_daofork_state_changes(DAOFORK).unwrap()
        }
    }

    #[test]
    fn parses_genesis_allocations() {
        let traces = parse_genesis_alloc(GENESIS).unwrap();
        assert_eq!(traces.len(), 2);
        assert!(traces.iter().all(|t| t.block_number == 0 && t.trace_type == "genesis"));
        assert_eq!(
            traces[0].to_address.as_deref(),
            Some("0x000d836201318ec6899a67540690382780743280")
        );
        assert_eq!(traces[0].from_address, None);
        assert_eq!(traces[0].transaction_hash, None);
        assert_eq!(traces[1].value, U256::from_dec_str("200000000000000000000").unwrap());
    }

    #[test]
    fn parses_daofork_state_changes() {
        let traces = parse_daofork_state_changes(DAOFORK).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].block_number, DAOFORK_BLOCK_NUMBER);
        assert_eq!(traces[0].trace_type, "daofork");
        assert_eq!(
            traces[0].from_address.as_deref(),
            Some("0xbb9bc244d798123fde783fcc1c72d3bb8c189413")
        );
        assert_eq!(traces[0].value, U256::from(1000));
    }

    #[test]
    fn empty_files_yield_no_traces() {
        assert!(parse_genesis_alloc("allocations = []").unwrap().is_empty());
        assert!(parse_daofork_state_changes("").unwrap().is_empty());
    }

    #[test]
    fn invalid_address_is_rejected() {
        let content = "[[allocations]]\naddress = \"0x12\"\nvalue = \"1\"\n";
        assert!(matches!(parse_genesis_alloc(content), Err(AppError::InvalidAddress(_))));
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let genesis_path = dir.path().join("genesis_alloc.toml");
        fs::write(&genesis_path, GENESIS).unwrap();

        let source = FileSpecialTraceSource::load(Some(genesis_path.as_path()), None).unwrap();
        assert_eq!(source.genesis_traces().len(), 2);
        assert!(source.daofork_traces().is_empty());

        let missing = dir.path().join("missing.toml");
        assert!(FileSpecialTraceSource::load(None, Some(missing.as_path())).is_err());
    }

    #[test]
    fn registry_maps_blocks_to_special_traces() {
        let registry = SpecialTraceRegistry::from_flags(Arc::new(StaticSource), true, true);
        assert_eq!(registry.traces_for(0).len(), 2);
        assert_eq!(registry.traces_for(DAOFORK_BLOCK_NUMBER).len(), 1);
        assert!(registry.traces_for(10).is_empty());
    }

    #[test]
    fn registry_respects_flags() {
        let registry = SpecialTraceRegistry::from_flags(Arc::new(StaticSource), false, true);
        assert!(registry.traces_for(0).is_empty());
        assert_eq!(registry.kinds_for(DAOFORK_BLOCK_NUMBER), &[SpecialTraceKind::DaoFork]);
    }

    #[test]
    fn kinds_on_same_block_keep_registration_order() {
        let registry = SpecialTraceRegistry::new(Arc::new(StaticSource))
            .register(5, SpecialTraceKind::Genesis)
            .register(5, SpecialTraceKind::DaoFork);
        let traces = registry.traces_for(5);
        let kinds: Vec<_> = traces.iter().map(|t| t.trace_type.as_str()).collect();
        assert_eq!(kinds, vec!["genesis", "genesis", "daofork"]);
    }

    #[test]
    fn enabled_kinds_with_empty_data_are_reported() {
        let empty = SpecialTraceRegistry::from_flags(Arc::new(FileSpecialTraceSource::default()), true, true);
        assert_eq!(
            empty.empty_kinds(),
            vec![
                (0, SpecialTraceKind::Genesis),
                (DAOFORK_BLOCK_NUMBER, SpecialTraceKind::DaoFork)
            ]
        );

        let loaded = SpecialTraceRegistry::from_flags(Arc::new(StaticSource), true, true);
        assert!(loaded.empty_kinds().is_empty());

        let disabled = SpecialTraceRegistry::from_flags(Arc::new(FileSpecialTraceSource::default()), false, false);
        assert!(disabled.empty_kinds().is_empty());
    }

    #[test]
    fn shipped_data_files_parse() {
        let genesis = include_str!("../../config/genesis_alloc.toml");
        let daofork = include_str!("../../config/daofork_state_changes.toml");
        assert!(parse_genesis_alloc(genesis).is_ok());
        assert!(parse_daofork_state_changes(daofork).is_ok());
    }
}
