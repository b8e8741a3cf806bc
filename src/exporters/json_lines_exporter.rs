use super::traits::item_exporter::ItemExporter;
use crate::errors::error::AppError;
use crate::log_info;
use crate::models::InternalTransactionItem;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportTarget {
    Stdout,
    File(PathBuf),
}

impl ExportTarget {
    /// "-" 或空字符串表示 stdout
    pub fn from_output(output: &str) -> Self {
        match output.trim() {
            "" | "-" => ExportTarget::Stdout,
            path => ExportTarget::File(PathBuf::from(path)),
        }
    }
}

/// 每行一个 JSON 对象
pub struct JsonLinesExporter {
    target: ExportTarget,
    writer: Mutex<Option<Writer>>,
    exported: AtomicU64,
}

impl JsonLinesExporter {
    pub fn new(target: ExportTarget) -> Self {
        Self {
            target,
            writer: Mutex::new(None),
            exported: AtomicU64::new(0),
        }
    }

    pub fn exported_count(&self) -> u64 {
        self.exported.load(Ordering::SeqCst)
    }

    async fn create_writer(&self) -> Result<Writer, AppError> {
        match &self.target {
            ExportTarget::Stdout => Ok(Box::new(BufWriter::new(tokio::io::stdout()))),
            ExportTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let file = tokio::fs::File::create(path).await.map_err(|e| {
                    AppError::Export(format!("无法创建导出文件 {}: {}", path.display(), e))
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

#[async_trait]
impl ItemExporter for JsonLinesExporter {
    async fn open(&self) -> Result<(), AppError> {
        let mut writer = self.writer.lock().await;
        if writer.is_none() {
            *writer = Some(self.create_writer().await?);
            log_info!("导出器已打开: {:?}", self.target);
        }
        Ok(())
    }

    async fn export_item(&self, item: &InternalTransactionItem) -> Result<(), AppError> {
        let mut line = serde_json::to_string(item)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| AppError::Export("导出器未打开".to_string()))?;
        writer.write_all(line.as_bytes()).await?;
        self.exported.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        let mut writer = self.writer.lock().await;
        if let Some(mut w) = writer.take() {
            w.flush().await?;
            w.shutdown().await?;
            log_info!(
                "导出器已关闭: {:?}，共导出 {} 条",
                self.target,
                self.exported_count()
            );
        }
        Ok(())
    }
}
