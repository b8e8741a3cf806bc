pub mod json_lines_exporter;
pub mod traits;

pub use json_lines_exporter::{ExportTarget, JsonLinesExporter};
pub use traits::item_exporter::ItemExporter;
