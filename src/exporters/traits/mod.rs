pub mod item_exporter;
