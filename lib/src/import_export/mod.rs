pub mod entities;
pub mod export;
pub mod import;

// Re-export main functions for convenience
pub use export::{export_all, export_folder, export_to_file, write_forest, write_tree, ExportSummary};
pub use import::{import_bytes, import_bytes_dated, import_file, parse_document, ImportNode, ImportSummary};
