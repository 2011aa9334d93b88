pub mod export_service;
pub mod ingest_service;

pub use export_service::{export_production, export_slopes, export_template, ProductionExport};
pub use ingest_service::{ingest_batch, ingest_batch_with_progress, BatchReport, DatasetKind, UploadedFile};
