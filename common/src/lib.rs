//! Banquet Reports Common Library
//!
//! CLIとテストで共有される型・集計・レイアウト

pub mod types;
pub mod format;
pub mod aggregator;
pub mod chart;
pub mod layout;
pub mod error;
pub mod export;
pub mod report;

pub use types::{
    Event, EventAnalysis, EventType, FurnitureAssignment, Granularity, InventoryItem, MaintenanceEntry, PeriodBucket,
    RecordId, Tasting, WarehouseReport, WarehouseSummary,
};
pub use layout::PdfLayout;
pub use chart::{Bitmap, ChartKey, ChartRasterizer, ChartSpec, RasterizeError};
pub use error::{Error, Result};
pub use aggregator::{
    analyze_events, bucket_by_period, filter_low_stock, percentages_of, summarize_warehouses, warehouse_report,
};
pub use report::{ReportContext, ReportDataset, ReportKind, ReportScope, ReportTab};
