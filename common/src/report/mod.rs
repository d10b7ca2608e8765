//! 帳票の種類・データセット・共通コンテキスト
//!
//! 種類ごとのブロック構成は `document`（PDF）と `workbook`（XLSX）にある。

pub mod document;
pub mod workbook;

use crate::aggregator::INVENTORY_CATEGORIES;
use crate::chart::{ChartBar, ChartKey, ChartSpec};
use crate::format::DEFAULT_DATE_FORMAT;
use crate::types::{Event, EventAnalysis, Granularity, InventoryItem, MaintenanceEntry, RecordId, Tasting, WarehouseReport, WarehouseSummary};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// 低在庫とみなす既定の閾値
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 25;

/// 倉庫チャートの画面サイズ（px）
pub const WAREHOUSE_CHART_SIZE: (u32, u32) = (800, 300);
/// 期間分析チャートの画面サイズ（px）
pub const ANALYSIS_CHART_SIZE: (u32, u32) = (800, 400);

/// 画面のタブ（データセットの単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportTab {
    Events,
    Tastings,
    Inventory,
    Warehouse,
    Maintenance,
    Analysis,
}

impl ReportTab {
    pub const ALL: [ReportTab; 6] = [
        ReportTab::Events,
        ReportTab::Tastings,
        ReportTab::Inventory,
        ReportTab::Warehouse,
        ReportTab::Maintenance,
        ReportTab::Analysis,
    ];

    /// 詳細エクスポート（選択）を持つタブ
    pub fn is_selectable(&self) -> bool {
        matches!(self, ReportTab::Events | ReportTab::Tastings)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTab::Events => "events",
            ReportTab::Tastings => "tastings",
            ReportTab::Inventory => "inventory",
            ReportTab::Warehouse => "warehouse",
            ReportTab::Maintenance => "maintenance",
            ReportTab::Analysis => "analysis",
        }
    }
}

impl fmt::Display for ReportTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// エクスポートできる帳票の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Events,
    EventDetail,
    Tastings,
    TastingDetail,
    Inventory,
    Warehouse,
    Maintenance,
    Analysis,
}

impl ReportKind {
    /// データ元のタブ
    pub fn tab(&self) -> ReportTab {
        match self {
            ReportKind::Events | ReportKind::EventDetail => ReportTab::Events,
            ReportKind::Tastings | ReportKind::TastingDetail => ReportTab::Tastings,
            ReportKind::Inventory => ReportTab::Inventory,
            ReportKind::Warehouse => ReportTab::Warehouse,
            ReportKind::Maintenance => ReportTab::Maintenance,
            ReportKind::Analysis => ReportTab::Analysis,
        }
    }

    pub fn is_detail(&self) -> bool {
        matches!(self, ReportKind::EventDetail | ReportKind::TastingDetail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Events => "events",
            ReportKind::EventDetail => "event",
            ReportKind::Tastings => "tastings",
            ReportKind::TastingDetail => "tasting",
            ReportKind::Inventory => "inventory",
            ReportKind::Warehouse => "warehouse",
            ReportKind::Maintenance => "maintenance",
            ReportKind::Analysis => "analysis",
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "events" | "eventos" => Ok(ReportKind::Events),
            "event" | "evento" => Ok(ReportKind::EventDetail),
            "tastings" | "degustaciones" => Ok(ReportKind::Tastings),
            "tasting" | "degustacion" => Ok(ReportKind::TastingDetail),
            "inventory" | "low-stock" | "inventario" => Ok(ReportKind::Inventory),
            "warehouse" | "warehouses" | "bodegas" => Ok(ReportKind::Warehouse),
            "maintenance" | "mantenimiento" => Ok(ReportKind::Maintenance),
            "analysis" | "analisis" => Ok(ReportKind::Analysis),
            _ => Err(format!(
                "Unknown report: {}. Use events, event, tastings, tasting, inventory, warehouse, maintenance, or analysis",
                s
            )),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1タブ分の作業データ。再取得時は丸ごと置き換える
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDataset {
    Events(Vec<Event>),
    Tastings(Vec<Tasting>),
    Inventory(Vec<InventoryItem>),
    Warehouse(WarehouseReport),
    Maintenance(Vec<MaintenanceEntry>),
    Analysis(EventAnalysis),
}

impl ReportDataset {
    /// 取得失敗時などに使う空データ
    pub fn empty(tab: ReportTab) -> Self {
        match tab {
            ReportTab::Events => ReportDataset::Events(Vec::new()),
            ReportTab::Tastings => ReportDataset::Tastings(Vec::new()),
            ReportTab::Inventory => ReportDataset::Inventory(Vec::new()),
            ReportTab::Warehouse => ReportDataset::Warehouse(WarehouseReport::default()),
            ReportTab::Maintenance => ReportDataset::Maintenance(Vec::new()),
            ReportTab::Analysis => ReportDataset::Analysis(EventAnalysis::default()),
        }
    }

    pub fn tab(&self) -> ReportTab {
        match self {
            ReportDataset::Events(_) => ReportTab::Events,
            ReportDataset::Tastings(_) => ReportTab::Tastings,
            ReportDataset::Inventory(_) => ReportTab::Inventory,
            ReportDataset::Warehouse(_) => ReportTab::Warehouse,
            ReportDataset::Maintenance(_) => ReportTab::Maintenance,
            ReportDataset::Analysis(_) => ReportTab::Analysis,
        }
    }

    /// 行数（倉庫は倉庫数、分析は期間数）
    pub fn len(&self) -> usize {
        match self {
            ReportDataset::Events(v) => v.len(),
            ReportDataset::Tastings(v) => v.len(),
            ReportDataset::Inventory(v) => v.len(),
            ReportDataset::Warehouse(r) => r.warehouses.len(),
            ReportDataset::Maintenance(v) => v.len(),
            ReportDataset::Analysis(a) => a.periods.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 選択可能なレコードにIDが含まれるか
    pub fn contains_record(&self, id: &RecordId) -> bool {
        match self {
            ReportDataset::Events(v) => v.iter().any(|e| &e.id == id),
            ReportDataset::Tastings(v) => v.iter().any(|t| &t.id == id),
            _ => false,
        }
    }

    pub fn find_event(&self, id: &RecordId) -> Option<&Event> {
        match self {
            ReportDataset::Events(v) => v.iter().find(|e| &e.id == id),
            _ => None,
        }
    }

    pub fn find_tasting(&self, id: &RecordId) -> Option<&Tasting> {
        match self {
            ReportDataset::Tastings(v) => v.iter().find(|t| &t.id == id),
            _ => None,
        }
    }

    /// 画面に載るチャート（データセット置き換えのたびに作り直す）
    pub fn chart_specs(&self) -> Vec<(ChartKey, ChartSpec)> {
        match self {
            ReportDataset::Warehouse(report) => report
                .warehouses
                .iter()
                .map(|w| (ChartKey::warehouse(&w.id), warehouse_chart(w)))
                .collect(),
            ReportDataset::Analysis(analysis) if !analysis.is_empty() => {
                vec![(ChartKey::event_analysis(), analysis_chart(analysis))]
            }
            _ => Vec::new(),
        }
    }
}

/// 倉庫ごとのカテゴリ分布（数量0のカテゴリも既定カテゴリとして並べる）
pub fn warehouse_chart(warehouse: &WarehouseSummary) -> ChartSpec {
    let mut bars: Vec<ChartBar> = INVENTORY_CATEGORIES
        .iter()
        .map(|category| ChartBar {
            label: category.to_string(),
            value: warehouse
                .categories
                .iter()
                .find(|c| c.categoria == *category)
                .map(|c| c.cantidad as f64)
                .unwrap_or(0.0),
        })
        .collect();
    for extra in warehouse
        .categories
        .iter()
        .filter(|c| !INVENTORY_CATEGORIES.contains(&c.categoria.as_str()))
    {
        bars.push(ChartBar {
            label: extra.categoria.clone(),
            value: extra.cantidad as f64,
        });
    }
    let (w, h) = WAREHOUSE_CHART_SIZE;
    ChartSpec::bar_chart(warehouse.nombre.clone(), bars, w, h)
}

/// 期間ごとのイベント件数
pub fn analysis_chart(analysis: &EventAnalysis) -> ChartSpec {
    let bars = analysis
        .periods
        .iter()
        .map(|p| ChartBar {
            label: p.period.clone(),
            value: p.count as f64,
        })
        .collect();
    let (w, h) = ANALYSIS_CHART_SIZE;
    ChartSpec::bar_chart("Cantidad de Eventos", bars, w, h)
}

/// 帳票生成に共通の値
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// "Generado el:" とファイル名に使う日付
    pub generated_on: NaiveDate,
    /// chrono の書式文字列
    pub date_format: String,
}

impl ReportContext {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            generated_on,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// 使えない書式なら既定の書式のまま
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        self.date_format = crate::format::checked_date_format(&date_format).to_string();
        self
    }

    /// 表示用の生成日
    pub fn generated_label(&self) -> String {
        format!(
            "Generado el: {}",
            crate::format::format_naive_date(self.generated_on, &self.date_format)
        )
    }

    /// ファイル名用 (YYYY-MM-DD)
    pub fn file_date(&self) -> String {
        self.generated_on.format("%Y-%m-%d").to_string()
    }

    pub fn format_date(&self, raw: &str) -> String {
        crate::format::format_date(raw, &self.date_format)
    }
}

/// 一覧帳票の絞り込み条件（タイトル・ファイル名に出る）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportScope {
    /// 選択中のイベント種別名
    pub event_type_name: Option<String>,
    /// 試食会の対象年月
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub granularity: Granularity,
}
