//! データ取得
//!
//! 上流REST APIのJSONをそのまま受け取り、集計値はローカルで再計算する:
//! - 期間分析: 期間ごとのイベントを平坦化して再バケット化
//! - 倉庫レポート: 倉庫×カテゴリの在庫行に展開して再集計
//! - 低在庫: 設定の閾値で再フィルタ

use crate::error::FetchError;
use banquet_reports_common::aggregator::{analyze_events, filter_low_stock, flatten_warehouse_report, warehouse_report};
use banquet_reports_common::format::parse_date;
use banquet_reports_common::report::{ReportDataset, ReportTab};
use banquet_reports_common::types::{
    parse_collection, parse_payload, Event, EventAnalysisPayload, EventType, Granularity, InventoryItem,
    MaintenanceEntry, RecordId, Tasting, WarehouseReport,
};
use chrono::Datelike;
use log::debug;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

const EVENT_TYPES_PATH: &str = "/api/inventory/tipos-evento/";

/// タブごとの取得条件
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetQuery {
    Events { event_type: Option<RecordId> },
    Tastings { year: i32, month: u32 },
    LowStock,
    Warehouse,
    Maintenance,
    Analysis { granularity: Granularity },
}

impl DatasetQuery {
    pub fn tab(&self) -> ReportTab {
        match self {
            DatasetQuery::Events { .. } => ReportTab::Events,
            DatasetQuery::Tastings { .. } => ReportTab::Tastings,
            DatasetQuery::LowStock => ReportTab::Inventory,
            DatasetQuery::Warehouse => ReportTab::Warehouse,
            DatasetQuery::Maintenance => ReportTab::Maintenance,
            DatasetQuery::Analysis { .. } => ReportTab::Analysis,
        }
    }

    /// ベースURLからの相対パス（クエリ文字列込み）
    pub fn path(&self) -> String {
        match self {
            DatasetQuery::Events { event_type: Some(id) } => {
                format!("/api/inventory/eventos/?tipo_evento={}&ordering=-fecha_inicio", id)
            }
            DatasetQuery::Events { event_type: None } => "/api/inventory/eventos/?ordering=-fecha_inicio".to_string(),
            DatasetQuery::Tastings { year, month } => {
                format!("/api/inventory/degustaciones/?year={}&month={}", year, month)
            }
            DatasetQuery::LowStock => "/api/inventory/items/bajo-stock/".to_string(),
            DatasetQuery::Warehouse => "/api/inventory/items/warehouse-report/".to_string(),
            DatasetQuery::Maintenance => "/api/inventory/items/maintenance-report/".to_string(),
            DatasetQuery::Analysis { granularity } => {
                format!("/api/inventory/items/event-analysis/?period={}", granularity.as_str())
            }
        }
    }

    /// スナップショットのファイル名（エンドポイント名 + .json）
    pub fn snapshot_name(&self) -> &'static str {
        match self {
            DatasetQuery::Events { .. } => "eventos.json",
            DatasetQuery::Tastings { .. } => "degustaciones.json",
            DatasetQuery::LowStock => "bajo-stock.json",
            DatasetQuery::Warehouse => "warehouse-report.json",
            DatasetQuery::Maintenance => "maintenance-report.json",
            DatasetQuery::Analysis { .. } => "event-analysis.json",
        }
    }
}

/// データ取得の境界
pub trait DatasetFetcher {
    fn fetch(&self, query: &DatasetQuery) -> impl Future<Output = Result<ReportDataset, FetchError>> + Send;

    fn event_types(&self) -> impl Future<Output = Result<Vec<EventType>, FetchError>> + Send;
}

fn decode_list<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>, FetchError> {
    Ok(parse_collection(json, what)?)
}

fn decode_object<T: DeserializeOwned + Default>(json: &str, what: &str) -> Result<T, FetchError> {
    Ok(parse_payload(json, what)?)
}

/// レスポンス本文をデータセットに変換（集計はここで再計算）
pub fn decode_dataset(query: &DatasetQuery, json: &str, low_stock_threshold: u64) -> Result<ReportDataset, FetchError> {
    let dataset = match query {
        DatasetQuery::Events { .. } => ReportDataset::Events(decode_list::<Event>(json, "eventos")?),
        DatasetQuery::Tastings { .. } => ReportDataset::Tastings(decode_list::<Tasting>(json, "degustaciones")?),
        DatasetQuery::LowStock => {
            let items = decode_list::<InventoryItem>(json, "bajo-stock")?;
            ReportDataset::Inventory(filter_low_stock(&items, low_stock_threshold))
        }
        DatasetQuery::Warehouse => {
            let upstream: WarehouseReport = decode_object(json, "warehouse-report")?;
            if upstream.warehouses.is_empty() {
                ReportDataset::Warehouse(upstream)
            } else {
                ReportDataset::Warehouse(warehouse_report(&flatten_warehouse_report(&upstream)))
            }
        }
        DatasetQuery::Maintenance => {
            ReportDataset::Maintenance(decode_list::<MaintenanceEntry>(json, "maintenance-report")?)
        }
        DatasetQuery::Analysis { granularity } => {
            let payload: EventAnalysisPayload = decode_object(json, "event-analysis")?;
            ReportDataset::Analysis(analyze_events(&payload.into_events(), *granularity))
        }
    };
    debug!("{}: {}件", query.tab(), dataset.len());
    Ok(dataset)
}

// ============================================
// HTTP
// ============================================

pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    low_stock_threshold: u64,
}

impl HttpFetcher {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout_seconds: u64,
        low_stock_threshold: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            low_stock_threshold,
        })
    }

    async fn get_text(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.text().await?)
    }
}

impl DatasetFetcher for HttpFetcher {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ReportDataset, FetchError> {
        let body = self.get_text(&query.path()).await?;
        decode_dataset(query, &body, self.low_stock_threshold)
    }

    async fn event_types(&self) -> Result<Vec<EventType>, FetchError> {
        let body = self.get_text(EVENT_TYPES_PATH).await?;
        decode_list(&body, "tipos-evento")
    }
}

// ============================================
// スナップショット（保存済みJSON）
// ============================================

/// `<dir>/<endpoint>.json` を読むオフライン用の取得元
///
/// サーバー側の絞り込み（種別・年月）はここで再現する。
pub struct SnapshotFetcher {
    dir: PathBuf,
    low_stock_threshold: u64,
}

impl SnapshotFetcher {
    pub fn new(dir: impl Into<PathBuf>, low_stock_threshold: u64) -> Self {
        Self {
            dir: dir.into(),
            low_stock_threshold,
        }
    }

    async fn read(&self, name: &str) -> Result<String, FetchError> {
        let path = self.dir.join(name);
        debug!("スナップショット読み込み: {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Snapshot(format!("{}: {}", path.display(), e)))
    }
}

impl DatasetFetcher for SnapshotFetcher {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ReportDataset, FetchError> {
        let body = self.read(query.snapshot_name()).await?;
        let dataset = decode_dataset(query, &body, self.low_stock_threshold)?;

        Ok(match (query, dataset) {
            (DatasetQuery::Events { event_type: Some(id) }, ReportDataset::Events(events)) => ReportDataset::Events(
                events
                    .into_iter()
                    .filter(|e| e.tipo_evento.as_ref() == Some(id))
                    .collect(),
            ),
            (DatasetQuery::Tastings { year, month }, ReportDataset::Tastings(tastings)) => ReportDataset::Tastings(
                tastings
                    .into_iter()
                    .filter(|t| {
                        parse_date(&t.fecha_degustacion)
                            .map(|d| d.year() == *year && d.month() == *month)
                            .unwrap_or(false)
                    })
                    .collect(),
            ),
            (_, dataset) => dataset,
        })
    }

    async fn event_types(&self) -> Result<Vec<EventType>, FetchError> {
        let body = self.read("tipos-evento.json").await?;
        decode_list(&body, "tipos-evento")
    }
}
