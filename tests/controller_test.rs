//! タブ状態・取得・出力の統合テスト

use banquet_reports::cli::ExportFormat;
use banquet_reports::controller::{LoadResolution, ReportController, TabStatus};
use banquet_reports::error::FetchError;
use banquet_reports::fetcher::{DatasetFetcher, DatasetQuery};
use banquet_reports_common::chart::ChartKey;
use banquet_reports_common::report::{ReportContext, ReportDataset, ReportKind, ReportTab};
use banquet_reports_common::types::{Event, EventType, Granularity, InventoryItem, RecordId, Tasting};
use banquet_reports_common::{analyze_events, warehouse_report, EventAnalysis, WarehouseReport};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::tempdir;

/// タブごとに決まった結果を返す取得元
#[derive(Default)]
struct FakeFetcher {
    responses: Mutex<HashMap<ReportTab, Option<ReportDataset>>>,
    queries: Mutex<Vec<DatasetQuery>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn with(mut self, dataset: ReportDataset) -> Self {
        let tab = dataset.tab();
        self.responses.get_mut().unwrap().insert(tab, Some(dataset));
        self
    }

    fn failing(mut self, tab: ReportTab) -> Self {
        self.responses.get_mut().unwrap().insert(tab, None);
        self
    }
}

impl DatasetFetcher for FakeFetcher {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ReportDataset, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        match self.responses.lock().unwrap().get(&query.tab()) {
            Some(Some(dataset)) => Ok(dataset.clone()),
            Some(None) => Err(FetchError::Status {
                status: 500,
                url: query.path(),
            }),
            None => Ok(ReportDataset::empty(query.tab())),
        }
    }

    async fn event_types(&self) -> Result<Vec<EventType>, FetchError> {
        Ok(vec![EventType {
            id: RecordId::from(2),
            nombre: "Bodas".to_string(),
            descripcion: None,
        }])
    }
}

fn ctx() -> ReportContext {
    ReportContext::new(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
}

fn event(id: u64, date: &str) -> Event {
    Event {
        id: RecordId::from(id),
        nombre: format!("Boda {}", id),
        responsable: "Luis".to_string(),
        cantidad_personas: 150,
        fecha_inicio: date.to_string(),
        tipo_evento: Some(RecordId::from(2)),
        ..Default::default()
    }
}

fn stock(warehouse: u64, name: &str, category: &str, quantity: u64) -> InventoryItem {
    InventoryItem {
        bodega_id: Some(RecordId::from(warehouse)),
        bodega_nombre: name.to_string(),
        categoria: category.to_string(),
        cantidad_actual: quantity,
        ..Default::default()
    }
}

fn warehouses() -> WarehouseReport {
    warehouse_report(&[stock(1, "Central", "Sillas", 30), stock(2, "Norte", "Mesas", 10)])
}

fn analysis() -> EventAnalysis {
    analyze_events(
        &[event(1, "2024-01-05"), event(2, "2024-01-20"), event(3, "2024-02-03")],
        Granularity::Monthly,
    )
}

#[tokio::test]
async fn test_events_without_type_do_not_fetch() {
    let mut controller = ReportController::new(FakeFetcher::default(), ctx());
    assert_eq!(controller.select_tab(ReportTab::Events).await, None);
    assert_eq!(controller.status(ReportTab::Events), TabStatus::Loaded);
    assert!(controller.dataset(ReportTab::Events).unwrap().is_empty());
}

#[tokio::test]
async fn test_select_tab_fetches_once() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Inventory(vec![stock(1, "Central", "Loza", 3)]));
    let mut controller = ReportController::new(fetcher, ctx());

    assert_eq!(controller.select_tab(ReportTab::Inventory).await, Some(LoadResolution::Applied));
    assert_eq!(controller.select_tab(ReportTab::Inventory).await, None);
    assert_eq!(controller.dataset(ReportTab::Inventory).unwrap().len(), 1);

    // 再取得は明示的に
    assert_eq!(controller.requery(ReportTab::Inventory).await, Some(LoadResolution::Applied));
}

#[tokio::test]
async fn test_tasting_query_uses_period() {
    let mut controller = ReportController::new(FakeFetcher::default(), ctx());
    controller.select_tab(ReportTab::Tastings).await;
    controller.set_tasting_period(2023, 12);
    controller.requery(ReportTab::Tastings).await;

    assert_eq!(
        controller.query_for(ReportTab::Tastings),
        Some(DatasetQuery::Tastings { year: 2023, month: 12 })
    );
}

#[tokio::test]
async fn test_fetch_failure_clears_dataset() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Warehouse(warehouses()));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.select_tab(ReportTab::Warehouse).await;
    assert_eq!(controller.dataset(ReportTab::Warehouse).unwrap().len(), 2);
    assert!(controller.charts().is_mounted(&ChartKey::warehouse(1)));

    // 2回目の取得は失敗させる
    let fetcher = FakeFetcher::default().failing(ReportTab::Warehouse);
    let mut failing = ReportController::new(fetcher, ctx());
    let resolution = failing.select_tab(ReportTab::Warehouse).await;
    match resolution {
        Some(LoadResolution::Failed(notice)) => {
            assert_eq!(notice.tab, ReportTab::Warehouse);
            assert_eq!(
                notice.message,
                "Error al cargar el reporte de bodegas. Por favor, intente de nuevo."
            );
        }
        other => panic!("unexpected resolution: {:?}", other),
    }
    let state = failing.state(ReportTab::Warehouse).unwrap();
    assert_eq!(state.status, TabStatus::Loaded);
    assert!(state.dataset.is_empty());
    assert!(state.last_notice.is_some());
    assert!(failing.charts().is_empty());
}

#[tokio::test]
async fn test_leaving_tab_keeps_dataset() {
    let fetcher = FakeFetcher::default()
        .with(ReportDataset::Warehouse(warehouses()))
        .with(ReportDataset::Analysis(analysis()));
    let mut controller = ReportController::new(fetcher, ctx());

    controller.select_tab(ReportTab::Warehouse).await;
    assert_eq!(controller.charts().len(), 2);

    controller.select_tab(ReportTab::Analysis).await;
    assert_eq!(controller.status(ReportTab::Warehouse), TabStatus::Loaded);
    assert_eq!(controller.dataset(ReportTab::Warehouse).unwrap().len(), 2);
    assert!(controller.charts().is_mounted(&ChartKey::warehouse(1)));
    assert!(controller.charts().is_mounted(&ChartKey::event_analysis()));
    assert_eq!(controller.fetcher().calls.load(Ordering::SeqCst), 2);

    // 戻っても取り直さない
    assert_eq!(controller.select_tab(ReportTab::Warehouse).await, None);
    assert_eq!(controller.fetcher().calls.load(Ordering::SeqCst), 2);
    assert_eq!(controller.dataset(ReportTab::Warehouse).unwrap().len(), 2);
}

#[tokio::test]
async fn test_completion_applied_after_tab_switch() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Inventory(vec![stock(1, "Central", "Loza", 3)]));
    let mut controller = ReportController::new(fetcher, ctx());

    let ticket = controller.begin_load(ReportTab::Inventory).unwrap();
    // 取得中に別タブへ移っても待ち状態は残る
    controller.select_tab(ReportTab::Analysis).await;
    assert_eq!(
        controller.status(ReportTab::Inventory),
        TabStatus::Loading { request: ticket.request }
    );

    let late = ReportDataset::Inventory(vec![stock(9, "Sur", "Loza", 1)]);
    assert_eq!(controller.finish_load(ticket, Ok(late)), LoadResolution::Applied);
    assert_eq!(controller.status(ReportTab::Inventory), TabStatus::Loaded);
    assert_eq!(controller.dataset(ReportTab::Inventory).unwrap().len(), 1);

    // 戻ったときは取得済みの結果を使う
    assert_eq!(controller.select_tab(ReportTab::Inventory).await, None);
}

#[tokio::test]
async fn test_older_request_discarded_by_newer_one() {
    let mut controller = ReportController::new(FakeFetcher::default(), ctx());

    let first = controller.begin_load(ReportTab::Inventory).unwrap();
    let second = controller.begin_load(ReportTab::Inventory).unwrap();
    assert!(second.request > first.request);

    let newer = ReportDataset::Inventory(vec![stock(1, "Central", "Loza", 3)]);
    assert_eq!(controller.finish_load(second, Ok(newer)), LoadResolution::Applied);

    let older = ReportDataset::Inventory(vec![stock(9, "Sur", "Loza", 1), stock(9, "Sur", "Vasos", 2)]);
    assert_eq!(controller.finish_load(first, Ok(older)), LoadResolution::Stale);
    assert_eq!(controller.dataset(ReportTab::Inventory).unwrap().len(), 1);
}

#[tokio::test]
async fn test_selection_cleared_on_reload() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Events(vec![event(7, "2024-03-15")]));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.set_event_type(Some(RecordId::from(2)));
    controller.select_tab(ReportTab::Events).await;

    controller.select_record(ReportTab::Events, RecordId::from(7)).unwrap();
    assert_eq!(controller.selection(ReportTab::Events), Some(&RecordId::from(7)));

    controller.requery(ReportTab::Events).await;
    assert_eq!(controller.selection(ReportTab::Events), None);
}

#[tokio::test]
async fn test_detail_export_without_selection_is_noop() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Tastings(vec![Tasting {
        id: RecordId::from(4),
        nombre: "Menú de prueba".to_string(),
        fecha_degustacion: "2024-03-20".to_string(),
        ..Default::default()
    }]));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.select_tab(ReportTab::Tastings).await;

    let dir = tempdir().unwrap();
    let outcome = controller
        .export(ReportKind::TastingDetail, &ExportFormat::Both, dir.path())
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    controller.select_record(ReportTab::Tastings, RecordId::from(4)).unwrap();
    let outcome = controller
        .export(ReportKind::TastingDetail, &ExportFormat::Both, dir.path())
        .await
        .unwrap()
        .expect("出力されるはず");
    assert_eq!(outcome.files.len(), 2);
    assert_eq!(
        outcome.files[0].file_name().unwrap().to_string_lossy(),
        "reporte_degustacion_Menú_de_prueba_2024-03-09.pdf"
    );
    assert!(outcome.files.iter().all(|f| f.exists()));
}

#[tokio::test]
async fn test_empty_warehouse_export_is_noop() {
    let mut controller = ReportController::new(FakeFetcher::default(), ctx());
    controller.select_tab(ReportTab::Warehouse).await;

    let dir = tempdir().unwrap();
    let outcome = controller
        .export(ReportKind::Warehouse, &ExportFormat::Pdf, dir.path())
        .await
        .unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn test_warehouse_export_uses_mounted_charts() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Warehouse(warehouses()));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.select_tab(ReportTab::Warehouse).await;

    let dir = tempdir().unwrap();
    let outcome = controller
        .export(ReportKind::Warehouse, &ExportFormat::Both, dir.path())
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.degraded_charts.is_empty());
    assert_eq!(
        outcome.files[0].file_name().unwrap().to_string_lossy(),
        "reporte_inventario_bodegas_2024-03-09.pdf"
    );
    assert_eq!(
        outcome.files[1].file_name().unwrap().to_string_lossy(),
        "reporte_inventario_bodegas_2024-03-09.xlsx"
    );
}

#[tokio::test]
async fn test_analysis_export_excel_only() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Analysis(analysis()));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.set_granularity(Granularity::Monthly);
    controller.select_tab(ReportTab::Analysis).await;

    let dir = tempdir().unwrap();
    let outcome = controller
        .export(ReportKind::Analysis, &ExportFormat::Excel, dir.path())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.files.len(), 1);
    assert_eq!(
        outcome.files[0].file_name().unwrap().to_string_lossy(),
        "analisis_eventos_monthly_2024-03-09.xlsx"
    );
}

#[tokio::test]
async fn test_event_types_loaded_once_for_title() {
    let fetcher = FakeFetcher::default().with(ReportDataset::Events(vec![event(1, "2024-03-15")]));
    let mut controller = ReportController::new(fetcher, ctx());
    controller.set_event_type(Some(RecordId::from(2)));
    controller.load_event_types().await.unwrap();
    controller.select_tab(ReportTab::Events).await;

    assert_eq!(controller.scope().event_type_name.as_deref(), Some("Bodas"));
    assert_eq!(controller.event_types().len(), 1);
}
