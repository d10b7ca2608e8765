//! 帳票タブの状態管理
//!
//! タブごとに `Idle → Loading → Loaded`。取得は最後に開始したものだけを採用し、
//! それより前の完了は捨てる（リクエスト番号で判定）。

use crate::chart::ChartRegistry;
use crate::cli::ExportFormat;
use crate::error::{FetchError, ReportError, Result};
use crate::export::{excel, file_stem, output_path_for_format, pdf};
use crate::fetcher::{DatasetFetcher, DatasetQuery};
use banquet_reports_common::chart::ChartKey;
use banquet_reports_common::export::pdf_core::PageComposer;
use banquet_reports_common::layout::PdfLayout;
use banquet_reports_common::report::document::plan_for;
use banquet_reports_common::report::workbook::workbook_for;
use banquet_reports_common::report::{ReportContext, ReportDataset, ReportKind, ReportScope, ReportTab};
use banquet_reports_common::types::{EventType, Granularity, RecordId};
use chrono::Datelike;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PDF_ERROR_MESSAGE: &str = "Error al generar el archivo PDF.";
pub const EXCEL_ERROR_MESSAGE: &str = "Error al generar el archivo Excel. Por favor, intente de nuevo.";

/// 取得失敗時に利用者へ出す文言
pub fn fetch_failure_message(tab: ReportTab) -> &'static str {
    match tab {
        ReportTab::Events => "Error al cargar los eventos. Por favor, intente de nuevo.",
        ReportTab::Tastings => "Error al cargar las degustaciones. Por favor, intente de nuevo.",
        ReportTab::Inventory => "Error al cargar el inventario. Por favor, intente de nuevo.",
        ReportTab::Warehouse => "Error al cargar el reporte de bodegas. Por favor, intente de nuevo.",
        ReportTab::Maintenance => "Error al cargar el reporte de mantenimiento. Por favor, intente de nuevo.",
        ReportTab::Analysis => "Error al cargar el análisis de eventos. Por favor, intente de nuevo.",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Idle,
    /// `request` 番の取得結果を待っている
    Loading { request: u64 },
    Loaded,
}

/// 利用者向けの通知（取得・出力の失敗）
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub tab: ReportTab,
    pub message: String,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabState {
    pub status: TabStatus,
    pub dataset: ReportDataset,
    pub last_notice: Option<Notice>,
}

impl TabState {
    fn idle(tab: ReportTab) -> Self {
        Self {
            status: TabStatus::Idle,
            dataset: ReportDataset::empty(tab),
            last_notice: None,
        }
    }
}

/// 開始済みの取得
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub tab: ReportTab,
    pub request: u64,
    pub query: DatasetQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadResolution {
    Applied,
    /// 後から別の取得が始まっていたので捨てた
    Stale,
    Failed(Notice),
}

/// 出力結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOutcome {
    pub files: Vec<PathBuf>,
    /// 描画できずに省略したチャート
    pub degraded_charts: Vec<ChartKey>,
}

pub struct ReportController<F: DatasetFetcher> {
    fetcher: F,
    ctx: ReportContext,
    layout: PdfLayout,
    tabs: HashMap<ReportTab, TabState>,
    active: Option<ReportTab>,
    next_request: u64,
    event_type: Option<RecordId>,
    tasting_period: Option<(i32, u32)>,
    granularity: Granularity,
    selections: HashMap<ReportTab, RecordId>,
    charts: ChartRegistry,
    chart_keys: HashMap<ReportTab, Vec<ChartKey>>,
    event_types: Vec<EventType>,
}

impl<F: DatasetFetcher> ReportController<F> {
    pub fn new(fetcher: F, ctx: ReportContext) -> Self {
        let tabs = ReportTab::ALL.iter().map(|&tab| (tab, TabState::idle(tab))).collect();
        Self {
            fetcher,
            ctx,
            layout: PdfLayout::a4(),
            tabs,
            active: None,
            next_request: 0,
            event_type: None,
            tasting_period: None,
            granularity: Granularity::default(),
            selections: HashMap::new(),
            charts: ChartRegistry::new(),
            chart_keys: HashMap::new(),
            event_types: Vec::new(),
        }
    }

    pub fn context(&self) -> &ReportContext {
        &self.ctx
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn active_tab(&self) -> Option<ReportTab> {
        self.active
    }

    // ============================================
    // 取得条件
    // ============================================

    pub fn set_event_type(&mut self, event_type: Option<RecordId>) {
        self.event_type = event_type;
    }

    pub fn set_tasting_period(&mut self, year: i32, month: u32) {
        self.tasting_period = Some((year, month));
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    /// 試食会の対象年月（未指定なら生成日の年月）
    pub fn tasting_period(&self) -> (i32, u32) {
        self.tasting_period
            .unwrap_or((self.ctx.generated_on.year(), self.ctx.generated_on.month()))
    }

    /// タブの取得条件。種別未選択のイベントは取得しない
    pub fn query_for(&self, tab: ReportTab) -> Option<DatasetQuery> {
        match tab {
            ReportTab::Events => self.event_type.as_ref().map(|id| DatasetQuery::Events {
                event_type: Some(id.clone()),
            }),
            ReportTab::Tastings => {
                let (year, month) = self.tasting_period();
                Some(DatasetQuery::Tastings { year, month })
            }
            ReportTab::Inventory => Some(DatasetQuery::LowStock),
            ReportTab::Warehouse => Some(DatasetQuery::Warehouse),
            ReportTab::Maintenance => Some(DatasetQuery::Maintenance),
            ReportTab::Analysis => Some(DatasetQuery::Analysis {
                granularity: self.granularity,
            }),
        }
    }

    /// タイトル・ファイル名に出す絞り込み条件
    pub fn scope(&self) -> ReportScope {
        let (year, month) = self.tasting_period();
        ReportScope {
            event_type_name: self.event_type_name(),
            year: Some(year),
            month: Some(month),
            granularity: self.granularity,
        }
    }

    // ============================================
    // 状態遷移
    // ============================================

    fn state_mut(&mut self, tab: ReportTab) -> &mut TabState {
        self.tabs.entry(tab).or_insert_with(|| TabState::idle(tab))
    }

    /// データセットを丸ごと置き換える（選択解除・チャート再登録）
    fn replace_dataset(&mut self, tab: ReportTab, dataset: ReportDataset) {
        self.selections.remove(&tab);
        let specs = dataset.chart_specs();
        let old_keys = self.chart_keys.remove(&tab).unwrap_or_default();
        let new_keys: Vec<ChartKey> = specs.iter().map(|(key, _)| key.clone()).collect();
        self.charts.remount(|key| old_keys.contains(key), specs);
        self.chart_keys.insert(tab, new_keys);

        let state = self.state_mut(tab);
        state.dataset = dataset;
        state.status = TabStatus::Loaded;
    }

    /// 取得を開始する。取得不要（種別未選択のイベント）なら空で Loaded にして `None`
    pub fn begin_load(&mut self, tab: ReportTab) -> Option<LoadTicket> {
        let Some(query) = self.query_for(tab) else {
            debug!("{}: 取得条件なし", tab);
            self.replace_dataset(tab, ReportDataset::empty(tab));
            self.state_mut(tab).last_notice = None;
            return None;
        };

        self.next_request += 1;
        let request = self.next_request;
        self.state_mut(tab).status = TabStatus::Loading { request };
        debug!("{}: 取得開始 #{}", tab, request);
        Some(LoadTicket { tab, request, query })
    }

    /// 取得結果を反映する。待っている番号と違えば捨てる
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<ReportDataset, FetchError>,
    ) -> LoadResolution {
        let tab = ticket.tab;
        let current = self.tabs.get(&tab).map(|s| s.status);
        if current != Some(TabStatus::Loading { request: ticket.request }) {
            debug!("{}: 古い取得結果を破棄 #{}", tab, ticket.request);
            return LoadResolution::Stale;
        }

        let result = result.and_then(|dataset| {
            if dataset.tab() == tab {
                Ok(dataset)
            } else {
                Err(FetchError::Decode(format!("{}に{}のデータが返されました", tab, dataset.tab())))
            }
        });

        match result {
            Ok(dataset) => {
                info!("{}: {}件読み込み", tab, dataset.len());
                self.replace_dataset(tab, dataset);
                self.state_mut(tab).last_notice = None;
                LoadResolution::Applied
            }
            Err(e) => {
                warn!("{}: 取得失敗: {}", tab, e);
                self.replace_dataset(tab, ReportDataset::empty(tab));
                let notice = Notice {
                    tab,
                    message: fetch_failure_message(tab).to_string(),
                };
                self.state_mut(tab).last_notice = Some(notice.clone());
                LoadResolution::Failed(notice)
            }
        }
    }

    /// 取得して反映（取得不要なら `None`）
    pub async fn load(&mut self, tab: ReportTab) -> Option<LoadResolution> {
        let ticket = self.begin_load(tab)?;
        let result = self.fetcher.fetch(&ticket.query).await;
        Some(self.finish_load(ticket, result))
    }

    /// タブ切り替えの唯一の入口。読み込み済みなら取得しない
    pub async fn select_tab(&mut self, tab: ReportTab) -> Option<LoadResolution> {
        // 他のタブの取得中・読み込み済みデータはそのまま残す
        self.active = Some(tab);

        match self.status(tab) {
            TabStatus::Idle => self.load(tab).await,
            _ => None,
        }
    }

    /// 明示的な再取得（条件変更後など）
    pub async fn requery(&mut self, tab: ReportTab) -> Option<LoadResolution> {
        self.load(tab).await
    }

    // ============================================
    // 参照
    // ============================================

    pub fn state(&self, tab: ReportTab) -> Option<&TabState> {
        self.tabs.get(&tab)
    }

    pub fn status(&self, tab: ReportTab) -> TabStatus {
        self.tabs.get(&tab).map(|s| s.status).unwrap_or(TabStatus::Idle)
    }

    pub fn dataset(&self, tab: ReportTab) -> Option<&ReportDataset> {
        self.tabs.get(&tab).map(|s| &s.dataset)
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    // ============================================
    // 選択
    // ============================================

    /// 詳細出力の対象を選ぶ（現在のデータにあるIDのみ）
    pub fn select_record(&mut self, tab: ReportTab, id: RecordId) -> Result<()> {
        if !tab.is_selectable() {
            return Err(ReportError::NoSelection(format!("{}は選択できません", tab)));
        }
        let found = self.dataset(tab).map(|ds| ds.contains_record(&id)).unwrap_or(false);
        if !found {
            return Err(ReportError::NoSelection(format!("{}: ID {} は読み込まれていません", tab, id)));
        }
        self.selections.insert(tab, id);
        Ok(())
    }

    pub fn clear_selection(&mut self, tab: ReportTab) {
        self.selections.remove(&tab);
    }

    pub fn selection(&self, tab: ReportTab) -> Option<&RecordId> {
        self.selections.get(&tab)
    }

    // ============================================
    // イベント種別
    // ============================================

    /// 種別一覧は最初の1回だけ取得する
    pub async fn load_event_types(&mut self) -> std::result::Result<&[EventType], FetchError> {
        if self.event_types.is_empty() {
            self.event_types = self.fetcher.event_types().await?;
            debug!("イベント種別: {}件", self.event_types.len());
        }
        Ok(&self.event_types)
    }

    pub fn event_types(&self) -> &[EventType] {
        &self.event_types
    }

    fn event_type_name(&self) -> Option<String> {
        let id = self.event_type.as_ref()?;
        self.event_types
            .iter()
            .find(|t| &t.id == id)
            .map(|t| t.nombre.clone())
    }

    // ============================================
    // 出力
    // ============================================

    /// 現在のデータで出力する。出力対象が無ければ `Ok(None)`
    pub async fn export(
        &self,
        kind: ReportKind,
        format: &ExportFormat,
        output_dir: &Path,
    ) -> std::result::Result<Option<ExportOutcome>, Notice> {
        let tab = kind.tab();
        let Some(dataset) = self.dataset(tab) else {
            return Ok(None);
        };
        let selection = self.selection(tab);
        let scope = self.scope();

        let Some(stem) = file_stem(kind, dataset, selection, &scope, &self.ctx) else {
            debug!("{}: 選択なしのため出力しない", kind);
            return Ok(None);
        };

        let mut outcome = ExportOutcome::default();

        if matches!(format, ExportFormat::Pdf | ExportFormat::Both) {
            let Some(plan) = plan_for(kind, dataset, selection, &scope, &self.ctx) else {
                debug!("{}: 出力対象なし", kind);
                return Ok(None);
            };

            let rasterizer = self.charts.rasterizer();
            let mut composer = PageComposer::new(self.layout.clone());
            composer.add_title(&plan.header);
            for section in &plan.sections {
                composer.add_section(section, &rasterizer);
                tokio::task::yield_now().await;
            }
            let layout = composer.finish(plan.footers);
            outcome.degraded_charts = layout.degraded.clone();

            let path = output_path_for_format(output_dir, &stem, "pdf");
            pdf::generate_pdf(&layout, &plan.title, &path).map_err(|e| self.export_failure(tab, e, PDF_ERROR_MESSAGE))?;
            info!("PDF出力: {} ({}ページ)", path.display(), layout.page_count());
            outcome.files.push(path);
        }

        if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
            let Some(spec) = workbook_for(kind, dataset, selection, &scope, &self.ctx) else {
                debug!("{}: 出力対象なし", kind);
                return Ok(None);
            };

            let path = output_path_for_format(output_dir, &stem, "xlsx");
            excel::generate_excel(&spec, &path).map_err(|e| self.export_failure(tab, e, EXCEL_ERROR_MESSAGE))?;
            info!("Excel出力: {}", path.display());
            outcome.files.push(path);
        }

        Ok(Some(outcome))
    }

    fn export_failure(&self, tab: ReportTab, error: ReportError, message: &str) -> Notice {
        warn!("{}: 出力失敗: {}", tab, error);
        Notice {
            tab,
            message: message.to_string(),
        }
    }
}
