//! 帳票ごとのPDF構成
//!
//! タイトル・サブタイトル・セクション（見出し / チャート / 表）の並びを決める。
//! 組版そのものは `export::pdf_core` が行う。

use super::{ReportContext, ReportDataset, ReportKind, ReportScope};
use crate::aggregator::busiest_period;
use crate::chart::ChartKey;
use crate::export::pdf_core::{Block, DocumentPlan, Section, TableBlock, TextBlock, TitleBlock};
use crate::format::{
    format_percentage, format_time, or_placeholder, PLACEHOLDER_CATEGORY, PLACEHOLDER_NA, PLACEHOLDER_WAREHOUSE,
};
use crate::types::{
    Event, EventAnalysis, FurnitureAssignment, InventoryItem, MaintenanceEntry, RecordId, Tasting, WarehouseReport,
};

pub const EVENTS_COLUMNS: [&str; 5] = ["Nombre del Evento", "Responsable", "Cantidad de Personas", "Lugar", "Fecha"];
pub const TASTINGS_COLUMNS: [&str; 5] = ["Nombre", "Fecha", "Hora", "Responsable", "Alimentos"];
pub const FURNITURE_COLUMNS: [&str; 3] = ["Categoría", "Producto", "Cantidad"];
pub const LOW_STOCK_COLUMNS: [&str; 4] = ["Categoría", "Nombre", "Cantidad Actual", "Bodega"];
pub const MAINTENANCE_COLUMNS: [&str; 5] = ["Categoría", "Nombre", "Cantidad", "Estado", "Bodega"];
pub const WAREHOUSE_COLUMNS: [&str; 3] = ["Categoría", "Cantidad", "Porcentaje"];
pub const ANALYSIS_COLUMNS: [&str; 3] = ["Período", "Cantidad", "Porcentaje"];

/// 家具が割り当てられていない場合の行
fn no_furniture_row() -> Vec<String> {
    vec!["-".to_string(), "Sin mobiliario asignado".to_string(), "-".to_string()]
}

fn furniture_rows(assignments: &[FurnitureAssignment]) -> Vec<Vec<String>> {
    if assignments.is_empty() {
        return vec![no_furniture_row()];
    }
    assignments
        .iter()
        .map(|a| {
            vec![
                or_placeholder(&a.content_type_name, PLACEHOLDER_NA).to_string(),
                or_placeholder(&a.producto_nombre, PLACEHOLDER_NA).to_string(),
                a.cantidad.to_string(),
            ]
        })
        .collect()
}

fn furniture_section(assignments: &[FurnitureAssignment]) -> Section {
    Section::new(vec![
        Block::Text(TextBlock::body(vec!["Mobiliario Utilizado:".to_string()])),
        Block::Table(TableBlock::new(&FURNITURE_COLUMNS, furniture_rows(assignments))),
    ])
}

fn single_table(columns: &[&str], rows: Vec<Vec<String>>) -> Vec<Section> {
    vec![Section::new(vec![Block::Table(TableBlock::new(columns, rows))])]
}

/// イベント一覧
pub fn events_plan(events: &[Event], event_type_name: &str, ctx: &ReportContext) -> DocumentPlan {
    let title = format!("Reporte de Eventos - {}", event_type_name);
    let rows = events
        .iter()
        .map(|e| {
            vec![
                e.nombre.clone(),
                e.responsable.clone(),
                e.cantidad_personas.to_string(),
                e.lugar.clone(),
                ctx.format_date(&e.fecha_inicio),
            ]
        })
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(title, vec![ctx.generated_label()]),
        sections: single_table(&EVENTS_COLUMNS, rows),
        footers: false,
    }
}

/// イベント詳細
pub fn event_detail_plan(event: &Event, ctx: &ReportContext) -> DocumentPlan {
    let title = format!("Reporte de Evento: {}", event.nombre);
    let lines = vec![
        format!("Responsable: {}", event.responsable),
        format!("Tipo de Evento: {}", or_placeholder(&event.tipo_evento_nombre, PLACEHOLDER_NA)),
        format!("Fecha: {}", ctx.format_date(&event.fecha_inicio)),
        format!("Lugar: {}", event.lugar),
        format!("Cantidad de Personas: {}", event.cantidad_personas),
    ];

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::plain(title, lines),
        sections: vec![furniture_section(&event.mobiliario_asignado)],
        footers: false,
    }
}

/// 試食会一覧（対象年月つき）
pub fn tastings_plan(tastings: &[Tasting], year: i32, month: u32, ctx: &ReportContext) -> DocumentPlan {
    let title = "Reporte de Degustaciones".to_string();
    let rows = tastings
        .iter()
        .map(|t| {
            vec![
                t.nombre.clone(),
                ctx.format_date(&t.fecha_degustacion),
                format_time(&t.hora_degustacion),
                t.responsable.clone(),
                t.alimentos.clone(),
            ]
        })
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(
            title,
            vec![ctx.generated_label(), format!("Período: {}/{}", month, year)],
        ),
        sections: single_table(&TASTINGS_COLUMNS, rows),
        footers: false,
    }
}

/// 試食会詳細
pub fn tasting_detail_plan(tasting: &Tasting, ctx: &ReportContext) -> DocumentPlan {
    let title = format!("Reporte de Degustación: {}", tasting.nombre);
    let lines = vec![
        format!("Responsable: {}", tasting.responsable),
        format!("Fecha: {}", ctx.format_date(&tasting.fecha_degustacion)),
        format!("Hora: {}", format_time(&tasting.hora_degustacion)),
        format!("Alimentos: {}", tasting.alimentos),
    ];

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::plain(title, lines),
        sections: vec![furniture_section(&tasting.mobiliario_asignado)],
        footers: false,
    }
}

/// 低在庫
pub fn low_stock_plan(items: &[InventoryItem], ctx: &ReportContext) -> DocumentPlan {
    let title = "Reporte de Inventario - Bajo Stock".to_string();
    let rows = items
        .iter()
        .map(|i| {
            vec![
                or_placeholder(&i.categoria, PLACEHOLDER_CATEGORY).to_string(),
                i.nombre.clone(),
                i.cantidad_actual.to_string(),
                or_placeholder(&i.bodega_nombre, PLACEHOLDER_WAREHOUSE).to_string(),
            ]
        })
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(title, vec![ctx.generated_label()]),
        sections: single_table(&LOW_STOCK_COLUMNS, rows),
        footers: true,
    }
}

/// 倉庫別在庫。倉庫ごとに 見出し → チャート → 表 のセクションを作る
///
/// 数量0のカテゴリは表に出さない。表が空になる倉庫は表ごと省略する。
pub fn warehouse_plan(report: &WarehouseReport, ctx: &ReportContext) -> DocumentPlan {
    let title = "Reporte de Inventario por Bodega".to_string();
    let sections = report
        .warehouses
        .iter()
        .map(|w| {
            let mut blocks = vec![
                Block::Text(TextBlock::heading(format!(
                    "{} - {}% del inventario total",
                    or_placeholder(&w.nombre, PLACEHOLDER_WAREHOUSE),
                    w.percentage
                ))),
                Block::Chart(ChartKey::warehouse(&w.id)),
            ];
            let rows: Vec<Vec<String>> = w
                .stocked_categories()
                .map(|c| {
                    vec![
                        or_placeholder(&c.categoria, PLACEHOLDER_CATEGORY).to_string(),
                        c.cantidad.to_string(),
                        format_percentage(c.percentage),
                    ]
                })
                .collect();
            if !rows.is_empty() {
                blocks.push(Block::Table(TableBlock::new(&WAREHOUSE_COLUMNS, rows)));
            }
            Section::new(blocks)
        })
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(
            title,
            vec![
                ctx.generated_label(),
                format!("Inventario Total: {} unidades", report.total_inventory),
            ],
        ),
        sections,
        footers: false,
    }
}

/// 保守中の家具
pub fn maintenance_plan(entries: &[MaintenanceEntry], ctx: &ReportContext) -> DocumentPlan {
    let title = "Reporte de Mantenimiento - Mobiliario".to_string();
    let rows = entries
        .iter()
        .map(|m| {
            vec![
                or_placeholder(&m.categoria, PLACEHOLDER_CATEGORY).to_string(),
                m.nombre.clone(),
                m.cantidad_en_mantenimiento.to_string(),
                m.estado.clone(),
                or_placeholder(&m.bodega_nombre, PLACEHOLDER_WAREHOUSE).to_string(),
            ]
        })
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(title, vec![ctx.generated_label(), "Últimos 30 días".to_string()]),
        sections: single_table(&MAINTENANCE_COLUMNS, rows),
        footers: true,
    }
}

/// 期間分析
pub fn analysis_plan(analysis: &EventAnalysis, ctx: &ReportContext) -> DocumentPlan {
    let title = "Análisis de Eventos por Período".to_string();
    let mut lines = vec![
        ctx.generated_label(),
        format!("Tipo de período: {}", analysis.granularity.label()),
        format!("Total de eventos: {}", analysis.total_events),
    ];
    if let Some(top) = busiest_period(&analysis.periods) {
        lines.push(format!("Período con más eventos: {} ({} eventos)", top.period, top.count));
    }

    let rows = analysis
        .periods
        .iter()
        .map(|p| vec![p.period.clone(), p.count.to_string(), format_percentage(p.percentage)])
        .collect();

    DocumentPlan {
        title: title.clone(),
        header: TitleBlock::muted(title, lines),
        sections: vec![Section::new(vec![
            Block::Chart(ChartKey::event_analysis()),
            Block::Table(TableBlock::new(&ANALYSIS_COLUMNS, rows)),
        ])],
        footers: true,
    }
}

/// 種類・データセット・選択から構成を決める
///
/// 詳細で選択が無い（またはデータに無い）場合、倉庫・分析でデータが空の場合は `None`。
pub fn plan_for(
    kind: ReportKind,
    dataset: &ReportDataset,
    selection: Option<&RecordId>,
    scope: &ReportScope,
    ctx: &ReportContext,
) -> Option<DocumentPlan> {
    match (kind, dataset) {
        (ReportKind::Events, ReportDataset::Events(events)) => Some(events_plan(
            events,
            scope.event_type_name.as_deref().unwrap_or(""),
            ctx,
        )),
        (ReportKind::EventDetail, ds @ ReportDataset::Events(_)) => {
            selection.and_then(|id| ds.find_event(id)).map(|e| event_detail_plan(e, ctx))
        }
        (ReportKind::Tastings, ReportDataset::Tastings(tastings)) => {
            let (year, month) = scope_period(scope, ctx);
            Some(tastings_plan(tastings, year, month, ctx))
        }
        (ReportKind::TastingDetail, ds @ ReportDataset::Tastings(_)) => {
            selection.and_then(|id| ds.find_tasting(id)).map(|t| tasting_detail_plan(t, ctx))
        }
        (ReportKind::Inventory, ReportDataset::Inventory(items)) => Some(low_stock_plan(items, ctx)),
        (ReportKind::Warehouse, ReportDataset::Warehouse(report)) if !report.is_empty() => {
            Some(warehouse_plan(report, ctx))
        }
        (ReportKind::Maintenance, ReportDataset::Maintenance(entries)) => Some(maintenance_plan(entries, ctx)),
        (ReportKind::Analysis, ReportDataset::Analysis(analysis)) if !analysis.is_empty() => {
            Some(analysis_plan(analysis, ctx))
        }
        _ => None,
    }
}

/// 試食会の対象年月（未指定なら生成日の年月）
pub fn scope_period(scope: &ReportScope, ctx: &ReportContext) -> (i32, u32) {
    use chrono::Datelike;
    (
        scope.year.unwrap_or_else(|| ctx.generated_on.year()),
        scope.month.unwrap_or_else(|| ctx.generated_on.month()),
    )
}
