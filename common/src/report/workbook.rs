//! 帳票ごとのシート構成

use super::{ReportContext, ReportDataset, ReportKind, ReportScope};
use crate::export::sheet::{CellValue, SheetBuilder, SheetSpec, WorkbookSpec};
use crate::format::{
    format_percentage, format_time, or_placeholder, PLACEHOLDER_CATEGORY, PLACEHOLDER_NA, PLACEHOLDER_UNDEFINED,
    PLACEHOLDER_WAREHOUSE,
};
use crate::types::{
    Event, EventAnalysis, FurnitureAssignment, InventoryItem, MaintenanceEntry, RecordId, Tasting, WarehouseReport,
};

pub const EVENTS_SHEET: &str = "Eventos";
pub const TASTINGS_SHEET: &str = "Degustaciones";
pub const LOW_STOCK_SHEET: &str = "Inventario Bajo Stock";
pub const MAINTENANCE_SHEET: &str = "Reporte Mantenimiento";
pub const ANALYSIS_SHEET: &str = "Análisis de Eventos";
pub const WAREHOUSE_SHEET: &str = "Inventario por Bodega";
pub const EVENT_DETAIL_SHEET: &str = "Detalles del Evento";
pub const TASTING_DETAIL_SHEET: &str = "Detalles";
pub const FURNITURE_SHEET: &str = "Mobiliario";

fn text(value: &str) -> CellValue {
    CellValue::text(value)
}

/// 家具シート。割当が無ければ作らない
fn furniture_sheet(assignments: &[FurnitureAssignment]) -> Option<SheetSpec> {
    if assignments.is_empty() {
        return None;
    }
    let mut builder = SheetBuilder::new(FURNITURE_SHEET, &["Categoría", "Producto", "Cantidad"]);
    for a in assignments {
        builder.push_row(vec![
            text(or_placeholder(&a.content_type_name, PLACEHOLDER_NA)),
            text(or_placeholder(&a.producto_nombre, PLACEHOLDER_NA)),
            a.cantidad.into(),
        ]);
    }
    Some(builder.build())
}

pub fn events_workbook(events: &[Event], ctx: &ReportContext) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(
        EVENTS_SHEET,
        &["Nombre del Evento", "Responsable", "Cantidad de Personas", "Lugar", "Fecha"],
    );
    for e in events {
        builder.push_row(vec![
            text(&e.nombre),
            text(&e.responsable),
            e.cantidad_personas.into(),
            text(&e.lugar),
            ctx.format_date(&e.fecha_inicio).into(),
        ]);
    }
    WorkbookSpec::new(vec![builder.build()])
}

pub fn event_detail_workbook(event: &Event, ctx: &ReportContext) -> WorkbookSpec {
    let details = SheetBuilder::new(
        EVENT_DETAIL_SHEET,
        &["Nombre del Evento", "Responsable", "Tipo de Evento", "Fecha", "Lugar", "Cantidad de Personas"],
    )
    .row(vec![
        text(&event.nombre),
        text(&event.responsable),
        text(or_placeholder(&event.tipo_evento_nombre, PLACEHOLDER_NA)),
        ctx.format_date(&event.fecha_inicio).into(),
        text(&event.lugar),
        event.cantidad_personas.into(),
    ])
    .build();

    let mut sheets = vec![details];
    sheets.extend(furniture_sheet(&event.mobiliario_asignado));
    WorkbookSpec::new(sheets)
}

pub fn tastings_workbook(tastings: &[Tasting], ctx: &ReportContext) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(TASTINGS_SHEET, &["Nombre", "Fecha", "Hora", "Responsable", "Alimentos"]);
    for t in tastings {
        builder.push_row(vec![
            text(&t.nombre),
            ctx.format_date(&t.fecha_degustacion).into(),
            format_time(&t.hora_degustacion).into(),
            text(&t.responsable),
            text(&t.alimentos),
        ]);
    }
    WorkbookSpec::new(vec![builder.build()])
}

pub fn tasting_detail_workbook(tasting: &Tasting, ctx: &ReportContext) -> WorkbookSpec {
    let details = SheetBuilder::new(TASTING_DETAIL_SHEET, &["Nombre", "Responsable", "Fecha", "Hora", "Alimentos"])
        .row(vec![
            text(&tasting.nombre),
            text(&tasting.responsable),
            ctx.format_date(&tasting.fecha_degustacion).into(),
            format_time(&tasting.hora_degustacion).into(),
            text(&tasting.alimentos),
        ])
        .build();

    let mut sheets = vec![details];
    sheets.extend(furniture_sheet(&tasting.mobiliario_asignado));
    WorkbookSpec::new(sheets)
}

pub fn low_stock_workbook(items: &[InventoryItem]) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(
        LOW_STOCK_SHEET,
        &["Categoría", "Nombre", "Cantidad Actual", "Bodega", "Stock Mínimo"],
    );
    for i in items {
        let minimum = match i.stock_minimo {
            Some(m) => m.into(),
            None => text(PLACEHOLDER_UNDEFINED),
        };
        builder.push_row(vec![
            text(or_placeholder(&i.categoria, PLACEHOLDER_CATEGORY)),
            text(&i.nombre),
            i.cantidad_actual.into(),
            text(or_placeholder(&i.bodega_nombre, PLACEHOLDER_WAREHOUSE)),
            minimum,
        ]);
    }
    WorkbookSpec::new(vec![builder.build()])
}

pub fn maintenance_workbook(entries: &[MaintenanceEntry], ctx: &ReportContext) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(
        MAINTENANCE_SHEET,
        &["Categoría", "Nombre", "Cantidad", "Estado", "Bodega", "Fecha"],
    );
    for m in entries {
        let date = m
            .fecha
            .as_deref()
            .map(|d| ctx.format_date(d))
            .unwrap_or_else(|| PLACEHOLDER_NA.to_string());
        builder.push_row(vec![
            text(or_placeholder(&m.categoria, PLACEHOLDER_CATEGORY)),
            text(&m.nombre),
            m.cantidad_en_mantenimiento.into(),
            text(&m.estado),
            text(or_placeholder(&m.bodega_nombre, PLACEHOLDER_WAREHOUSE)),
            date.into(),
        ]);
    }
    WorkbookSpec::new(vec![builder.build()])
}

pub fn analysis_workbook(analysis: &EventAnalysis) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(ANALYSIS_SHEET, &["Período", "Cantidad de Eventos", "Porcentaje"]);
    for p in &analysis.periods {
        builder.push_row(vec![text(&p.period), p.count.into(), format_percentage(p.percentage).into()]);
    }
    WorkbookSpec::new(vec![builder.build()])
}

/// 倉庫別在庫
///
/// 倉庫ごとに 要約行 → 数量>0のカテゴリ行 → 空行 の順。
pub fn warehouse_workbook(report: &WarehouseReport) -> WorkbookSpec {
    let mut builder = SheetBuilder::new(
        WAREHOUSE_SHEET,
        &["Bodega", "Ubicación", "Total Unidades", "% del Total", "Categoría", "Cantidad", "% en Bodega"],
    );
    for w in &report.warehouses {
        builder.push_row(vec![
            text(or_placeholder(&w.nombre, PLACEHOLDER_WAREHOUSE)),
            text(&w.ubicacion),
            w.total_items.into(),
            format_percentage(w.percentage).into(),
            CellValue::Blank,
            CellValue::Blank,
            CellValue::Blank,
        ]);
        for c in w.stocked_categories() {
            builder.push_row(vec![
                CellValue::Blank,
                CellValue::Blank,
                CellValue::Blank,
                CellValue::Blank,
                text(or_placeholder(&c.categoria, PLACEHOLDER_CATEGORY)),
                c.cantidad.into(),
                format_percentage(c.percentage).into(),
            ]);
        }
        builder.push_blank_row();
    }
    WorkbookSpec::new(vec![builder.build()])
}

/// 種類・データセット・選択からブック構成を決める（`plan_for` と同じ no-op 条件）
pub fn workbook_for(
    kind: ReportKind,
    dataset: &ReportDataset,
    selection: Option<&RecordId>,
    _scope: &ReportScope,
    ctx: &ReportContext,
) -> Option<WorkbookSpec> {
    match (kind, dataset) {
        (ReportKind::Events, ReportDataset::Events(events)) => Some(events_workbook(events, ctx)),
        (ReportKind::EventDetail, ds @ ReportDataset::Events(_)) => {
            selection.and_then(|id| ds.find_event(id)).map(|e| event_detail_workbook(e, ctx))
        }
        (ReportKind::Tastings, ReportDataset::Tastings(tastings)) => Some(tastings_workbook(tastings, ctx)),
        (ReportKind::TastingDetail, ds @ ReportDataset::Tastings(_)) => {
            selection.and_then(|id| ds.find_tasting(id)).map(|t| tasting_detail_workbook(t, ctx))
        }
        (ReportKind::Inventory, ReportDataset::Inventory(items)) => Some(low_stock_workbook(items)),
        (ReportKind::Warehouse, ReportDataset::Warehouse(report)) if !report.is_empty() => {
            Some(warehouse_workbook(report))
        }
        (ReportKind::Maintenance, ReportDataset::Maintenance(entries)) => Some(maintenance_workbook(entries, ctx)),
        (ReportKind::Analysis, ReportDataset::Analysis(analysis)) if !analysis.is_empty() => {
            Some(analysis_workbook(analysis))
        }
        _ => None,
    }
}
