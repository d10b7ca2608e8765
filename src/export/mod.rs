pub mod pdf;
pub mod excel;

use crate::error::Result;
use banquet_reports_common::report::document::scope_period;
use banquet_reports_common::report::{ReportContext, ReportDataset, ReportKind, ReportScope};
use banquet_reports_common::types::RecordId;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    /// 英数字（アクセント付き含む）以外の連続
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// レコード名をファイル名用に整える（記号・空白の連続を `_` に、前後の `_` は除去）
pub fn sanitize_name(name: &str) -> String {
    NON_ALNUM.replace_all(name.trim(), "_").trim_matches('_').to_string()
}

/// 拡張子を除いたファイル名
///
/// 詳細帳票で選択レコードが見つからない場合は `None`。
pub fn file_stem(
    kind: ReportKind,
    dataset: &ReportDataset,
    selection: Option<&RecordId>,
    scope: &ReportScope,
    ctx: &ReportContext,
) -> Option<String> {
    let date = ctx.file_date();
    let stem = match kind {
        ReportKind::Events => format!("reporte_eventos_{}", date),
        ReportKind::EventDetail => {
            let event = selection.and_then(|id| dataset.find_event(id))?;
            format!("reporte_evento_{}_{}", sanitize_name(&event.nombre), date)
        }
        ReportKind::Tastings => {
            let (year, month) = scope_period(scope, ctx);
            format!("reporte_degustaciones_{}_{}", month, year)
        }
        ReportKind::TastingDetail => {
            let tasting = selection.and_then(|id| dataset.find_tasting(id))?;
            format!("reporte_degustacion_{}_{}", sanitize_name(&tasting.nombre), date)
        }
        ReportKind::Inventory => format!("inventario_bajo_stock_{}", date),
        ReportKind::Warehouse => format!("reporte_inventario_bodegas_{}", date),
        ReportKind::Maintenance => format!("reporte_mantenimiento_{}", date),
        ReportKind::Analysis => format!("analisis_eventos_{}_{}", scope.granularity.as_str(), date),
    };
    Some(stem)
}

pub fn output_path_for_format(output_dir: &Path, stem: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", stem, extension))
}

/// 全体を書き終えてから所定の名前にする（失敗時はファイルを残さない）
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    if let Err(e) = std::fs::write(&part, bytes) {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&part, path) {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }
    Ok(())
}
