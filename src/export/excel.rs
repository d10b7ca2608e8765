//! Excel生成（CLI版）
//!
//! 書式は共通ライブラリの `SheetEngine` をプロセス内で1つだけ作って使い回す。

use crate::error::{ReportError, Result};
use crate::export::write_atomic;
use banquet_reports_common::export::excel_core::{generate_workbook_buffer, SheetEngine};
use banquet_reports_common::export::sheet::WorkbookSpec;
use lazy_static::lazy_static;
use std::path::Path;

lazy_static! {
    static ref SHEET_ENGINE: SheetEngine = {
        log::debug!("シートエンジンを初期化");
        SheetEngine::new()
    };
}

pub fn render_workbook(spec: &WorkbookSpec) -> Result<Vec<u8>> {
    generate_workbook_buffer(spec, &SHEET_ENGINE).map_err(ReportError::ExcelGeneration)
}

pub fn generate_excel(spec: &WorkbookSpec, output_path: &Path) -> Result<()> {
    let bytes = render_workbook(spec)?;
    write_atomic(output_path, &bytes)
}
