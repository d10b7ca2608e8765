//! Excel生成（共通ライブラリ）
//!
//! `WorkbookSpec` を xlsx バイト列に変換する。1行目は太字白抜きのヘッダー。

use crate::export::sheet::{CellValue, SheetSpec, WorkbookSpec};
use rust_xlsxwriter::*;

/// 列幅の下限・上限（文字数）
const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// 書き出しに使う書式一式（プロセス内で1回だけ作って使い回す）
pub struct SheetEngine {
    header_format: Format,
    text_format: Format,
    number_format: Format,
}

impl SheetEngine {
    pub fn new() -> Self {
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x2980B9))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(0xCCCCCC));

        let text_format = Format::new()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter);

        let number_format = Format::new()
            .set_align(FormatAlign::Right)
            .set_num_format("General");

        Self {
            header_format,
            text_format,
            number_format,
        }
    }

    fn write_sheet(&self, worksheet: &mut Worksheet, sheet: &SheetSpec) -> Result<(), String> {
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;

        for (c, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, c as u16, header, &self.header_format)
                .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let row_idx = (r + 1) as u32;
            for (c, cell) in row.iter().enumerate() {
                let col = c as u16;
                match cell {
                    CellValue::Text(s) => {
                        worksheet
                            .write_string_with_format(row_idx, col, s, &self.text_format)
                            .map_err(|e| format!("セル書き込みエラー: {}", e))?;
                    }
                    CellValue::Number(n) => {
                        worksheet
                            .write_number_with_format(row_idx, col, *n, &self.number_format)
                            .map_err(|e| format!("セル書き込みエラー: {}", e))?;
                    }
                    CellValue::Blank => {}
                }
            }
        }

        for (c, width) in sheet.column_widths().iter().enumerate() {
            let width = (*width as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
            worksheet
                .set_column_width(c as u16, width)
                .map_err(|e| format!("列幅設定エラー: {}", e))?;
        }

        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

        Ok(())
    }
}

impl Default for SheetEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Excelをバッファに生成
///
/// シート順は `spec.sheets` の順。シートが1枚も無い場合はエラー。
pub fn generate_workbook_buffer(spec: &WorkbookSpec, engine: &SheetEngine) -> Result<Vec<u8>, String> {
    if spec.sheets.is_empty() {
        return Err("シートがありません".to_string());
    }

    let mut workbook = Workbook::new();
    for sheet in &spec.sheets {
        let worksheet = workbook.add_worksheet();
        engine.write_sheet(worksheet, sheet)?;
    }

    // バッファに書き出し
    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
