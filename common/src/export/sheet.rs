//! 表計算シートの中立表現
//!
//! ヘッダー行＋データ行。書き出しライブラリには依存しない。

/// セル値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 列幅計算用の表示文字数
    pub fn display_len(&self) -> usize {
        match self {
            CellValue::Text(s) => s.chars().count(),
            CellValue::Number(n) => n.to_string().len(),
            CellValue::Blank => 0,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// 1シート分
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSpec {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetSpec {
    /// 列ごとの最大表示文字数（ヘッダー含む）
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (c, cell) in row.iter().enumerate() {
                let len = cell.display_len();
                match widths.get_mut(c) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

/// ブック全体（シート順を保持）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookSpec {
    pub sheets: Vec<SheetSpec>,
}

impl WorkbookSpec {
    pub fn new(sheets: Vec<SheetSpec>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSpec> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// シート組み立て
pub struct SheetBuilder {
    spec: SheetSpec,
}

impl SheetBuilder {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            spec: SheetSpec {
                name: name.into(),
                headers: headers.iter().map(|h| h.to_string()).collect(),
                rows: Vec::new(),
            },
        }
    }

    pub fn row(mut self, cells: Vec<CellValue>) -> Self {
        self.spec.rows.push(cells);
        self
    }

    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        self.spec.rows.push(cells);
    }

    /// 区切り用の空行
    pub fn push_blank_row(&mut self) {
        let width = self.spec.headers.len();
        self.spec.rows.push(vec![CellValue::Blank; width]);
    }

    pub fn build(self) -> SheetSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_header_when_empty() {
        let sheet = SheetBuilder::new("Eventos", &["Nombre del Evento", "Fecha"]).build();
        assert_eq!(sheet.headers.len(), 2);
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn test_blank_row_width() {
        let mut builder = SheetBuilder::new("Inventario por Bodega", &["A", "B", "C"]);
        builder.push_row(vec!["x".into(), 3u64.into(), CellValue::Blank]);
        builder.push_blank_row();
        let sheet = builder.build();
        assert_eq!(sheet.rows[1], vec![CellValue::Blank; 3]);
    }

    #[test]
    fn test_column_widths() {
        let sheet = SheetBuilder::new("S", &["Nombre", "Cantidad"])
            .row(vec!["Silla Tiffany dorada".into(), 120u64.into()])
            .build();
        assert_eq!(sheet.column_widths(), vec![20, 8]);
    }

    #[test]
    fn test_workbook_lookup() {
        let wb = WorkbookSpec::new(vec![
            SheetBuilder::new("Detalles", &["Campo"]).build(),
            SheetBuilder::new("Mobiliario", &["Categoría"]).build(),
        ]);
        assert_eq!(wb.sheet_names(), vec!["Detalles", "Mobiliario"]);
        assert!(wb.sheet("Mobiliario").is_some());
        assert!(wb.sheet("Eventos").is_none());
    }
}
