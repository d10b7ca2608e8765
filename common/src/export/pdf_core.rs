//! PDF export core utilities shared by the CLI and tests.
//!
//! ページ組版（縦カーソル・改ページ・フッター）を行い、描画ライブラリに
//! 依存しない `PageLayout`（配置済み要素の列）を返す。座標は mm、
//! Y はページ上端からの距離。

use crate::chart::{Bitmap, ChartKey, ChartRasterizer};
use crate::layout::{
    PdfLayout, ACCENT_RGB, BLACK_RGB, FOOTER_FONT_PT, HEADING_FONT_PT, IMAGE_GAP_MM, MUTED_RGB,
    STRIPE_RGB, SUBTITLE_FIRST_GAP_MM, SUBTITLE_FONT_PT, SUBTITLE_STEP_MM, TABLE_GAP_MM,
    TEXT_LINE_MM, TITLE_FONT_PT, TITLE_Y_MM, WHITE_RGB,
};

// ============================================
// 配置済み要素
// ============================================

/// テキスト（y はベースライン）
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub bold: bool,
    pub color: [u8; 3],
    pub text: String,
}

/// 塗りつぶし矩形（y は上端）
#[derive(Debug, Clone, PartialEq)]
pub struct RectElement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub fill: [u8; 3],
}

/// 画像（y は上端、image は `PageLayout::images` の添字）
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub image: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextElement),
    Rect(RectElement),
    Image(ImageElement),
}

/// 1ページ分の要素
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub number: usize,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Image(i) => Some(i),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.text.contains(needle))
    }
}

/// 組版結果
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub pages: Vec<Page>,
    pub images: Vec<Bitmap>,
    /// ラスタライズできず省略したチャート
    pub degraded: Vec<ChartKey>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ============================================
// 入力ブロック
// ============================================

/// 1ページ目先頭のタイトルとサブタイトル
#[derive(Debug, Clone)]
pub struct TitleBlock {
    pub title: String,
    pub lines: Vec<String>,
    pub line_color: [u8; 3],
}

impl TitleBlock {
    /// 一覧系（サブタイトルは灰色）
    pub fn muted(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
            line_color: MUTED_RGB,
        }
    }

    /// 詳細系（サブタイトルは黒）
    pub fn plain(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
            line_color: BLACK_RGB,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub size_pt: f32,
    pub color: [u8; 3],
}

impl TextBlock {
    /// セクション見出し（14pt）
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            size_pt: HEADING_FONT_PT,
            color: BLACK_RGB,
        }
    }

    /// 本文（12pt）
    pub fn body(lines: Vec<String>) -> Self {
        Self {
            lines,
            size_pt: SUBTITLE_FONT_PT,
            color: BLACK_RGB,
        }
    }

    pub fn extent_mm(&self) -> f32 {
        self.lines.len() as f32 * TEXT_LINE_MM
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn new(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Text(TextBlock),
    Chart(ChartKey),
    Table(TableBlock),
}

/// 繰り返し単位（倉庫1件分など）
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// 帳票1件分の構成
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    /// PDFメタデータのタイトル
    pub title: String,
    pub header: TitleBlock,
    pub sections: Vec<Section>,
    /// "Página N de TOTAL" を入れるか
    pub footers: bool,
}

// ============================================
// 組版
// ============================================

/// 縦カーソルで要素を流し込むページ組版器
pub struct PageComposer {
    layout: PdfLayout,
    pages: Vec<Page>,
    cursor_mm: f32,
    images: Vec<Bitmap>,
    degraded: Vec<ChartKey>,
}

impl PageComposer {
    pub fn new(layout: PdfLayout) -> Self {
        let cursor_mm = layout.top_margin_mm;
        Self {
            layout,
            pages: vec![Page { number: 1, elements: Vec::new() }],
            cursor_mm,
            images: Vec::new(),
            degraded: Vec::new(),
        }
    }

    pub fn cursor_mm(&self) -> f32 {
        self.cursor_mm
    }

    /// 現在のページ番号（1始まり）
    pub fn current_page(&self) -> usize {
        self.pages.len()
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn text(&mut self, x_mm: f32, y_mm: f32, size_pt: f32, bold: bool, color: [u8; 3], text: String) {
        self.push(Element::Text(TextElement { x_mm, y_mm, size_pt, bold, color, text }));
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page { number, elements: Vec::new() });
        self.cursor_mm = self.layout.top_margin_mm;
    }

    /// 残り高さに extent が収まらなければ改ページ
    fn ensure_space(&mut self, extent_mm: f32) {
        if self.cursor_mm + extent_mm > self.layout.bottom_limit_mm {
            self.new_page();
        }
    }

    /// タイトル・生成日などを1ページ目の先頭に出力
    pub fn add_title(&mut self, title: &TitleBlock) {
        let x = self.layout.margin_left_mm;
        self.text(x, TITLE_Y_MM, TITLE_FONT_PT, false, BLACK_RGB, title.title.clone());

        let mut y = TITLE_Y_MM;
        for (i, line) in title.lines.iter().enumerate() {
            y += if i == 0 { SUBTITLE_FIRST_GAP_MM } else { SUBTITLE_STEP_MM };
            self.text(x, y, SUBTITLE_FONT_PT, false, title.line_color, line.clone());
        }
        self.cursor_mm = y + SUBTITLE_STEP_MM;
    }

    /// セクションを現在位置から流し込む（ページ番号はリセットしない）
    pub fn add_section(&mut self, section: &Section, rasterizer: &dyn ChartRasterizer) {
        for block in &section.blocks {
            self.add_block(block, rasterizer);
        }
    }

    pub fn add_block(&mut self, block: &Block, rasterizer: &dyn ChartRasterizer) {
        match block {
            Block::Text(text) => self.add_text(text),
            Block::Chart(key) => self.add_chart(key, rasterizer),
            Block::Table(table) => self.add_table(table),
        }
    }

    /// 1ページの本文領域の高さ
    fn page_capacity_mm(&self) -> f32 {
        self.layout.bottom_limit_mm - self.layout.top_margin_mm
    }

    /// 1ページに収まるブロックは分けない。収まらなければ行単位で次ページへ流す
    pub fn add_text(&mut self, block: &TextBlock) {
        if block.lines.is_empty() {
            return;
        }
        let keep_together = block.extent_mm() <= self.page_capacity_mm();
        if keep_together {
            self.ensure_space(block.extent_mm());
        }
        let x = self.layout.margin_left_mm;
        for line in &block.lines {
            if !keep_together {
                self.ensure_space(TEXT_LINE_MM);
            }
            let baseline = self.cursor_mm + TEXT_LINE_MM * 0.75;
            self.text(x, baseline, block.size_pt, false, block.color, line.clone());
            self.cursor_mm += TEXT_LINE_MM;
        }
    }

    /// チャートをラスタライズして配置。失敗時はそのチャートだけ省略する
    pub fn add_chart(&mut self, key: &ChartKey, rasterizer: &dyn ChartRasterizer) {
        match rasterizer.rasterize(key) {
            Ok(bitmap) if bitmap.width > 0 && bitmap.height > 0 => self.add_image(bitmap),
            Ok(_) => {
                log::warn!("空のビットマップのためチャートを省略: {}", key);
                self.degraded.push(key.clone());
            }
            Err(e) => {
                log::warn!("チャートを省略: {}", e);
                self.degraded.push(key.clone());
            }
        }
    }

    /// 画像は分割しない。入らなければ丸ごと次ページへ送る
    pub fn add_image(&mut self, bitmap: Bitmap) {
        let max_height = self.layout.bottom_limit_mm - self.layout.top_margin_mm;
        let mut width = self.layout.image_width_mm;
        let mut height = width * bitmap.aspect_ratio();
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_space(height);

        let image = self.images.len();
        self.images.push(bitmap);
        self.push(Element::Image(ImageElement {
            x_mm: self.layout.image_x_mm,
            y_mm: self.cursor_mm,
            width_mm: width,
            height_mm: height,
            image,
        }));
        self.cursor_mm += height + IMAGE_GAP_MM;
    }

    /// 表は行単位で自動改ページし、各ページにヘッダーを繰り返す
    ///
    /// ヘッダーと合わせて1ページに入らない行だけは、折り返した行の途中で分けて続きを次ページに出す。
    pub fn add_table(&mut self, table: &TableBlock) {
        let columns = table.headers.len().max(1);
        let col_width = self.layout.usable_width_mm() / columns as f32;
        let max_chars = self.layout.chars_per_width(col_width);
        let line_mm = self.layout.table_line_mm();
        let padding = self.layout.cell_padding_mm;

        let wrap_row = |cells: &[String]| -> Vec<Vec<String>> {
            cells.iter().map(|c| wrap_text(c, max_chars)).collect()
        };
        let row_height = |wrapped: &[Vec<String>]| -> f32 {
            let lines = wrapped.iter().map(|c| c.len()).max().unwrap_or(1).max(1);
            lines as f32 * line_mm + padding * 2.0
        };

        let header = wrap_row(&table.headers);
        let header_height = row_height(&header);
        let max_lines = ((self.page_capacity_mm() - header_height - padding * 2.0) / line_mm)
            .floor()
            .max(1.0) as usize;

        // (縞模様の判定に使う元の行番号, 1ページに収まる断片)
        let pieces: Vec<(usize, Vec<Vec<String>>)> = table
            .rows
            .iter()
            .enumerate()
            .flat_map(|(i, r)| split_row(wrap_row(r), max_lines).into_iter().map(move |piece| (i, piece)))
            .collect();

        // ヘッダーだけがページ末尾に残らないようにする
        let first_row_height = pieces.first().map(|(_, r)| row_height(r)).unwrap_or(0.0);
        self.ensure_space(header_height + first_row_height);

        self.draw_table_row(&header, header_height, col_width, true, false);

        let mut rows_on_page = 0usize;
        for (i, row) in &pieces {
            let height = row_height(row);
            if rows_on_page > 0 && self.cursor_mm + height > self.layout.bottom_limit_mm {
                self.new_page();
                self.draw_table_row(&header, header_height, col_width, true, false);
                rows_on_page = 0;
            }
            self.draw_table_row(row, height, col_width, false, i % 2 == 1);
            rows_on_page += 1;
        }

        self.cursor_mm += TABLE_GAP_MM;
    }

    fn draw_table_row(&mut self, cells: &[Vec<String>], height: f32, col_width: f32, header: bool, striped: bool) {
        let x0 = self.layout.margin_left_mm;
        let y = self.cursor_mm;
        let padding = self.layout.cell_padding_mm;
        let line_mm = self.layout.table_line_mm();
        let font = self.layout.table_font_pt;

        let fill = if header {
            Some(ACCENT_RGB)
        } else if striped {
            Some(STRIPE_RGB)
        } else {
            None
        };
        if let Some(fill) = fill {
            self.push(Element::Rect(RectElement {
                x_mm: x0,
                y_mm: y,
                width_mm: col_width * cells.len().max(1) as f32,
                height_mm: height,
                fill,
            }));
        }

        let color = if header { WHITE_RGB } else { BLACK_RGB };
        for (c, lines) in cells.iter().enumerate() {
            let x = x0 + c as f32 * col_width + padding;
            for (k, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = y + padding + (k + 1) as f32 * line_mm - line_mm * 0.25;
                self.text(x, baseline, font, header, color, line.clone());
            }
        }
        self.cursor_mm += height;
    }

    /// 組版を終了。footers が真なら全ページ確定後に "Página N de TOTAL" を入れる
    pub fn finish(mut self, footers: bool) -> PageLayout {
        if footers {
            let total = self.pages.len();
            let x = self.layout.margin_left_mm;
            let y = self.layout.footer_y_mm;
            for page in &mut self.pages {
                page.elements.push(Element::Text(TextElement {
                    x_mm: x,
                    y_mm: y,
                    size_pt: FOOTER_FONT_PT,
                    bold: false,
                    color: BLACK_RGB,
                    text: footer_text(page.number, total),
                }));
            }
        }

        PageLayout {
            page_width_mm: self.layout.page_width_mm,
            page_height_mm: self.layout.page_height_mm,
            pages: self.pages,
            images: self.images,
            degraded: self.degraded,
        }
    }
}

/// 折り返し済みの行を max_lines 行ずつの断片に分ける（収まる行はそのまま）
fn split_row(row: Vec<Vec<String>>, max_lines: usize) -> Vec<Vec<Vec<String>>> {
    let lines = row.iter().map(|cell| cell.len()).max().unwrap_or(0);
    if lines <= max_lines {
        return vec![row];
    }
    (0..lines)
        .step_by(max_lines)
        .map(|start| {
            row.iter()
                .map(|cell| cell.iter().skip(start).take(max_lines).cloned().collect())
                .collect()
        })
        .collect()
}

/// ページフッター文言
pub fn footer_text(page: usize, total: usize) -> String {
    format!("Página {} de {}", page, total)
}

/// 帳票全体を同期的に組版する（セクション間で制御を返さない版）
pub fn compose_document(plan: &DocumentPlan, layout: PdfLayout, rasterizer: &dyn ChartRasterizer) -> PageLayout {
    let mut composer = PageComposer::new(layout);
    composer.add_title(&plan.header);
    for section in &plan.sections {
        composer.add_section(section, rasterizer);
    }
    composer.finish(plan.footers)
}

/// 単語単位で折り返す。1語が長すぎる場合は文字単位で分割
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        // 長い語は分割
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{NoCharts, RasterizeError};
    use crate::layout::PAGE_BOTTOM_MM;

    struct FixedChart(Bitmap);

    impl ChartRasterizer for FixedChart {
        fn rasterize(&self, _key: &ChartKey) -> Result<Bitmap, RasterizeError> {
            Ok(self.0.clone())
        }
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("Evento {}", i), "Ana".to_string(), "09/03/2024".to_string()])
            .collect()
    }

    fn table(n: usize) -> TableBlock {
        TableBlock::new(&["Nombre", "Responsable", "Fecha"], rows(n))
    }

    #[test]
    fn test_title_positions() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_title(&TitleBlock::muted("Reporte", vec!["Generado el: 01/01/2024".into()]));
        assert!((composer.cursor_mm() - 40.0).abs() < 0.01);

        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_title(&TitleBlock::muted("Reporte", vec!["a".into(), "b".into()]));
        assert!((composer.cursor_mm() - 48.0).abs() < 0.01);
    }

    #[test]
    fn test_small_table_single_page() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_title(&TitleBlock::muted("Reporte", vec![]));
        composer.add_table(&table(5));
        let layout = composer.finish(false);
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].contains_text("Evento 4"));
    }

    #[test]
    fn test_long_table_repeats_header() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_title(&TitleBlock::muted("Reporte", vec!["Generado el: x".into()]));
        composer.add_table(&table(120));
        let layout = composer.finish(true);

        assert!(layout.page_count() >= 2);
        for page in &layout.pages {
            let headers = page.texts().filter(|t| t.bold && t.text == "Nombre").count();
            assert_eq!(headers, 1, "ページ{}にヘッダーが無い", page.number);
        }
        // 全行が1回ずつ出力される
        for i in 0..120 {
            let needle = format!("Evento {}", i);
            let hits: usize = layout
                .pages
                .iter()
                .map(|p| p.texts().filter(|t| t.text == needle).count())
                .sum();
            assert_eq!(hits, 1, "{} の出力回数", needle);
        }
    }

    #[test]
    fn test_rows_never_cross_bottom_limit() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_table(&table(200));
        let layout = composer.finish(false);
        for page in &layout.pages {
            for e in &page.elements {
                if let Element::Rect(r) = e {
                    assert!(r.y_mm + r.height_mm <= PAGE_BOTTOM_MM + 0.01);
                }
            }
        }
    }

    #[test]
    fn test_tall_row_continues_on_next_page() {
        let long: Vec<String> = (0..600).map(|i| format!("p{:03}", i)).collect();
        let mut table_rows = rows(2);
        table_rows.insert(1, vec!["Evento largo".to_string(), "Ana".to_string(), long.join(" ")]);

        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_title(&TitleBlock::muted("Reporte", vec!["Generado el: x".into()]));
        composer.add_table(&TableBlock::new(&["Nombre", "Responsable", "Notas"], table_rows));
        let layout = composer.finish(true);

        assert!(layout.page_count() >= 2);
        for page in &layout.pages {
            for e in &page.elements {
                match e {
                    Element::Rect(r) => assert!(r.y_mm + r.height_mm <= PAGE_BOTTOM_MM + 0.01),
                    Element::Text(t) if !t.text.starts_with("Página") => {
                        assert!(t.y_mm <= PAGE_BOTTOM_MM, "ページ{}で下端を超えた: {}", page.number, t.text)
                    }
                    _ => {}
                }
            }
            let headers = page.texts().filter(|t| t.bold && t.text == "Nombre").count();
            assert_eq!(headers, 1);
        }
        // 全語が1回ずつ出る
        for word in &long {
            let hits: usize = layout
                .pages
                .iter()
                .map(|p| p.texts().filter(|t| t.text.split(' ').any(|w| w == word)).count())
                .sum();
            assert_eq!(hits, 1, "{} の出力回数", word);
        }
        assert!(layout.pages.last().map(|p| p.contains_text("Evento 1")).unwrap_or(false));
    }

    #[test]
    fn test_long_text_block_flows_across_pages() {
        let lines: Vec<String> = (0..80).map(|i| format!("linea {}", i)).collect();
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_text(&TextBlock::body(lines.clone()));
        let layout = composer.finish(false);

        // 260mm / 8mm = 32行ずつ
        assert_eq!(layout.page_count(), 3);
        for page in &layout.pages {
            assert!(page.texts().all(|t| t.y_mm <= PAGE_BOTTOM_MM));
        }
        let texts: Vec<&str> = layout.pages.iter().flat_map(|p| p.texts().map(|t| t.text.as_str())).collect();
        assert_eq!(texts, lines.iter().map(|l| l.as_str()).collect::<Vec<_>>());
    }

    #[test]
    fn test_footers_on_every_page() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_table(&table(150));
        let layout = composer.finish(true);
        let total = layout.page_count();
        assert!(total >= 3);
        for page in &layout.pages {
            assert!(page.contains_text(&format!("Página {} de {}", page.number, total)));
        }
    }

    #[test]
    fn test_no_footers_when_disabled() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_table(&table(150));
        let layout = composer.finish(false);
        assert!(layout.pages.iter().all(|p| !p.contains_text("Página")));
    }

    #[test]
    fn test_image_deferred_to_fresh_page() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        // 20 + 29×8 = 252mm
        composer.add_text(&TextBlock::body(vec!["linea".to_string(); 29]));
        assert_eq!(composer.current_page(), 1);
        // 800×300px → 180×67.5mm、252 + 67.5 > 280
        composer.add_image(Bitmap::blank(800, 300));
        let layout = composer.finish(false);

        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].images().count(), 0);
        let image = layout.pages[1].images().next().cloned().unwrap();
        assert!((image.y_mm - 20.0).abs() < 0.01);
        assert!((image.height_mm - 67.5).abs() < 0.01);
        assert!(image.y_mm + image.height_mm <= PAGE_BOTTOM_MM);
    }

    #[test]
    fn test_tall_image_is_scaled_not_split() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_image(Bitmap::blank(100, 1000));
        let layout = composer.finish(false);
        let image = layout.pages[0].images().next().cloned().unwrap();
        assert!((image.height_mm - 260.0).abs() < 0.01);
        assert!(image.width_mm < 180.0);
    }

    #[test]
    fn test_failed_chart_degrades_section() {
        let section = Section::new(vec![
            Block::Text(TextBlock::heading("Bodega Central - 50% del inventario total")),
            Block::Chart(ChartKey::warehouse(1)),
            Block::Table(table(3)),
        ]);
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_section(&section, &NoCharts);
        let layout = composer.finish(false);

        assert_eq!(layout.degraded, vec![ChartKey::warehouse(1)]);
        assert!(layout.images.is_empty());
        assert!(layout.pages[0].contains_text("Evento 2"));
    }

    #[test]
    fn test_sections_flow_without_reset() {
        let chart = FixedChart(Bitmap::blank(800, 300));
        let section = Section::new(vec![
            Block::Text(TextBlock::heading("Bodega")),
            Block::Chart(ChartKey::warehouse(1)),
            Block::Table(table(4)),
        ]);
        let plan = DocumentPlan {
            title: "Reporte".into(),
            header: TitleBlock::muted("Reporte", vec!["x".into(), "y".into()]),
            sections: vec![section.clone(), section.clone(), section.clone(), section],
            footers: false,
        };
        let layout = compose_document(&plan, PdfLayout::a4(), &chart);

        assert_eq!(layout.images.len(), 4);
        // 1セクション ≈ 8 + 77.5 + 表 + 15mm → 1ページに3セクションは入らない
        assert!(layout.page_count() >= 2);
        // 1ページ目には複数セクションが続けて入る
        let first_page_headings = layout.pages[0].texts().filter(|t| t.text == "Bodega").count();
        assert!(first_page_headings >= 2);
        // 新しいページは1ページ目に戻らない
        let numbers: Vec<usize> = layout.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=layout.page_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_table(&table(0));
        let layout = composer.finish(false);
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].contains_text("Responsable"));
    }

    #[test]
    fn test_header_fill_is_accent() {
        let mut composer = PageComposer::new(PdfLayout::a4());
        composer.add_table(&table(1));
        let layout = composer.finish(false);
        let first_rect = layout.pages[0]
            .elements
            .iter()
            .find_map(|e| match e {
                Element::Rect(r) => Some(r.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(first_rect.fill, ACCENT_RGB);
        let header_text = layout.pages[0].texts().find(|t| t.text == "Nombre").unwrap();
        assert!(header_text.bold);
        assert_eq!(header_text.color, WHITE_RGB);
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("Boda de Ana y Luis", 10), vec!["Boda de", "Ana y Luis"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }
}
