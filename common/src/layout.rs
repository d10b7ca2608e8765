//! レイアウト設定モジュール
//!
//! mm基準のレイアウト定義（Source of Truth）
//! Y座標はページ上端からの距離。PDF描画時に下端基準へ変換する。

// ============================================
// mm基準レイアウト（Source of Truth）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 左余白（mm）
pub const MARGIN_LEFT_MM: f32 = 14.0;

/// タイトル行のベースライン（mm）
pub const TITLE_Y_MM: f32 = 22.0;
/// タイトル→1行目のサブタイトル
pub const SUBTITLE_FIRST_GAP_MM: f32 = 10.0;
/// サブタイトル行間
pub const SUBTITLE_STEP_MM: f32 = 8.0;

/// 改ページ後の開始位置（mm）
pub const TOP_MARGIN_MM: f32 = 20.0;
/// これを超えるブロックは次ページへ（mm）
pub const PAGE_BOTTOM_MM: f32 = 280.0;
/// フッターのベースライン（mm）
pub const FOOTER_Y_MM: f32 = 287.0;

/// チャート画像の配置（mm）
pub const IMAGE_X_MM: f32 = 15.0;
pub const IMAGE_WIDTH_MM: f32 = 180.0;

/// ブロック後の間隔（mm）
pub const IMAGE_GAP_MM: f32 = 10.0;
pub const TABLE_GAP_MM: f32 = 15.0;

/// テキスト行の高さ（見出し・本文、mm）
pub const TEXT_LINE_MM: f32 = 8.0;

// ============================================
// フォント
// ============================================

pub const TITLE_FONT_PT: f32 = 18.0;
pub const SUBTITLE_FONT_PT: f32 = 12.0;
pub const HEADING_FONT_PT: f32 = 14.0;
pub const TABLE_FONT_PT: f32 = 10.0;
pub const FOOTER_FONT_PT: f32 = 10.0;

/// セル内余白（mm）
pub const CELL_PADDING_MM: f32 = 1.76;
/// 行送り係数
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;
/// Helvetica の平均文字幅（em）
pub const AVG_GLYPH_EM: f32 = 0.5;

// ============================================
// 色
// ============================================

/// 表ヘッダーの塗り (41, 128, 185)
pub const ACCENT_RGB: [u8; 3] = [41, 128, 185];
pub const WHITE_RGB: [u8; 3] = [255, 255, 255];
pub const BLACK_RGB: [u8; 3] = [0, 0, 0];
/// サブタイトル（生成日など）
pub const MUTED_RGB: [u8; 3] = [100, 100, 100];
/// 縞模様の偶数行
pub const STRIPE_RGB: [u8; 3] = [245, 245, 245];

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;
pub const PT_TO_MM: f32 = 25.4 / 72.0;

// ============================================
// レイアウト設定構造体
// ============================================

/// PDFレイアウト設定
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub top_margin_mm: f32,
    /// ブロック下端の上限
    pub bottom_limit_mm: f32,
    pub footer_y_mm: f32,
    pub image_x_mm: f32,
    pub image_width_mm: f32,
    pub table_font_pt: f32,
    pub cell_padding_mm: f32,
}

impl PdfLayout {
    /// A4縦
    pub fn a4() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_left_mm: MARGIN_LEFT_MM,
            top_margin_mm: TOP_MARGIN_MM,
            bottom_limit_mm: PAGE_BOTTOM_MM,
            footer_y_mm: FOOTER_Y_MM,
            image_x_mm: IMAGE_X_MM,
            image_width_mm: IMAGE_WIDTH_MM,
            table_font_pt: TABLE_FONT_PT,
            cell_padding_mm: CELL_PADDING_MM,
        }
    }

    /// 表に使える幅（左右対称の余白）
    pub fn usable_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm * 2.0
    }

    /// 表1行あたりの行送り（mm）
    pub fn table_line_mm(&self) -> f32 {
        self.table_font_pt * LINE_HEIGHT_FACTOR * PT_TO_MM
    }

    /// 指定幅に収まる概算文字数
    pub fn chars_per_width(&self, width_mm: f32) -> usize {
        let glyph_mm = self.table_font_pt * AVG_GLYPH_EM * PT_TO_MM;
        let inner = (width_mm - self.cell_padding_mm * 2.0).max(glyph_mm);
        (inner / glyph_mm).floor().max(1.0) as usize
    }
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::a4()
    }
}

// ============================================
// ヘルパー関数
// ============================================

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * PT_TO_MM
}
