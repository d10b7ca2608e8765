//! チャートのラスタライズ契約
//!
//! 画面側で描画済みのチャートを、安定したキーでビットマップに変換する。
//! レイアウト側はこのトレイトだけを見る。

use thiserror::Error;

/// 画面上のチャートとエクスポート処理で共有されるキー
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartKey(String);

impl ChartKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 倉庫ごとのカテゴリ分布
    pub fn warehouse(id: impl std::fmt::Display) -> Self {
        Self(format!("warehouse-chart-{}", id))
    }

    /// 期間分析
    pub fn event_analysis() -> Self {
        Self("event-analysis-chart".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// RGB8 ビットマップ
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// 行優先、1ピクセル3バイト
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// 白で塗りつぶしたビットマップ
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255; width as usize * height as usize * 3],
        }
    }

    /// 高さ/幅
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            0.0
        } else {
            self.height as f32 / self.width as f32
        }
    }
}

/// 棒グラフの1本
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
}

/// 画面に載っているチャートの定義
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub bars: Vec<ChartBar>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ChartSpec {
    pub fn bar_chart(title: impl Into<String>, bars: Vec<ChartBar>, width_px: u32, height_px: u32) -> Self {
        Self {
            title: title.into(),
            bars,
            width_px,
            height_px,
        }
    }
}

/// ラスタライズ失敗（呼び出し側は致命的エラーとして扱わない）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterizeError {
    #[error("チャートが見つかりません: {0}")]
    NotMounted(ChartKey),

    #[error("チャートの描画が完了していません: {0}")]
    NotRendered(ChartKey),

    #[error("ビットマップ変換エラー: {0}")]
    Encode(String),
}

/// 描画済みチャートをビットマップ化する
pub trait ChartRasterizer {
    fn rasterize(&self, key: &ChartKey) -> Result<Bitmap, RasterizeError>;
}

/// 何も描画されていない環境用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCharts;

impl ChartRasterizer for NoCharts {
    fn rasterize(&self, key: &ChartKey) -> Result<Bitmap, RasterizeError> {
        Err(RasterizeError::NotMounted(key.clone()))
    }
}
