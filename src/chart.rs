//! 画面に載っているチャートの管理とラスタライズ
//!
//! タブのデータセットが置き換わるたびにコントローラーが登録し直す。

use banquet_reports_common::chart::{Bitmap, ChartKey, ChartRasterizer, ChartSpec, RasterizeError};
use image::{Rgb, RgbImage};
use std::collections::HashMap;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([230, 230, 230]);
const AXIS: Rgb<u8> = Rgb([150, 150, 150]);

/// 描画領域の余白（px）
const PAD_LEFT: u32 = 48;
const PAD_RIGHT: u32 = 16;
const PAD_TOP: u32 = 20;
const PAD_BOTTOM: u32 = 36;
const GRID_LINES: u32 = 5;

/// 現在マウントされているチャート
#[derive(Debug, Default, Clone)]
pub struct ChartRegistry {
    charts: HashMap<ChartKey, ChartSpec>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, key: ChartKey, spec: ChartSpec) {
        self.charts.insert(key, spec);
    }

    /// 指定キー以外を外して差し替える
    pub fn remount(&mut self, owned: impl Fn(&ChartKey) -> bool, specs: Vec<(ChartKey, ChartSpec)>) {
        self.charts.retain(|key, _| !owned(key));
        for (key, spec) in specs {
            self.charts.insert(key, spec);
        }
    }

    pub fn get(&self, key: &ChartKey) -> Option<&ChartSpec> {
        self.charts.get(key)
    }

    pub fn is_mounted(&self, key: &ChartKey) -> bool {
        self.charts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn rasterizer(&self) -> BarChartRasterizer<'_> {
        BarChartRasterizer { registry: self }
    }
}

/// 登録済みの棒グラフを RGB8 ビットマップに描く
pub struct BarChartRasterizer<'a> {
    registry: &'a ChartRegistry,
}

impl ChartRasterizer for BarChartRasterizer<'_> {
    fn rasterize(&self, key: &ChartKey) -> Result<Bitmap, RasterizeError> {
        let spec = self
            .registry
            .get(key)
            .ok_or_else(|| RasterizeError::NotMounted(key.clone()))?;
        if spec.width_px == 0 || spec.height_px == 0 {
            return Err(RasterizeError::NotRendered(key.clone()));
        }

        let image = draw_bar_chart(spec);
        let (width, height) = image.dimensions();
        let pixels = image.into_raw();
        if pixels.len() != width as usize * height as usize * 3 {
            return Err(RasterizeError::Encode(format!("{}: ピクセル数が不正", key)));
        }
        Ok(Bitmap::new(width, height, pixels))
    }
}

/// 棒 i の色: hsl(210 + 30i, 70%, 50%)
pub fn bar_color(index: usize) -> Rgb<u8> {
    let hue = (210.0 + 30.0 * index as f32) % 360.0;
    Rgb(hsl_to_rgb(hue, 0.7, 0.5))
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let (w, h) = image.dimensions();
    for y in y0.min(h)..y1.min(h) {
        for x in x0.min(w)..x1.min(w) {
            image.put_pixel(x, y, color);
        }
    }
}

fn draw_bar_chart(spec: &ChartSpec) -> RgbImage {
    let (width, height) = (spec.width_px, spec.height_px);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let plot_left = PAD_LEFT.min(width);
    let plot_right = width.saturating_sub(PAD_RIGHT).max(plot_left);
    let plot_top = PAD_TOP.min(height);
    let plot_bottom = height.saturating_sub(PAD_BOTTOM).max(plot_top);
    let plot_w = plot_right - plot_left;
    let plot_h = plot_bottom - plot_top;
    if plot_w == 0 || plot_h == 0 {
        return image;
    }

    // グリッド
    for i in 0..=GRID_LINES {
        let y = plot_top + plot_h * i / GRID_LINES;
        fill_rect(&mut image, plot_left, y, plot_right, y + 1, GRID);
    }

    // 軸
    fill_rect(&mut image, plot_left, plot_top, plot_left + 1, plot_bottom + 1, AXIS);
    fill_rect(&mut image, plot_left, plot_bottom, plot_right, plot_bottom + 1, AXIS);

    if spec.bars.is_empty() {
        return image;
    }

    let max_value = spec
        .bars
        .iter()
        .map(|b| if b.value.is_finite() { b.value } else { 0.0 })
        .fold(0.0_f64, f64::max);
    if max_value <= 0.0 {
        return image;
    }

    let slot = plot_w as f64 / spec.bars.len() as f64;
    let bar_w = (slot * 0.7).max(1.0);
    for (i, bar) in spec.bars.iter().enumerate() {
        let value = if bar.value.is_finite() { bar.value.max(0.0) } else { 0.0 };
        let bar_h = (value / max_value * plot_h as f64).round() as u32;
        if bar_h == 0 {
            continue;
        }
        let x0 = plot_left + (slot * i as f64 + (slot - bar_w) / 2.0).round() as u32;
        let x1 = x0 + bar_w.round() as u32;
        fill_rect(&mut image, x0 + 1, plot_bottom - bar_h, x1, plot_bottom, bar_color(i));
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use banquet_reports_common::chart::ChartBar;

    fn spec(width: u32, height: u32) -> ChartSpec {
        ChartSpec::bar_chart(
            "Central",
            vec![
                ChartBar { label: "Sillas".into(), value: 30.0 },
                ChartBar { label: "Mesas".into(), value: 10.0 },
            ],
            width,
            height,
        )
    }

    #[test]
    fn test_bar_colors() {
        // hsl(210, 70%, 50%) ≈ rgb(38, 128, 217)
        assert_eq!(bar_color(0), Rgb([38, 128, 217]));
        assert_ne!(bar_color(0), bar_color(1));
        assert_eq!(bar_color(0), bar_color(12));
    }

    #[test]
    fn test_rasterize_mounted_chart() {
        let mut registry = ChartRegistry::new();
        registry.mount(ChartKey::warehouse(1), spec(800, 300));
        let bitmap = registry.rasterizer().rasterize(&ChartKey::warehouse(1)).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (800, 300));
        assert_eq!(bitmap.pixels.len(), 800 * 300 * 3);
        // 左上は背景色
        assert_eq!(&bitmap.pixels[0..3], &[255, 255, 255]);
        // 棒の色が含まれる
        assert!(bitmap.pixels.chunks(3).any(|p| p == [38, 128, 217]));
    }

    #[test]
    fn test_rasterize_errors() {
        let mut registry = ChartRegistry::new();
        let err = registry.rasterizer().rasterize(&ChartKey::event_analysis()).unwrap_err();
        assert!(matches!(err, RasterizeError::NotMounted(_)));

        registry.mount(ChartKey::event_analysis(), spec(0, 400));
        let err = registry.rasterizer().rasterize(&ChartKey::event_analysis()).unwrap_err();
        assert!(matches!(err, RasterizeError::NotRendered(_)));
    }

    #[test]
    fn test_tiny_chart_still_renders() {
        let mut registry = ChartRegistry::new();
        registry.mount(ChartKey::new("tiny"), spec(10, 10));
        let bitmap = registry.rasterizer().rasterize(&ChartKey::new("tiny")).unwrap();
        assert_eq!(bitmap.pixels.len(), 300);
    }

    #[test]
    fn test_remount_replaces_owned_keys() {
        let mut registry = ChartRegistry::new();
        registry.mount(ChartKey::warehouse(1), spec(800, 300));
        registry.mount(ChartKey::event_analysis(), spec(800, 400));
        registry.remount(
            |k| k.as_str().starts_with("warehouse-chart-"),
            vec![(ChartKey::warehouse(2), spec(800, 300))],
        );
        assert!(!registry.is_mounted(&ChartKey::warehouse(1)));
        assert!(registry.is_mounted(&ChartKey::warehouse(2)));
        assert!(registry.is_mounted(&ChartKey::event_analysis()));
        assert_eq!(registry.len(), 2);
    }
}
