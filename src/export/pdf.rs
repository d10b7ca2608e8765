//! PDF描画（printpdf）
//!
//! `PageLayout` の要素をそのまま置く。レイアウトは上端基準なので Y を反転する。

use crate::error::{ReportError, Result};
use crate::export::write_atomic;
use banquet_reports_common::chart::Bitmap;
use banquet_reports_common::export::pdf_core::{Element, PageLayout};
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::path::PaintMode;
use printpdf::*;
use std::path::Path;

fn rgb(color: [u8; 3]) -> Color {
    Color::Rgb(Rgb::new(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        None,
    ))
}

fn to_pdf_image(bitmap: &Bitmap) -> Result<Image> {
    let buffer = RgbImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
        .ok_or_else(|| ReportError::PdfGeneration("ビットマップのサイズが不正です".into()))?;
    Ok(Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer)))
}

/// 組版結果をPDFバイト列にする
pub fn render_pdf(layout: &PageLayout, title: &str) -> Result<Vec<u8>> {
    let page_w = layout.page_width_mm;
    let page_h = layout.page_height_mm;

    let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(page_w), Mm(page_h), "Layer 1");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(page_w), Mm(page_h), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        for element in &page.elements {
            match element {
                Element::Rect(r) => {
                    layer.set_fill_color(rgb(r.fill));
                    let rect = Rect::new(
                        Mm(r.x_mm),
                        Mm(page_h - r.y_mm - r.height_mm),
                        Mm(r.x_mm + r.width_mm),
                        Mm(page_h - r.y_mm),
                    )
                    .with_mode(PaintMode::Fill);
                    layer.add_rect(rect);
                }
                Element::Text(t) => {
                    layer.set_fill_color(rgb(t.color));
                    let face = if t.bold { &font_bold } else { &font };
                    layer.use_text(t.text.clone(), t.size_pt, Mm(t.x_mm), Mm(page_h - t.y_mm), face);
                }
                Element::Image(i) => {
                    let bitmap = layout
                        .images
                        .get(i.image)
                        .ok_or_else(|| ReportError::PdfGeneration(format!("画像{}がありません", i.image)))?;
                    if i.width_mm <= 0.0 {
                        continue;
                    }
                    // 幅 width_mm になる解像度
                    let dpi = bitmap.width as f32 * 25.4 / i.width_mm;
                    to_pdf_image(bitmap)?.add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm(i.x_mm)),
                            translate_y: Some(Mm(page_h - i.y_mm - i.height_mm)),
                            dpi: Some(dpi),
                            ..Default::default()
                        },
                    );
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ReportError::PdfGeneration(format!("PDF保存エラー: {:?}", e)))
}

/// 描画して保存（書き出しは全体の生成後）
pub fn generate_pdf(layout: &PageLayout, title: &str, output_path: &Path) -> Result<()> {
    let bytes = render_pdf(layout, title)?;
    write_atomic(output_path, &bytes)
}
