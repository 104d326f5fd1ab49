//! 占位图
//!
//! 所有截图方式都失败时生成固定尺寸的占位图，保证导出数据里始终是合法的图片

use phf::phf_map;

use crate::capture::canvas::{to_data_url, Canvas, Rgba};
use crate::error::CaptureError;

pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 300;

const BACKGROUND: Rgba = [240, 240, 240, 255];
const BORDER: Rgba = [204, 204, 204, 255];
const TEXT: Rgba = [102, 102, 102, 255];

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 2;
const GLYPH_SPACING: u32 = 2;

/// 5×7 点阵字形，每行低 5 位从左到右
static GLYPHS: phf::Map<char, [u8; 7]> = phf_map! {
    'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
    'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
    'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
    'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
    'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
    'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
    'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
    'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
    'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
    'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
    'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
    'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
    'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
    'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
    'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
    'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
    'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
    'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
};

/// 占位图说明文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// 所有截图方式都失败
    CaptureFailed,
    /// 预览区域不存在或无法定位
    PreviewUnavailable,
}

impl PlaceholderReason {
    pub fn caption(self) -> &'static str {
        match self {
            PlaceholderReason::CaptureFailed => "Screenshot Failed",
            PlaceholderReason::PreviewUnavailable => "Preview Not Available",
        }
    }
}

/// 绘制占位图画布：浅灰底、边框、居中文字
pub fn placeholder_canvas(reason: PlaceholderReason) -> Canvas {
    let mut canvas = Canvas::filled(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, BACKGROUND);
    canvas.stroke_border(2, BORDER);
    draw_caption(&mut canvas, reason.caption(), TEXT);
    canvas
}

/// 生成占位图 data URL
pub fn placeholder_data_url(reason: PlaceholderReason) -> Result<String, CaptureError> {
    let png = placeholder_canvas(reason).encode_png()?;
    Ok(to_data_url(&png))
}

/// 文字渲染后的像素宽度
pub fn caption_width(text: &str) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    count * GLYPH_WIDTH * GLYPH_SCALE + (count - 1) * GLYPH_SPACING
}

/// 在画布中央绘制大写文字，缺少字形的字符留空
fn draw_caption(canvas: &mut Canvas, text: &str, color: Rgba) {
    let width = caption_width(text);
    let height = GLYPH_HEIGHT * GLYPH_SCALE;
    let origin_x = canvas.width().saturating_sub(width) / 2;
    let origin_y = canvas.height().saturating_sub(height) / 2;

    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = GLYPHS.get(&ch.to_ascii_uppercase()) else {
            continue;
        };
        let glyph_x = origin_x + i as u32 * (GLYPH_WIDTH * GLYPH_SCALE + GLYPH_SPACING);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    canvas.fill_rect(
                        glyph_x + col * GLYPH_SCALE,
                        origin_y + row as u32 * GLYPH_SCALE,
                        GLYPH_SCALE,
                        GLYPH_SCALE,
                        color,
                    );
                }
            }
        }
    }
}
