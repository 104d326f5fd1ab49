//! RGBA 画布
//!
//! 截图兜底和占位图都在这里合成，最终编码为 PNG

use std::io::Cursor;

use base64::Engine;

use crate::error::CaptureError;

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 8 位 RGBA 画布
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// 创建纯色画布（宽高至少为 1）
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// 填充矩形，超出画布的部分被裁掉
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                let i = self.index(px, py);
                self.pixels[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    /// 沿画布边缘描边
    pub fn stroke_border(&mut self, thickness: u32, color: Rgba) {
        let (w, h) = (self.width, self.height);
        self.fill_rect(0, 0, w, thickness, color);
        self.fill_rect(0, h.saturating_sub(thickness), w, thickness, color);
        self.fill_rect(0, 0, thickness, h, color);
        self.fill_rect(w.saturating_sub(thickness), 0, thickness, h, color);
    }

    /// 以 source-over 方式把另一张图画到 (x, y)，超出部分裁掉
    pub fn draw_image(&mut self, image: &Canvas, x: u32, y: u32) {
        for sy in 0..image.height {
            let dy = y.saturating_add(sy);
            if dy >= self.height {
                break;
            }
            for sx in 0..image.width {
                let dx = x.saturating_add(sx);
                if dx >= self.width {
                    break;
                }
                let si = image.index(sx, sy);
                let di = self.index(dx, dy);
                let src = &image.pixels[si..si + 4];
                let alpha = src[3] as u32;
                if alpha == 0 {
                    continue;
                }
                let dst = &mut self.pixels[di..di + 4];
                for c in 0..3 {
                    dst[c] = ((src[c] as u32 * alpha + dst[c] as u32 * (255 - alpha) + 127) / 255) as u8;
                }
                dst[3] = (alpha + (dst[3] as u32 * (255 - alpha) + 127) / 255) as u8;
            }
        }
    }

    /// 编码为 PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, CaptureError> {
        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| CaptureError::Codec(e.to_string()))?;
        writer
            .write_image_data(&self.pixels)
            .map_err(|e| CaptureError::Codec(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CaptureError::Codec(e.to_string()))?;
        Ok(out)
    }

    /// 解码 PNG（调色板、灰度、16 位都会被规整为 8 位 RGBA）
    pub fn decode_png(bytes: &[u8]) -> Result<Self, CaptureError> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder
            .read_info()
            .map_err(|e| CaptureError::Codec(e.to_string()))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| CaptureError::Codec(e.to_string()))?;

        let channels = match info.color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            png::ColorType::Indexed => {
                return Err(CaptureError::Codec("未展开的调色板图像".to_string()));
            }
        };

        let mut pixels = Vec::with_capacity(info.width as usize * info.height as usize * 4);
        for row in buf.chunks(info.line_size).take(info.height as usize) {
            for px in row.chunks(channels).take(info.width as usize) {
                let rgba = match channels {
                    1 => [px[0], px[0], px[0], 255],
                    2 => [px[0], px[0], px[0], px[1]],
                    3 => [px[0], px[1], px[2], 255],
                    _ => [px[0], px[1], px[2], px[3]],
                };
                pixels.extend_from_slice(&rgba);
            }
        }

        Ok(Self {
            width: info.width,
            height: info.height,
            pixels,
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// PNG 字节 → `data:image/png;base64,...`
pub fn to_data_url(png_bytes: &[u8]) -> String {
    format!(
        "{}{}",
        DATA_URL_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(png_bytes)
    )
}

/// 解析 base64 data URL，返回原始字节
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, CaptureError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| CaptureError::Codec("data URL 缺少数据部分".to_string()))?;
    if !header.starts_with("data:") || !header.contains("base64") {
        return Err(CaptureError::Codec(format!("不支持的 data URL: {}", header)));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| CaptureError::Codec(e.to_string()))
}

/// 是否是 PNG data URL
pub fn is_png_data_url(value: &str) -> bool {
    value.starts_with(DATA_URL_PREFIX) && value.len() > DATA_URL_PREFIX.len()
}
