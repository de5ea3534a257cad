//! 像素数据渲染
//!
//! BMP 自下而上存储像素行，每行按 4 字节对齐。渲染器在构造时完成全部边界检查，
//! 之后按显示顺序（自上而下）惰性地产生行和单元格，不会出现半行输出。

use super::bytes::read_u32_le;
use super::color::{self, FULL_BLOCK, RESET, Rgb};
use super::header::{BmpHeaders, Compression, MIN_HEADER_SIZE};
use crate::error::{BmpError, Result};
use std::fmt;
use std::io::Write;
use std::iter::Rev;
use std::ops::Range;

/// 位域掩码位置: 红 54..58, 绿 58..62, 蓝 62..66, 透明度 66..70
const RED_MASK_POSITION: usize = MIN_HEADER_SIZE;
const GREEN_MASK_POSITION: usize = MIN_HEADER_SIZE + 4;
const BLUE_MASK_POSITION: usize = MIN_HEADER_SIZE + 8;
const ALPHA_MASK_POSITION: usize = MIN_HEADER_SIZE + 12;
const MASKS_END: usize = MIN_HEADER_SIZE + 16;

/// 计算行字节数（含 4 字节对齐填充）
pub fn row_stride(bits_per_pixel: u16, width: u32) -> u64 {
    (bits_per_pixel as u64 * width as u64).div_ceil(32) * 4
}

/// 每个像素内各通道所在的字节位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOffsets {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
    /// 无透明度掩码时按不透明处理
    pub alpha: Option<usize>,
}

/// 像素解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// BI_RGB, 按 (B, G, R) 读取
    Direct { bytes_per_pixel: usize },
    /// 32 位 BI_BITFIELDS
    Masked { offsets: ChannelOffsets },
}

impl PixelMode {
    fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelMode::Direct { bytes_per_pixel } => *bytes_per_pixel,
            PixelMode::Masked { .. } => 4,
        }
    }

    fn decode(&self, pixel: &[u8]) -> Cell {
        match self {
            PixelMode::Direct { .. } => Cell {
                color: Rgb::from_bgr(pixel),
                glyph: FULL_BLOCK,
            },
            PixelMode::Masked { offsets } => Cell {
                color: Rgb::new(pixel[offsets.red], pixel[offsets.green], pixel[offsets.blue]),
                glyph: offsets
                    .alpha
                    .map_or(FULL_BLOCK, |a| color::alpha_glyph(pixel[a])),
            },
        }
    }
}

/// 一个终端单元格: 前景色加两个相同字符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub color: Rgb,
    pub glyph: char,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.color.foreground(), self.glyph, self.glyph)
    }
}

/// 渲染结果
#[derive(Debug, Clone, Copy)]
pub enum Rendering<'a> {
    Image(PixelRenderer<'a>),
    /// 可识别但未实现的压缩方式与位深组合，不是错误
    Unsupported {
        compression: Compression,
        bits_per_pixel: u16,
    },
}

impl fmt::Display for Rendering<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendering::Image(renderer) => write!(
                f,
                "{}x{} image ({:?})",
                renderer.width, renderer.height, renderer.mode
            ),
            Rendering::Unsupported {
                compression,
                bits_per_pixel,
            } => write!(
                f,
                "Sorry, I do not know how to parse {bits_per_pixel}bit {compression}."
            ),
        }
    }
}

/// 像素渲染器，只借用原始缓冲区
#[derive(Clone, Copy)]
pub struct PixelRenderer<'a> {
    buf: &'a [u8],
    mode: PixelMode,
    offset: usize,
    stride: usize,
    width: usize,
    height: usize,
}

impl fmt::Debug for PixelRenderer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelRenderer")
            .field("mode", &self.mode)
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl<'a> PixelRenderer<'a> {
    /// 根据头部选择解码方式并检查像素数据边界
    pub fn new(headers: &BmpHeaders, buf: &'a [u8]) -> Result<Rendering<'a>> {
        let dib = &headers.dib;
        let offset = headers.file.pixel_array_offset as u64;

        let mode = match (dib.compression, dib.bits_per_pixel) {
            (Compression::Rgb, 24) => PixelMode::Direct { bytes_per_pixel: 3 },
            (Compression::Rgb, 32) => PixelMode::Direct { bytes_per_pixel: 4 },
            (Compression::Bitfields, 32) => PixelMode::Masked {
                offsets: Self::read_channel_offsets(buf, offset)?,
            },
            (compression, bits_per_pixel) => {
                tracing::warn!("不支持的像素格式: {} 位 {}", bits_per_pixel, compression);
                return Ok(Rendering::Unsupported {
                    compression,
                    bits_per_pixel,
                });
            }
        };

        let stride = headers.row_stride();
        let rows_end = offset.saturating_add(stride.saturating_mul(dib.height as u64));
        let data_end = offset.saturating_add(headers.pixel_data_len());
        let needed = rows_end.max(data_end);

        if needed > buf.len() as u64 {
            tracing::error!(
                "像素数据越界: 需要 {} 字节, 缓冲区只有 {} 字节",
                needed,
                buf.len()
            );
            return Err(BmpError::TruncatedInput {
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                actual: buf.len(),
            });
        }

        tracing::debug!("解码方式: {:?}, 行跨度 {}", mode, stride);

        // needed <= buf.len(), 以下转换不会截断
        Ok(Rendering::Image(Self {
            buf,
            mode,
            offset: offset as usize,
            stride: stride as usize,
            width: dib.width as usize,
            height: dib.height as usize,
        }))
    }

    /// 读取位域掩码并换算为像素内的字节位置
    fn read_channel_offsets(buf: &[u8], pixel_array_offset: u64) -> Result<ChannelOffsets> {
        let red = mask_byte_offset("red", read_u32_le(buf, RED_MASK_POSITION)?)?;
        let green = mask_byte_offset("green", read_u32_le(buf, GREEN_MASK_POSITION)?)?;
        let blue = mask_byte_offset("blue", read_u32_le(buf, BLUE_MASK_POSITION)?)?;

        // 像素数据紧跟三个掩码时 66..70 已经是像素
        let alpha = if pixel_array_offset >= MASKS_END as u64 {
            match read_u32_le(buf, ALPHA_MASK_POSITION)? {
                0 => None,
                mask => Some(mask_byte_offset("alpha", mask)?),
            }
        } else {
            None
        };

        if alpha.is_none() {
            tracing::warn!("没有透明度掩码, 按不透明渲染");
        }

        Ok(ChannelOffsets {
            red,
            green,
            blue,
            alpha,
        })
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 按显示顺序（最后存储的行在前）遍历所有行
    pub fn rows(&self) -> Rows<'a> {
        Rows {
            renderer: *self,
            remaining: (0..self.height).rev(),
        }
    }

    /// 把整幅图像写成 ANSI 真彩色文本
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for row in self.rows() {
            for cell in row {
                write!(out, "{cell}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "{RESET}")?;
        Ok(())
    }
}

/// 掩码必须恰好占据一个完整字节
fn mask_byte_offset(channel: &'static str, mask: u32) -> Result<usize> {
    (0..4)
        .find(|&k| mask == 0xFF << (8 * k))
        .ok_or(BmpError::InvalidBitmask { channel, mask })
}

/// 行迭代器
pub struct Rows<'a> {
    renderer: PixelRenderer<'a>,
    remaining: Rev<Range<usize>>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let stored = self.remaining.next()?;
        let r = &self.renderer;
        let bytes_per_pixel = r.mode.bytes_per_pixel();
        let start = r.offset + stored * r.stride;

        Some(Row {
            pixels: &r.buf[start..start + r.width * bytes_per_pixel],
            mode: r.mode,
            columns: 0..r.width,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.remaining.size_hint()
    }
}

impl ExactSizeIterator for Rows<'_> {}

/// 单行内的单元格迭代器，不包含行尾填充字节
pub struct Row<'a> {
    pixels: &'a [u8],
    mode: PixelMode,
    columns: Range<usize>,
}

impl Iterator for Row<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        let column = self.columns.next()?;
        let bytes_per_pixel = self.mode.bytes_per_pixel();
        let start = column * bytes_per_pixel;
        Some(self.mode.decode(&self.pixels[start..start + bytes_per_pixel]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.columns.size_hint()
    }
}

impl ExactSizeIterator for Row<'_> {}

/// 输出渲染结果; 不支持的格式只输出提示信息
pub fn write_ansi<W: Write>(rendering: &Rendering<'_>, out: &mut W) -> Result<()> {
    match rendering {
        Rendering::Image(renderer) => renderer.write_to(out),
        unsupported @ Rendering::Unsupported { .. } => {
            writeln!(out, "{unsupported}")?;
            Ok(())
        }
    }
}
