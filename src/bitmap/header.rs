//! BMP 文件头与 DIB 头解析
//!
//! 仅支持 40 字节的 BITMAPINFOHEADER 布局，所有字段在构造时一次性读出，之后不再改变。

use super::bytes::{read_u16_le, read_u32_le};
use crate::error::{BmpError, Result};
use std::fmt;

/// 文件签名
pub const FILE_SIGNATURE: [u8; 2] = *b"BM";

/// 文件头长度
pub const FILE_HEADER_SIZE: usize = 14;
/// BITMAPINFOHEADER 长度
pub const DIB_HEADER_SIZE: usize = 40;
/// 解析所需的最小字节数
pub const MIN_HEADER_SIZE: usize = FILE_HEADER_SIZE + DIB_HEADER_SIZE;

const FILE_SIZE_POSITION: usize = 2;
const PIXEL_ARRAY_OFFSET_POSITION: usize = 10;
const HEADER_SIZE_POSITION: usize = 14;
const WIDTH_POSITION: usize = 18;
const HEIGHT_POSITION: usize = 22;
const PLANES_POSITION: usize = 26;
const BITS_PER_PIXEL_POSITION: usize = 28;
const COMPRESSION_POSITION: usize = 30;
const IMAGE_SIZE_POSITION: usize = 34;
const H_RES_POSITION: usize = 38;
const V_RES_POSITION: usize = 42;
const NUM_COLORS_POSITION: usize = 46;
const NUM_IMPORTANT_COLORS_POSITION: usize = 50;

/// 压缩方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
    Jpeg,
    Png,
    AlphaBitfields,
    Cmyk,
    CmykRle8,
    CmykRle4,
}

impl Compression {
    /// Windows 中对应的常量名
    pub fn name(&self) -> &'static str {
        match self {
            Compression::Rgb => "BI_RGB",
            Compression::Rle8 => "BI_RLE8",
            Compression::Rle4 => "BI_RLE4",
            Compression::Bitfields => "BI_BITFIELDS",
            Compression::Jpeg => "BI_JPEG",
            Compression::Png => "BI_PNG",
            Compression::AlphaBitfields => "BI_ALPHABITFIELDS",
            Compression::Cmyk => "BI_CMYK",
            Compression::CmykRle8 => "BI_CMYKRLE8",
            Compression::CmykRle4 => "BI_CMYKRLE4",
        }
    }

    /// 头部中存储的原始值
    pub fn code(&self) -> u32 {
        match self {
            Compression::Rgb => 0,
            Compression::Rle8 => 1,
            Compression::Rle4 => 2,
            Compression::Bitfields => 3,
            Compression::Jpeg => 4,
            Compression::Png => 5,
            Compression::AlphaBitfields => 6,
            Compression::Cmyk => 11,
            Compression::CmykRle8 => 12,
            Compression::CmykRle4 => 13,
        }
    }
}

impl TryFrom<u32> for Compression {
    type Error = BmpError;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Compression::Rgb),
            1 => Ok(Compression::Rle8),
            2 => Ok(Compression::Rle4),
            3 => Ok(Compression::Bitfields),
            4 => Ok(Compression::Jpeg),
            5 => Ok(Compression::Png),
            6 => Ok(Compression::AlphaBitfields),
            11 => Ok(Compression::Cmyk),
            12 => Ok(Compression::CmykRle8),
            13 => Ok(Compression::CmykRle4),
            other => Err(BmpError::UnknownCompression(other)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 位图文件头 (BITMAPFILEHEADER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// 文件签名, 应为 "BM"
    pub file_type: [u8; 2],
    /// 文件大小
    pub file_size: u32,
    /// 像素数据起始偏移
    pub pixel_array_offset: u32,
}

/// DIB 头 (BITMAPINFOHEADER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibHeader {
    pub header_size: u32,
    pub width: u32,
    /// 按无符号读取, 自上而下存储的位图 (负高度) 不做特殊处理
    pub height: u32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: Compression,
    pub image_size: u32,
    pub h_res: u32,
    pub v_res: u32,
    pub num_colors: u32,
    pub num_important_colors: u32,
}

/// 解析后的完整头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeaders {
    pub file: FileHeader,
    pub dib: DibHeader,
}

impl BmpHeaders {
    /// 从原始字节解析文件头和 DIB 头
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < MIN_HEADER_SIZE {
            return Err(BmpError::TruncatedInput {
                needed: MIN_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let file_type = [buf[0], buf[1]];
        if file_type != FILE_SIGNATURE {
            tracing::error!("文件签名不匹配: {:02X?}", file_type);
            return Err(BmpError::InvalidSignature(file_type));
        }

        let file = FileHeader {
            file_type,
            file_size: read_u32_le(buf, FILE_SIZE_POSITION)?,
            pixel_array_offset: read_u32_le(buf, PIXEL_ARRAY_OFFSET_POSITION)?,
        };

        let compression = Compression::try_from(read_u32_le(buf, COMPRESSION_POSITION)?)?;

        let dib = DibHeader {
            header_size: read_u32_le(buf, HEADER_SIZE_POSITION)?,
            width: read_u32_le(buf, WIDTH_POSITION)?,
            height: read_u32_le(buf, HEIGHT_POSITION)?,
            planes: read_u16_le(buf, PLANES_POSITION)?,
            bits_per_pixel: read_u16_le(buf, BITS_PER_PIXEL_POSITION)?,
            compression,
            image_size: read_u32_le(buf, IMAGE_SIZE_POSITION)?,
            h_res: read_u32_le(buf, H_RES_POSITION)?,
            v_res: read_u32_le(buf, V_RES_POSITION)?,
            num_colors: read_u32_le(buf, NUM_COLORS_POSITION)?,
            num_important_colors: read_u32_le(buf, NUM_IMPORTANT_COLORS_POSITION)?,
        };

        tracing::debug!(
            "解析头部: {}x{}, {} 位, {}, 像素偏移 {}",
            dib.width,
            dib.height,
            dib.bits_per_pixel,
            dib.compression,
            file.pixel_array_offset
        );

        Ok(Self { file, dib })
    }

    /// 每行字节数（含 4 字节对齐填充）
    pub fn row_stride(&self) -> u64 {
        super::render::row_stride(self.dib.bits_per_pixel, self.dib.width)
    }

    /// 像素数据的有效长度
    ///
    /// BI_RGB 位图允许 image_size 为 0, 此时按行跨度乘以高度计算。
    pub fn pixel_data_len(&self) -> u64 {
        if self.dib.image_size != 0 {
            self.dib.image_size as u64
        } else {
            self.row_stride().saturating_mul(self.dib.height as u64)
        }
    }
}

impl fmt::Display for BmpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = &self.file;
        let dib = &self.dib;

        writeln!(f, "    Bitmap file header")?;
        writeln!(f, "{:<29}{}", "Type:", String::from_utf8_lossy(&file.file_type))?;
        writeln!(f, "{:<29}{}", "Size:", file.file_size)?;
        writeln!(f, "{:<29}{}", "Offset:", file.pixel_array_offset)?;
        writeln!(f)?;
        writeln!(f, "    DIB header")?;
        writeln!(f, "{:<29}{}", "Size of this header:", dib.header_size)?;
        writeln!(f, "{:<29}{}", "Image width:", dib.width)?;
        writeln!(f, "{:<29}{}", "Image height:", dib.height)?;
        writeln!(f, "{:<29}{}", "Number of color planes:", dib.planes)?;
        writeln!(f, "{:<29}{}", "Number of bits per pixel:", dib.bits_per_pixel)?;
        writeln!(f, "{:<29}{}", "Compression method:", dib.compression)?;
        writeln!(f, "{:<29}{}", "Image size:", dib.image_size)?;
        writeln!(f, "{:<29}{}", "Horizontal resolution:", dib.h_res)?;
        writeln!(f, "{:<29}{}", "Vertical resolution:", dib.v_res)?;
        writeln!(f, "{:<29}{}", "Number of colors in palette:", dib.num_colors)?;
        write!(f, "{:<29}{}", "Number of important colors:", dib.num_important_colors)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    /// 构造 54 字节的头部
    pub(crate) fn header_bytes(
        width: u32,
        height: u32,
        bits_per_pixel: u16,
        compression: u32,
        pixel_array_offset: u32,
        image_size: u32,
    ) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MIN_HEADER_SIZE);
        buf.extend_from_slice(b"BM");
        buf.write_u32::<LittleEndian>(pixel_array_offset + image_size).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(pixel_array_offset).unwrap();
        buf.write_u32::<LittleEndian>(DIB_HEADER_SIZE as u32).unwrap();
        buf.write_u32::<LittleEndian>(width).unwrap();
        buf.write_u32::<LittleEndian>(height).unwrap();
        buf.write_u16::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(bits_per_pixel).unwrap();
        buf.write_u32::<LittleEndian>(compression).unwrap();
        buf.write_u32::<LittleEndian>(image_size).unwrap();
        buf.write_u32::<LittleEndian>(2835).unwrap();
        buf.write_u32::<LittleEndian>(2835).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf
    }

    #[test]
    fn test_parse_fields() {
        let buf = header_bytes(5, 3, 24, 0, 54, 48);
        let headers = BmpHeaders::parse(&buf).unwrap();

        assert_eq!(headers.file.file_type, *b"BM");
        assert_eq!(headers.file.file_size, 102);
        assert_eq!(headers.file.pixel_array_offset, 54);
        assert_eq!(headers.dib.header_size, 40);
        assert_eq!(headers.dib.width, 5);
        assert_eq!(headers.dib.height, 3);
        assert_eq!(headers.dib.planes, 1);
        assert_eq!(headers.dib.bits_per_pixel, 24);
        assert_eq!(headers.dib.compression, Compression::Rgb);
        assert_eq!(headers.dib.image_size, 48);
        assert_eq!(headers.dib.h_res, 2835);
        assert_eq!(headers.dib.v_res, 2835);
        assert_eq!(headers.dib.num_colors, 0);
        assert_eq!(headers.dib.num_important_colors, 0);
    }

    #[test]
    fn test_truncated_input() {
        let buf = header_bytes(5, 3, 24, 0, 54, 48);
        for len in [0, 1, 2, 14, 53] {
            match BmpHeaders::parse(&buf[..len]) {
                Err(BmpError::TruncatedInput { needed, actual }) => {
                    assert_eq!(needed, MIN_HEADER_SIZE);
                    assert_eq!(actual, len);
                }
                other => panic!("长度 {len}: 期望 TruncatedInput, 实际为 {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_signature() {
        let mut buf = header_bytes(1, 1, 24, 0, 54, 4);
        buf[0] = b'P';
        buf[1] = b'K';
        assert!(matches!(
            BmpHeaders::parse(&buf),
            Err(BmpError::InvalidSignature(sig)) if sig == *b"PK"
        ));
    }

    #[test]
    fn test_unknown_compression() {
        let buf = header_bytes(1, 1, 24, 99, 54, 4);
        assert!(matches!(
            BmpHeaders::parse(&buf),
            Err(BmpError::UnknownCompression(99))
        ));

        // 7..=10 不在枚举内
        assert!(Compression::try_from(7).is_err());
        assert!(Compression::try_from(10).is_err());
    }

    #[test]
    fn test_compression_codes() {
        for code in [0, 1, 2, 3, 4, 5, 6, 11, 12, 13] {
            let compression = Compression::try_from(code).unwrap();
            assert_eq!(compression.code(), code);
        }
        assert_eq!(Compression::try_from(13).unwrap().name(), "BI_CMYKRLE4");
    }

    #[test]
    fn test_pixel_data_len_falls_back_to_stride() {
        let buf = header_bytes(5, 3, 24, 0, 54, 0);
        let headers = BmpHeaders::parse(&buf).unwrap();
        assert_eq!(headers.row_stride(), 16);
        assert_eq!(headers.pixel_data_len(), 48);
    }

    #[test]
    fn test_dump_layout() {
        let buf = header_bytes(5, 3, 24, 0, 54, 48);
        let dump = BmpHeaders::parse(&buf).unwrap().to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines[0], "    Bitmap file header");
        assert_eq!(lines[1], "Type:                        BM");
        assert_eq!(lines[5], "    DIB header");
        assert!(dump.contains("Image width:                 5"));
        assert!(dump.contains("Compression method:          BI_RGB"));
        assert_eq!(lines.last().copied(), Some("Number of important colors:  0"));
    }
}
