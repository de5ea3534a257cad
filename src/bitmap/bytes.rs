//! 小端整数字段读取
//!
//! BMP 的所有多字节字段都是固定偏移的小端无符号整数，
//! 这里提供唯一的读取原语，头部解析在不同偏移处重复调用它。

use crate::error::{BmpError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// 从 `buf` 的 `offset` 处读取 `width` 字节的小端无符号整数
///
/// `width` 必须在 1..=8 之间。越界时返回 [`BmpError::TruncatedInput`]。
pub fn read_uint_le(buf: &[u8], offset: usize, width: usize) -> Result<u64> {
    debug_assert!((1..=8).contains(&width), "字段宽度超出范围: {width}");

    let end = offset.checked_add(width).ok_or(BmpError::TruncatedInput {
        needed: usize::MAX,
        actual: buf.len(),
    })?;

    let field = buf.get(offset..end).ok_or(BmpError::TruncatedInput {
        needed: end,
        actual: buf.len(),
    })?;

    Ok(LittleEndian::read_uint(field, width))
}

/// 读取 16 位小端字段
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    read_uint_le(buf, offset, 2).map(|v| v as u16)
}

/// 读取 32 位小端字段
pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    read_uint_le(buf, offset, 4).map(|v| v as u32)
}
