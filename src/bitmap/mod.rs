//! BMP 位图解码模块
//!
//! 头部解析与像素渲染分开实现，两者共享同一块只读缓冲区。

pub mod bytes;
pub mod color;
pub mod header;
pub mod render;

pub use header::BmpHeaders;
pub use render::{PixelRenderer, Rendering, write_ansi};

use crate::error::{BmpError, Result};
use std::path::Path;

/// 一次性读取整个位图文件
pub fn read_bitmap_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(BmpError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    tracing::debug!("读取 {:?}: {} 字节", path, bytes.len());
    Ok(bytes)
}
