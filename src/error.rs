//! 错误类型定义

use thiserror::Error;

/// BMP 查看器错误类型
#[derive(Error, Debug)]
pub enum BmpError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("文件未找到: {0}")]
    FileNotFound(String),

    /// 缓冲区长度不足以容纳所需的字节
    #[error("输入被截断: 需要 {needed} 字节, 实际只有 {actual} 字节")]
    TruncatedInput { needed: usize, actual: usize },

    #[error("无效的文件格式: 文件签名 {0:02X?} 不是 \"BM\"")]
    InvalidSignature([u8; 2]),

    #[error("无效的文件格式: 未知的压缩方式 {0}")]
    UnknownCompression(u32),

    /// 颜色通道掩码不是单字节 0xFF
    #[error("无效的文件格式: {channel} 通道掩码 {mask:#010X} 不是单字节掩码")]
    InvalidBitmask { channel: &'static str, mask: u32 },

    #[error("无效的参数: {0}")]
    InvalidArgument(String),
}

impl BmpError {
    /// 是否属于文件格式错误（签名、压缩方式、掩码）
    pub fn is_invalid_format(&self) -> bool {
        matches!(
            self,
            BmpError::InvalidSignature(_)
                | BmpError::UnknownCompression(_)
                | BmpError::InvalidBitmask { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BmpError>;
