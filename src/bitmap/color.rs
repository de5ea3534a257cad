//! 真彩色与终端转义序列

use std::fmt;

/// 终端属性重置序列，整个输出结尾只追加一次
pub const RESET: &str = "\x1b[0m";

/// 实心方块字符
pub const FULL_BLOCK: char = '█';

/// 透明度阴影字符，从空白到实心
pub const ALPHA_RAMP: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 从 BMP 存储顺序 (B, G, R) 创建颜色
    pub fn from_bgr(bgr: &[u8]) -> Self {
        Self {
            b: bgr[0],
            g: bgr[1],
            r: bgr[2],
        }
    }

    /// 24 位前景色转义序列
    pub fn foreground(self) -> Foreground {
        Foreground(self)
    }

    /// 格式化为十六进制颜色字符串 (如 "#FF0000")
    pub fn to_hex_string(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb(#{:02X}{:02X}{:02X})", self.r, self.g, self.b)
    }
}

/// `ESC[38;2;R;G;Bm`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Foreground(pub Rgb);

impl fmt::Display for Foreground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb { r, g, b } = self.0;
        write!(f, "\x1b[38;2;{r};{g};{b}m")
    }
}

/// 按透明度选择阴影字符: `(alpha + 32) / 64`
pub fn alpha_glyph(alpha: u8) -> char {
    ALPHA_RAMP[(alpha as usize + 32) / 64]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bgr() {
        let color = Rgb::from_bgr(&[0x10, 0x20, 0x30]);
        assert_eq!(color, Rgb::new(0x30, 0x20, 0x10));
        assert_eq!(color.to_hex_string(), "#302010");
    }

    #[test]
    fn test_foreground_escape() {
        let escape = Rgb::new(255, 128, 0).foreground().to_string();
        assert_eq!(escape, "\x1b[38;2;255;128;0m");
    }

    #[test]
    fn test_alpha_ramp() {
        assert_eq!(alpha_glyph(0), ' ');
        assert_eq!(alpha_glyph(31), ' ');
        assert_eq!(alpha_glyph(32), '░');
        assert_eq!(alpha_glyph(96), '▒');
        assert_eq!(alpha_glyph(160), '▓');
        assert_eq!(alpha_glyph(223), '▓');
        assert_eq!(alpha_glyph(224), '█');
        assert_eq!(alpha_glyph(255), FULL_BLOCK);
    }
}
