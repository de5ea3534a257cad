//! BMP Viewer - 在终端中查看 BMP 位图
//!
//! 打印位图文件头和 DIB 头, 再用 24 位真彩色转义序列把像素画到终端。
//! 支持的像素格式：
//! - 24/32 位 BI_RGB
//! - 32 位 BI_BITFIELDS (每个通道占一个字节)

#![warn(missing_docs)]
#![allow(dead_code)]

mod bitmap;
mod cli;
mod error;

use anyhow::Context;
use bitmap::{BmpHeaders, PixelRenderer, Rendering};
use cli::Options;
use std::io::{BufWriter, Write};

fn main() -> anyhow::Result<()> {
    let options = Options::parse(std::env::args().skip(1))?;

    if options.show_help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    if options.show_version {
        println!("{APP_NAME} {APP_VERSION}");
        return Ok(());
    }

    cli::init_logging(&options);

    run(&options).inspect_err(|e| tracing::error!("{:#}", e))
}

/// 读取、解析并渲染一个位图文件
fn run(options: &Options) -> anyhow::Result<()> {
    let path = match &options.path {
        Some(path) => path.clone(),
        None => cli::prompt_path(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
    };

    let bytes = bitmap::read_bitmap_file(&path)
        .with_context(|| format!("无法读取 {}", path.display()))?;

    let headers = BmpHeaders::parse(&bytes)
        .with_context(|| format!("无法解析 {}", path.display()))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    writeln!(out)?;
    writeln!(out, "{headers}")?;
    writeln!(out)?;

    if options.header_only {
        out.flush()?;
        return Ok(());
    }

    // 先完成全部校验, 任何错误都发生在输出像素之前
    let rendering = PixelRenderer::new(&headers, &bytes)
        .with_context(|| format!("无法渲染 {}", path.display()))?;

    if let Rendering::Unsupported { .. } = rendering {
        tracing::info!("{}", rendering);
    }

    bitmap::write_ansi(&rendering, &mut out)?;
    out.flush()?;
    Ok(())
}

/// 应用程序名称
pub const APP_NAME: &str = "BMP Viewer";

/// 应用程序版本（从 Cargo.toml 读取）
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_info() {
        assert_eq!(APP_NAME, "BMP Viewer");
    }
}
