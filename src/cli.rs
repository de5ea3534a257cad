//! 命令行参数、交互输入与日志初始化

use crate::error::{BmpError, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// 帮助信息
pub const USAGE: &str = "\
Usage: bmp_viewer [OPTIONS] [PATH]

Print the headers of a BMP file and draw it in the terminal with 24-bit color.
Without PATH the program asks for one.

Options:
  -v, --verbose       Enable debug logging on stderr
      --header-only   Print the headers without drawing the image
      --log-dir <DIR> Also write a daily log file into DIR
  -h, --help          Print this help
  -V, --version       Print the version";

/// 命令行选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// 位图路径, 为空时交互输入
    pub path: Option<PathBuf>,
    pub verbose: bool,
    pub header_only: bool,
    pub log_dir: Option<PathBuf>,
    pub show_help: bool,
    pub show_version: bool,
}

impl Options {
    /// 解析参数（不含程序名）
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => options.show_help = true,
                "-V" | "--version" => options.show_version = true,
                "-v" | "--verbose" => options.verbose = true,
                "--header-only" => options.header_only = true,
                "--log-dir" => {
                    let dir = args.next().ok_or_else(|| {
                        BmpError::InvalidArgument("--log-dir 需要一个目录".to_string())
                    })?;
                    options.log_dir = Some(PathBuf::from(dir));
                }
                flag if flag.starts_with('-') && flag != "-" => {
                    return Err(BmpError::InvalidArgument(format!("未知选项: {flag}")));
                }
                path => {
                    if options.path.is_some() {
                        return Err(BmpError::InvalidArgument(format!("多余的参数: {path}")));
                    }
                    options.path = Some(PathBuf::from(path));
                }
            }
        }

        Ok(options)
    }
}

/// 交互式读取图像路径
pub fn prompt_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<PathBuf> {
    write!(output, "Enter path to your image: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let path = line.trim();
    if path.is_empty() {
        return Err(BmpError::InvalidArgument("未输入图像路径".to_string()));
    }
    Ok(PathBuf::from(path))
}

/// 初始化日志 - 控制台输出到 stderr, 可选同时写入文件
///
/// `RUST_LOG` 优先; 否则默认 warn, `--verbose` 时为 debug。
pub fn init_logging(options: &Options) {
    let default_level = if options.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout 只留给头部信息和图像
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_level(true)
        .with_target(false);

    let file_layer = options.log_dir.as_ref().map(|dir| {
        tracing_subscriber::fmt::layer()
            .with_writer(rolling::daily(dir, "bmp-viewer.log"))
            .with_ansi(false)
            .with_level(true)
            .with_target(true)
    });

    Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        Options::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse(&[]).unwrap(), Options::default());
    }

    #[test]
    fn test_path_and_flags() {
        let options = parse(&["-v", "image.bmp", "--header-only", "--log-dir", "logs"]).unwrap();
        assert_eq!(options.path, Some(PathBuf::from("image.bmp")));
        assert!(options.verbose);
        assert!(options.header_only);
        assert_eq!(options.log_dir, Some(PathBuf::from("logs")));
        assert!(!options.show_help);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(parse(&["--bogus"]), Err(BmpError::InvalidArgument(_))));
        assert!(matches!(parse(&["a.bmp", "b.bmp"]), Err(BmpError::InvalidArgument(_))));
        assert!(matches!(parse(&["--log-dir"]), Err(BmpError::InvalidArgument(_))));
    }

    #[test]
    fn test_prompt_path() {
        let mut input = &b"  pictures/cat.bmp \n"[..];
        let mut output = Vec::new();

        let path = prompt_path(&mut input, &mut output).unwrap();
        assert_eq!(path, PathBuf::from("pictures/cat.bmp"));
        assert_eq!(output, b"Enter path to your image: ");
    }

    #[test]
    fn test_prompt_empty() {
        let mut input = &b"\n"[..];
        let mut output = Vec::new();
        assert!(prompt_path(&mut input, &mut output).is_err());
    }
}
