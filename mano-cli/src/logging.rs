//! 日志初始化
//!
//! 日志统一输出到 stderr，stdout 只保留解析结果，方便管道处理。

use tracing::Level;

/// 由命令行参数决定日志级别
///
/// - `--quiet`：ERROR
/// - 默认：WARN
/// - `-v`：DEBUG
/// - `-vv`：TRACE
pub fn level_from_flags(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// 初始化全局日志订阅者
pub fn init(verbose: u8, quiet: bool) {
    tracing_subscriber::fmt()
        .with_max_level(level_from_flags(verbose, quiet))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
