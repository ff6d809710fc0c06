//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 日志系统
//!
//! 实现 `log` crate 的 `Log` 接口，经由内核控制台输出。
//!
//! ## 日志格式
//!
//! ```text
//! LEVEL [CPU0] [module::name] message
//! ```
//!
//! 尚未绑定到任何 CPU 的宿主线程（例如启动线程）显示为 `[CPU-]`。
//!
//! ## 级别
//!
//! 编译时环境变量 `LOG`（ERROR/WARN/INFO/DEBUG/TRACE）优先，
//! 否则使用 Kernel.toml 中的 `debug.log_level`。

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::arch;
use crate::config::LOG_LEVEL;

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let color = match record.level() {
            Level::Error => 31, // 红色
            Level::Warn => 93,  // 亮黄色
            Level::Info => 34,  // 蓝色
            Level::Debug => 32, // 绿色
            Level::Trace => 90, // 暗灰色
        };

        match arch::cpu::try_cpu_id() {
            Some(id) => kprintln!(
                "\u{1B}[{}m{:>5} [CPU{}] [{}] {}\u{1B}[0m",
                color,
                record.level(),
                id,
                record.target(),
                record.args()
            ),
            None => kprintln!(
                "\u{1B}[{}m{:>5} [CPU-] [{}] {}\u{1B}[0m",
                color,
                record.level(),
                record.target(),
                record.args()
            ),
        }
    }

    fn flush(&self) {}
}

fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_uppercase().as_str() {
        "OFF" => Some(LevelFilter::Off),
        "ERROR" => Some(LevelFilter::Error),
        "WARN" => Some(LevelFilter::Warn),
        "INFO" => Some(LevelFilter::Info),
        "DEBUG" => Some(LevelFilter::Debug),
        "TRACE" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// 初始化日志系统
///
/// 可以重复调用：同一进程里启动多台模拟机时，只有第一次会安装记录器。
pub fn init() {
    static LOGGER: SimpleLogger = SimpleLogger;

    if log::set_logger(&LOGGER).is_err() {
        return;
    }
    let level = option_env!("LOG")
        .and_then(parse_level)
        .or_else(|| parse_level(LOG_LEVEL))
        .unwrap_or(LevelFilter::Info);
    log::set_max_level(level);
}
