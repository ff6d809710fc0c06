//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 控制台
//!
//! 模拟机的串口即宿主的标准输出。整行写入，多个 CPU 同时打印时
//! 行与行之间不会交错。

use std::io::{self, Write};

/// 写入一段文本
pub fn write_str(s: &str) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // 控制台写失败没有可以上报的地方
    let _ = out.write_all(s.as_bytes());
    let _ = out.flush();
}
