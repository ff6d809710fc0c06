//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 架构相关代码
//!
//! 当前支持的架构：
//! - **hosted** - 以宿主线程模拟的多核机器：每个 CPU 与每个进程的
//!   内核栈各是一个宿主线程，上下文切换是两者之间的接力

pub mod hosted;

pub use hosted::context;
pub use hosted::cpu;
pub use hosted::cpu::{cpu_id, try_cpu_id};
