//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! - `percpu`: CPU 描述符
//! - `policy`: FCFS / SJF / HBSJF 选择策略
//! - `sched`: 调度循环、sched、yield、forkret
//! - `sleep`: 睡眠与唤醒
//! - `burst`: burst_time 与时间片簿记

pub mod burst;
pub mod percpu;
pub mod policy;
pub mod sched;
pub mod sleep;

pub use percpu::Cpu;
pub use policy::{PolicyKind, SchedPolicy};
