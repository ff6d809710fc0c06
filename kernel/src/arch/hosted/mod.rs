//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 宿主线程模拟的机器

pub mod context;
pub mod cpu;
