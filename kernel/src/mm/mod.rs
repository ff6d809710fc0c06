//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内存管理模块
//!
//! 进程管理只通过很窄的接口使用这里的对象：分配/释放内核栈，
//! 复制地址空间，读取地址空间大小。

pub mod kstack;
pub mod vm;

pub use kstack::{KernelStack, KernelStacks};
pub use vm::AddressSpace;

pub const PAGE_SIZE: usize = 4096;
