//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! Per-CPU 描述符
//!
//! 记录分配到此 CPU 的进程、调度循环的上下文，以及与
//! 锁嵌套相关的硬件状态（见 [`CpuLocal`]）。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::arch::context::Context;
use crate::arch::cpu::CpuLocal;

const NO_PROC: usize = usize::MAX;

pub struct Cpu {
    local: Arc<CpuLocal>,
    /// 没有进程运行时返回的调度循环上下文
    context: Context,
    /// 正在此 CPU 上运行的进程槽位
    proc: AtomicUsize,
}

impl Cpu {
    pub fn new(id: usize, halted: &Arc<AtomicBool>) -> Self {
        Self {
            local: Arc::new(CpuLocal::new(id, halted.clone())),
            context: Context::new(halted.clone()),
            proc: AtomicUsize::new(NO_PROC),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.local.id()
    }

    pub fn local(&self) -> &Arc<CpuLocal> {
        &self.local
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    #[inline]
    pub fn proc(&self) -> Option<usize> {
        match self.proc.load(Ordering::Acquire) {
            NO_PROC => None,
            slot => Some(slot),
        }
    }

    #[inline]
    pub(crate) fn set_proc(&self, slot: Option<usize>) {
        self.proc.store(slot.unwrap_or(NO_PROC), Ordering::Release);
    }
}
