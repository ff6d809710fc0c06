//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! PID 管理
//!
//! - PID 1: init 进程
//! - PID 2+: 普通 PID
//!
//! PID 单调递增、永不复用。计数器放在进程表锁保护的数据里，
//! 与槽位进入 Embryo 状态在同一个临界区完成；后续初始化失败时
//! 已消耗的 PID 不会归还，序列中允许出现空洞。

use super::proc::Pid;

pub const PID_INIT: Pid = 1;

#[derive(Debug)]
pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub const fn new() -> Self {
        Self { next: PID_INIT }
    }

    pub fn alloc(&mut self) -> Pid {
        let pid = self.next;
        self.next += 1;
        pid
    }

    /// 下一个将要分配的 PID
    pub fn peek(&self) -> Pid {
        self.next
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
