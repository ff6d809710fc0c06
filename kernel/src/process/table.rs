//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程表
//!
//! 固定容量的 PCB 槽位数组，由一把表级自旋锁保护。它是所有进程
//! 状态的唯一事实来源：任何依据 PCB 字段做出的决定、任何状态迁移
//! 都必须在持锁期间完成。

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::arch::context::Context;
use crate::errno::Errno;
use crate::kernel::Kernel;
use crate::sync::{SpinLock, SpinLockGuard};
use crate::syscall::UserProc;

use super::pid::PidAllocator;
use super::proc::{Channel, Pid, Proc, ProcState};

/// 进程表锁保护的数据
pub struct TableInner {
    pub procs: Vec<Proc>,
    pub pids: PidAllocator,
}

pub type TableGuard<'a> = SpinLockGuard<'a, TableInner>;

impl TableInner {
    /// 按 pid 查找活跃进程的槽位
    pub fn find(&self, pid: Pid) -> Option<usize> {
        self.procs
            .iter()
            .position(|p| p.is_active() && p.pid == pid)
    }

    /// 唤醒所有睡在 `chan` 上的进程，调用者持有进程表锁
    pub fn wakeup1(&mut self, chan: Channel) {
        for p in self.procs.iter_mut() {
            if p.state() == ProcState::Sleeping && p.chan == Some(chan) {
                p.set_state(ProcState::Runnable);
            }
        }
    }
}

pub struct ProcTable {
    lock: SpinLock<TableInner>,
    /// 根进程槽位，孤儿进程的新父进程
    init: spin::Once<usize>,
}

impl ProcTable {
    pub fn new(nproc: usize, nofile: usize) -> Self {
        Self {
            lock: SpinLock::new(
                "ptable",
                TableInner {
                    procs: (0..nproc).map(|_| Proc::new(nofile)).collect(),
                    pids: PidAllocator::new(),
                },
            ),
            init: spin::Once::new(),
        }
    }

    #[inline]
    pub fn lock(&self) -> TableGuard<'_> {
        self.lock.lock()
    }

    #[inline]
    pub fn holding(&self) -> bool {
        self.lock.holding()
    }

    /// 接管调度循环在当前 CPU 上加的进程表锁
    ///
    /// # Safety
    ///
    /// 只能在进程第一次被调度、尚未持有任何守卫时调用。
    pub(crate) unsafe fn adopt(&self) -> TableGuard<'_> {
        self.lock.adopt()
    }

    pub fn init_slot(&self) -> Option<usize> {
        self.init.get().copied()
    }

    pub(crate) fn set_init(&self, slot: usize) {
        self.init.call_once(|| slot);
    }

    /// 不加锁读取进程表，只用于诊断输出
    ///
    /// # Safety
    ///
    /// 读到的内容可能正处于修改之中。
    pub(crate) unsafe fn peek(&self) -> &TableInner {
        &*self.lock.data_ptr()
    }
}

impl Kernel {
    /// 分配一个进程槽位 (allocproc)
    ///
    /// 持锁找到空闲槽位、分配 pid 并置为 Embryo，然后在锁外分配内核栈。
    /// 内核栈分配失败时槽位退回 Unused，已经用掉的 pid 不再回收。
    pub(crate) fn allocate(self: &Arc<Self>) -> Result<usize, Errno> {
        let (slot, pid) = {
            let mut ptable = self.ptable.lock();
            let slot = ptable
                .procs
                .iter()
                .position(|p| p.state() == ProcState::Unused)
                .ok_or(Errno::TryAgain)?;
            let pid = ptable.pids.alloc();
            let p = &mut ptable.procs[slot];
            p.pid = pid;
            p.clear_counters();
            p.set_state(ProcState::Embryo);
            (slot, pid)
        };

        let kernel = self.clone();
        let stack = self
            .kstacks
            .alloc(format!("proc-{}", pid), move |ctx| proc_main(kernel, ctx));

        let mut ptable = self.ptable.lock();
        let p = &mut ptable.procs[slot];
        match stack {
            Ok(stack) => {
                p.kstack = Some(stack);
                log::debug!("allocate: pid {} in slot {}", pid, slot);
                Ok(slot)
            }
            Err(err) => {
                p.set_state(ProcState::Unused);
                p.pid = 0;
                log::warn!("allocate: pid {} has no kernel stack: {}", pid, err);
                Err(err)
            }
        }
    }
}

/// 进程内核栈线程的入口
fn proc_main(kernel: Arc<Kernel>, ctx: Arc<Context>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        // 等待第一次被调度
        ctx.wait();
        let program = kernel.forkret();
        let user = UserProc::new(kernel.clone());
        program(&user);
        kernel.program_returned();
    }));
    if let Err(payload) = outcome {
        kernel.on_thread_unwind(payload);
    }
}
