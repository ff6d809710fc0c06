//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 睡眠与唤醒
//!
//! 进程在某个 [`Channel`] 上睡眠，另一方对同一通道调用 wakeup 时被唤醒。
//! 两个操作都要持有进程表锁；睡眠方先拿到进程表锁再释放条件锁，
//! 所以条件检查与进入睡眠之间发生的 wakeup 不会丢失。
//! 被唤醒只代表“条件可能已满足”，调用者应在循环中重新检查。

use crate::kernel::Kernel;
use crate::process::{Channel, ProcState, TableGuard};
use crate::sync::SpinLockGuard;

impl Kernel {
    /// 在 `chan` 上睡眠，期间释放 `lk`，返回前重新获取
    ///
    /// `lk` 不能是进程表锁本身，持有进程表锁的调用者使用
    /// [`Kernel::sleep_locked`]。
    pub fn sleep<'a, T>(&self, chan: Channel, lk: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T> {
        if self.myproc().is_none() {
            panic!("sleep without proc");
        }
        let lock = SpinLockGuard::spinlock(&lk);

        // 必须先持有进程表锁再释放 lk
        let ptable = self.ptable.lock();
        drop(lk);

        let ptable = self.sleep_locked(chan, ptable);

        drop(ptable);
        lock.lock()
    }

    /// 持有进程表锁时在 `chan` 上睡眠，返回时仍持有
    pub(crate) fn sleep_locked<'a>(&self, chan: Channel, mut ptable: TableGuard<'a>) -> TableGuard<'a> {
        let me = self
            .myproc()
            .unwrap_or_else(|| panic!("sleep without proc"));

        let p = &mut ptable.procs[me];
        p.chan = Some(chan);
        p.set_state(ProcState::Sleeping);

        let mut ptable = self.sched(ptable);

        ptable.procs[me].chan = None;
        ptable
    }

    /// 唤醒所有睡在 `chan` 上的进程
    pub fn wakeup(&self, chan: Channel) {
        let mut ptable = self.ptable.lock();
        ptable.wakeup1(chan);
    }
}
