//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 时钟与陷入处理
//!
//! 模拟机没有真正的定时器硬件：CPU 0 在调度循环每一轮、进程每次
//! 陷入内核（系统调用返回、yield、[`Kernel::timer_interrupt`]）时
//! 检查 [`Clock`]，到期则推进 `ticks` 并唤醒在时钟通道上睡眠的进程。
//! 调用者不得持有进程表锁。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::arch::cpu;
use crate::errno::Errno;
use crate::kernel::Kernel;
use crate::process::Channel;

/// 时钟中断源
pub struct Clock {
    start: Instant,
    interval_ns: u64,
    /// 下一次触发时刻，相对 `start` 的纳秒数
    next_ns: AtomicU64,
}

impl Clock {
    pub fn new(interval: Duration) -> Self {
        let interval_ns = (interval.as_nanos() as u64).max(1);
        Self {
            start: Instant::now(),
            interval_ns,
            next_ns: AtomicU64::new(interval_ns),
        }
    }

    /// 是否到了触发时刻；返回 true 时已设置下一次触发 (set_next_trigger)
    pub fn due(&self) -> bool {
        let now = self.start.elapsed().as_nanos() as u64;
        let next = self.next_ns.load(Ordering::Acquire);
        if now < next {
            return false;
        }
        self.next_ns
            .compare_exchange(next, now + self.interval_ns, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Kernel {
    /// 时钟中断：只有 CPU 0 推进 ticks
    pub(crate) fn clock_interrupt(&self) {
        if cpu::cpu_id() != 0 || !self.clock.due() {
            return;
        }
        let mut ticks = self.ticks.lock();
        *ticks += 1;
        self.wakeup(Channel::Ticks);
        drop(ticks);
    }

    /// 进程运行期间到来的定时器中断
    ///
    /// 时间片用完时让出 CPU；已被 kill 的进程在返回用户态前退出。
    pub fn timer_interrupt(&self) {
        self.clock_interrupt();
        if self.myproc().is_none() {
            return;
        }

        self.return_to_user();
        if self.check_time() {
            self.yield_now();
        }
        self.return_to_user();
    }

    /// 返回用户态前的检查
    pub(crate) fn return_to_user(&self) {
        if self.killed() {
            self.exit();
        }
    }

    /// 当前 ticks (uptime)
    pub fn uptime(&self) -> u64 {
        *self.ticks.lock()
    }

    /// 睡眠 `n` 个时钟滴答 (sleep)
    ///
    /// 等待期间被 kill 返回 `Interrupted`。
    pub fn sleep_ticks(&self, n: u64) -> Result<(), Errno> {
        let mut ticks = self.ticks.lock();
        let ticks0 = *ticks;
        while *ticks - ticks0 < n {
            if self.killed() {
                return Err(Errno::Interrupted);
            }
            ticks = self.sleep(Channel::Ticks, ticks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_fires_once_per_interval() {
        let clock = Clock::new(Duration::from_millis(20));
        assert!(!clock.due());
        thread::sleep(Duration::from_millis(25));
        assert!(clock.due());
        // 下一次触发点已经后移
        assert!(!clock.due());
    }
}
