//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 上下文切换 (hosted)
//!
//! 每个执行流（CPU 的调度循环、进程的内核栈）各拥有一个 [`Context`]。
//! [`context_switch`] 把“接力棒”交给目标上下文，然后阻塞在自己的
//! 上下文上，直到有人把接力棒交回来。任一时刻一对上下文中只有一个
//! 线程在运行，接力棒携带着当前 CPU，被唤醒的线程据此重新绑定。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use super::cpu::{self, CpuLocal};

/// 等待接力棒时检查停机标志的周期
const HALT_POLL: Duration = Duration::from_millis(5);

/// 内核栈被父进程回收时用于展开僵尸线程的载荷
#[derive(Debug)]
pub struct Reaped;

enum Handoff {
    /// 在给定 CPU 上继续执行
    Resume(Arc<CpuLocal>),
    /// 内核栈已释放，线程应当结束
    Reap,
}

/// 一个执行流保存的上下文
pub struct Context {
    baton: Mutex<Option<Handoff>>,
    cv: Condvar,
    halted: Arc<AtomicBool>,
}

impl Context {
    pub fn new(halted: Arc<AtomicBool>) -> Self {
        Self {
            baton: Mutex::new(None),
            cv: Condvar::new(),
            halted,
        }
    }

    fn post(&self, handoff: Handoff) {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        *baton = Some(handoff);
        self.cv.notify_one();
    }

    /// 阻塞直到拿到接力棒
    ///
    /// 拿到 `Resume` 时绑定到对应 CPU 后返回；拿到 `Reap` 或机器停机时
    /// 展开当前线程，不再返回。
    pub fn wait(&self) {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match baton.take() {
                Some(Handoff::Resume(on)) => {
                    drop(baton);
                    cpu::bind(on);
                    return;
                }
                Some(Handoff::Reap) => {
                    drop(baton);
                    cpu::unbind();
                    std::panic::resume_unwind(Box::new(Reaped));
                }
                None => {}
            }
            if self.halted.load(Ordering::Acquire) {
                drop(baton);
                cpu::halt_unwind();
            }
            baton = self
                .cv
                .wait_timeout(baton, HALT_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// 释放内核栈：让阻塞在此上下文上的线程结束
    pub fn reap(&self) {
        self.post(Handoff::Reap);
    }
}

/// 从 `from` 切换到 `to`
///
/// 当前 CPU 随接力棒交给 `to`；返回时调用者已经重新绑定到
/// 把接力棒交回来的那个 CPU，不一定是原来的 CPU。
pub fn context_switch(from: &Context, to: &Context) {
    to.post(Handoff::Resume(cpu::this_cpu()));
    from.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_switch_round_trip() {
        let halted = Arc::new(AtomicBool::new(false));
        let sched = Arc::new(Context::new(halted.clone()));
        let task = Arc::new(Context::new(halted.clone()));

        let (s, t) = (sched.clone(), task.clone());
        let handle = thread::spawn(move || {
            t.wait();
            let id = cpu::cpu_id();
            context_switch(&t, &s);
            id
        });

        cpu::bind(Arc::new(CpuLocal::new(3, halted)));
        context_switch(&sched, &task);
        assert_eq!(cpu::cpu_id(), 3);
        task.reap();
        // 被回收的线程以 Reaped 载荷结束
        let err = handle.join().unwrap_err();
        assert!(err.downcast_ref::<Reaped>().is_some());
        cpu::unbind();
    }

    #[test]
    fn test_wait_unwinds_on_halt() {
        let halted = Arc::new(AtomicBool::new(false));
        let ctx = Arc::new(Context::new(halted.clone()));
        let c = ctx.clone();
        let handle = thread::spawn(move || c.wait());
        halted.store(true, Ordering::Release);
        let err = handle.join().unwrap_err();
        assert!(err.downcast_ref::<cpu::Halted>().is_some());
    }
}
