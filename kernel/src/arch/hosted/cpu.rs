//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! CPU 相关操作 (hosted)
//!
//! 每个模拟 CPU 的“寄存器”放在 [`CpuLocal`] 里：中断使能位、
//! 关中断嵌套深度 `ncli` 以及最外层加锁前的中断状态 `intena`。
//! 正在某个 CPU 上执行的宿主线程通过线程局部变量绑定到它，
//! 上下文切换时绑定随接力一起转移。

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 机器停机时用于展开宿主线程栈的载荷
#[derive(Debug)]
pub struct Halted;

/// 单个 CPU 的硬件状态
#[derive(Debug)]
pub struct CpuLocal {
    id: usize,
    /// 中断使能位
    intr: AtomicBool,
    /// push_off 嵌套深度
    ncli: AtomicU32,
    /// 最外层 push_off 之前中断是否打开
    intena: AtomicBool,
    halted: Arc<AtomicBool>,
}

impl CpuLocal {
    pub fn new(id: usize, halted: Arc<AtomicBool>) -> Self {
        Self {
            id,
            intr: AtomicBool::new(false),
            ncli: AtomicU32::new(0),
            intena: AtomicBool::new(false),
            halted,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn ncli(&self) -> u32 {
        self.ncli.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn intena(&self) -> bool {
        self.intena.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_intena(&self, on: bool) {
        self.intena.store(on, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}

thread_local! {
    static THIS_CPU: RefCell<Option<Arc<CpuLocal>>> = const { RefCell::new(None) };
}

/// 把当前宿主线程绑定到 CPU
pub fn bind(cpu: Arc<CpuLocal>) {
    THIS_CPU.with(|c| *c.borrow_mut() = Some(cpu));
}

pub fn unbind() {
    THIS_CPU.with(|c| c.borrow_mut().take());
}

fn with_cpu<R>(f: impl FnOnce(&CpuLocal) -> R) -> R {
    THIS_CPU.with(|c| match c.borrow().as_deref() {
        Some(cpu) => f(cpu),
        None => panic!("unknown apicid"),
    })
}

/// 当前 CPU 的硬件状态
pub fn this_cpu() -> Arc<CpuLocal> {
    THIS_CPU.with(|c| c.borrow().clone()).unwrap_or_else(|| panic!("unknown apicid"))
}

/// 获取当前核心 ID；线程未绑定任何 CPU 时停机
pub fn cpu_id() -> usize {
    with_cpu(|cpu| cpu.id)
}

pub fn try_cpu_id() -> Option<usize> {
    THIS_CPU.with(|c| c.borrow().as_ref().map(|cpu| cpu.id))
}

/// 使能中断
#[inline]
pub fn enable_irq() {
    with_cpu(|cpu| cpu.intr.store(true, Ordering::Relaxed));
}

/// 禁用中断
#[inline]
pub fn disable_irq() {
    with_cpu(|cpu| cpu.intr.store(false, Ordering::Relaxed));
}

/// 获取中断使能状态
#[inline]
pub fn irq_enabled() -> bool {
    with_cpu(|cpu| cpu.intr.load(Ordering::Relaxed))
}

/// 关中断并增加嵌套深度
///
/// 最外层调用记录原来的中断状态，与 [`pop_off`] 成对使用。
pub fn push_off() {
    with_cpu(|cpu| {
        let old = cpu.intr.swap(false, Ordering::Relaxed);
        if cpu.ncli.load(Ordering::Relaxed) == 0 {
            cpu.intena.store(old, Ordering::Relaxed);
        }
        cpu.ncli.fetch_add(1, Ordering::Relaxed);
    });
}

/// 减少嵌套深度，回到最外层时恢复中断状态
pub fn pop_off() {
    with_cpu(|cpu| {
        if cpu.intr.load(Ordering::Relaxed) {
            panic!("pop_off - interruptible");
        }
        let depth = cpu.ncli.load(Ordering::Relaxed);
        if depth == 0 {
            panic!("pop_off");
        }
        cpu.ncli.store(depth - 1, Ordering::Relaxed);
        if depth == 1 && cpu.intena.load(Ordering::Relaxed) {
            cpu.intr.store(true, Ordering::Relaxed);
        }
    });
}

/// 忙等循环的一次让步
///
/// 机器已停机时展开当前线程，避免等待永远不会释放的锁。
#[inline]
pub fn relax() {
    core::hint::spin_loop();
    let halted = THIS_CPU.with(|c| c.borrow().as_ref().map(|cpu| cpu.is_halted()));
    if halted == Some(true) {
        halt_unwind();
    }
}

/// 等待中断：空闲的调度循环让出宿主 CPU
pub fn wfi() {
    std::thread::sleep(Duration::from_micros(20));
}

/// 展开当前宿主线程，不触发 panic hook
pub fn halt_unwind() -> ! {
    std::panic::resume_unwind(Box::new(Halted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_cpu() -> Arc<CpuLocal> {
        let cpu = Arc::new(CpuLocal::new(0, Arc::new(AtomicBool::new(false))));
        bind(cpu.clone());
        cpu
    }

    #[test]
    fn test_push_pop_restores_outer_state() {
        let cpu = bound_cpu();
        enable_irq();
        push_off();
        push_off();
        assert!(!irq_enabled());
        assert_eq!(cpu.ncli(), 2);
        pop_off();
        assert!(!irq_enabled());
        pop_off();
        assert!(irq_enabled());
        assert_eq!(cpu.ncli(), 0);
        unbind();
    }

    #[test]
    fn test_push_pop_keeps_disabled() {
        let cpu = bound_cpu();
        disable_irq();
        push_off();
        pop_off();
        assert!(!irq_enabled());
        assert!(!cpu.intena());
        unbind();
    }

    #[test]
    #[should_panic(expected = "pop_off")]
    fn test_unbalanced_pop_off() {
        bound_cpu();
        pop_off();
    }

    #[test]
    #[should_panic(expected = "unknown apicid")]
    fn test_unbound_thread() {
        cpu_id();
    }
}
