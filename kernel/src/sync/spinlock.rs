//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 自旋锁
//!
//! - [`RawSpinLock`]: 只有一个标志位的忙等锁，用户态代码直接使用，
//!   也是内核锁与 [`BackoffMutex`](super::BackoffMutex) 的底层原语
//! - [`SpinLock`]: 内核锁。加锁时关中断（按 CPU 计数嵌套），记录
//!   持有者 CPU，可以跨越上下文切换由另一个执行流释放
//!
//! 内存序：加锁成功后一次全屏障，解锁时先全屏障再写 0。

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};

use crate::arch::cpu;

/// 忙等锁
pub struct RawSpinLock {
    locked: AtomicBool,
}

impl RawSpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// 尝试一次原子交换，成功返回 true
    #[inline]
    pub fn try_lock(&self) -> bool {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            // 让上一个持有者在临界区内的写入对本执行流可见
            fence(Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// 忙等直到获得锁，不会让出 CPU
    pub fn lock(&self) {
        self.lock_with(cpu::relax);
    }

    /// 忙等直到获得锁，每次失败后调用 `poll`
    ///
    /// 用户态代码可以在 `poll` 里放一个时钟中断投递点，
    /// 这样自旋中的进程仍然会因时间片用完被抢占。
    pub fn lock_with(&self, mut poll: impl FnMut()) {
        while !self.try_lock() {
            poll();
        }
    }

    #[inline]
    pub fn unlock(&self) {
        fence(Ordering::SeqCst);
        self.locked.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

const NO_OWNER: usize = usize::MAX;

/// 内核自旋锁
///
/// 同一 CPU 重复加锁、释放未持有的锁都会停机。
pub struct SpinLock<T> {
    raw: RawSpinLock,
    /// 持有者 CPU
    owner: AtomicUsize,
    name: &'static str,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(name: &'static str, data: T) -> Self {
        Self {
            raw: RawSpinLock::new(),
            owner: AtomicUsize::new(NO_OWNER),
            name,
            data: UnsafeCell::new(data),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 加锁，返回的守卫在析构时释放锁
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        // 关中断，避免时钟中断处理再次获取同一把锁
        cpu::push_off();
        if self.holding() {
            panic!("acquire {}", self.name);
        }
        self.raw.lock();
        self.owner.store(cpu::cpu_id(), Ordering::Relaxed);
        SpinLockGuard { lock: self }
    }

    /// 当前 CPU 是否持有此锁
    pub fn holding(&self) -> bool {
        self.raw.is_locked() && self.owner.load(Ordering::Relaxed) == cpu::cpu_id()
    }

    fn release(&self) {
        if !self.holding() {
            panic!("release {}", self.name);
        }
        self.owner.store(NO_OWNER, Ordering::Relaxed);
        self.raw.unlock();
        cpu::pop_off();
    }

    /// 为另一个执行流加上、当前 CPU 持有的锁生成守卫
    ///
    /// # Safety
    ///
    /// 调用者手里没有此锁的守卫：典型情况是新进程第一次被调度，
    /// 调度循环加的锁要由它来释放。
    pub unsafe fn adopt(&self) -> SpinLockGuard<'_, T> {
        if !self.holding() {
            panic!("adopt {}", self.name);
        }
        SpinLockGuard { lock: self }
    }

    /// 不加锁读取数据的裸指针
    ///
    /// # Safety
    ///
    /// 只能用于诊断输出这类允许读到中间状态的场合。
    pub unsafe fn data_ptr(&self) -> *const T {
        self.data.get()
    }
}

/// [`SpinLock`] 的守卫
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<'a, T> SpinLockGuard<'a, T> {
    /// 守卫对应的锁
    pub fn spinlock(guard: &Self) -> &'a SpinLock<T> {
        guard.lock
    }
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // 栈展开意味着机器停机或内核栈已被回收，锁状态不再有意义
        if std::thread::panicking() {
            return;
        }
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::cpu::CpuLocal;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn bind_cpu(id: usize) -> Arc<CpuLocal> {
        let cpu = Arc::new(CpuLocal::new(id, Arc::new(AtomicBool::new(false))));
        cpu::bind(cpu.clone());
        cpu
    }

    #[test]
    fn test_raw_lock_excludes() {
        let lock = RawSpinLock::new();
        assert!(lock.try_lock());
        assert!(!lock.try_lock());
        lock.unlock();
        assert!(lock.try_lock());
    }

    #[test]
    fn test_raw_lock_liveness() {
        let lock = Arc::new(RawSpinLock::new());
        lock.lock();

        let l = lock.clone();
        let spinner = thread::spawn(move || {
            let mut polls: u64 = 0;
            l.lock_with(|| {
                polls += 1;
                assert!(polls < 1 << 40, "spinner never observed the release");
                core::hint::spin_loop();
            });
            l.unlock();
            polls
        });

        thread::sleep(Duration::from_millis(5));
        lock.unlock();
        let polls = spinner.join().unwrap();
        assert!(polls < 1 << 40);
    }

    #[test]
    fn test_kernel_lock_disables_interrupts() {
        let cpu = bind_cpu(0);
        cpu::enable_irq();
        let lock = SpinLock::new("test", 0u32);
        {
            let mut guard = lock.lock();
            *guard += 1;
            assert!(lock.holding());
            assert!(!cpu::irq_enabled());
            assert_eq!(cpu.ncli(), 1);
        }
        assert!(!lock.holding());
        assert!(cpu::irq_enabled());
        assert_eq!(*lock.lock(), 1);
        cpu::unbind();
    }

    #[test]
    fn test_nested_kernel_locks() {
        let cpu = bind_cpu(1);
        cpu::enable_irq();
        let a = SpinLock::new("a", ());
        let b = SpinLock::new("b", ());
        let ga = a.lock();
        let gb = b.lock();
        assert_eq!(cpu.ncli(), 2);
        drop(gb);
        assert!(!cpu::irq_enabled());
        drop(ga);
        assert!(cpu::irq_enabled());
        cpu::unbind();
    }

    #[test]
    #[should_panic(expected = "acquire test")]
    fn test_recursive_acquire_is_fatal() {
        bind_cpu(0);
        let lock = SpinLock::new("test", ());
        let _g1 = lock.lock();
        let _g2 = lock.lock();
    }

    #[test]
    #[should_panic(expected = "adopt test")]
    fn test_adopt_without_holding_is_fatal() {
        bind_cpu(0);
        let lock = SpinLock::new("test", ());
        let _guard = unsafe { lock.adopt() };
    }

    #[test]
    fn test_adopted_guard_releases() {
        let cpu = bind_cpu(2);
        let lock = SpinLock::new("test", 5u32);
        core::mem::forget(lock.lock());
        let guard = unsafe { lock.adopt() };
        assert_eq!(*guard, 5);
        drop(guard);
        assert!(!lock.holding());
        assert_eq!(cpu.ncli(), 0);
        cpu::unbind();
    }
}
