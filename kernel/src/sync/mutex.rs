//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 退避互斥锁
//!
//! 与 [`RawSpinLock`] 使用同一个原子交换，区别在于获取失败时调用者
//! 让出 CPU 一段固定时间再重试，适合临界区可能很长的场合。
//!
//! 等待者之间没有先后顺序：被唤醒的一方可能立即又输给别人，
//! 饥饿是允许出现的。

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use std::time::Duration;

use super::spinlock::RawSpinLock;
use crate::config::{MUTEX_BACKOFF_TICKS, TICK_INTERVAL_US};

/// 获取失败后的让步方式
pub trait Backoff {
    /// 让出 CPU 一段固定时间
    fn backoff(&self);
}

/// 普通宿主线程的让步：睡眠若干个时钟滴答的时长
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBackoff;

impl Backoff for ThreadBackoff {
    fn backoff(&self) {
        std::thread::sleep(Duration::from_micros(TICK_INTERVAL_US * MUTEX_BACKOFF_TICKS));
    }
}

/// 退避互斥锁
///
/// # 示例
///
/// ```rust
/// use burst::sync::{BackoffMutex, ThreadBackoff};
///
/// let total = BackoffMutex::new(0u64);
/// *total.lock(&ThreadBackoff) += 3200;
/// assert_eq!(*total.lock(&ThreadBackoff), 3200);
/// ```
pub struct BackoffMutex<T> {
    raw: RawSpinLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for BackoffMutex<T> {}
unsafe impl<T: Send> Send for BackoffMutex<T> {}

impl<T> BackoffMutex<T> {
    pub const fn new(data: T) -> Self {
        Self {
            raw: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// 获取锁；每次失败都调用一次 `backoff`
    pub fn lock<B: Backoff + ?Sized>(&self, backoff: &B) -> BackoffMutexGuard<'_, T> {
        while !self.raw.try_lock() {
            backoff.backoff();
        }
        BackoffMutexGuard { mutex: self }
    }

    pub fn try_lock(&self) -> Option<BackoffMutexGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(BackoffMutexGuard { mutex: self })
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// [`BackoffMutex`] 的守卫，析构时解锁
pub struct BackoffMutexGuard<'a, T> {
    mutex: &'a BackoffMutex<T>,
}

impl<T> Deref for BackoffMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for BackoffMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for BackoffMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;

    const N: u64 = 2000;

    /// 模拟一段较慢的计算
    fn delay(units: u32) {
        for _ in 0..units {
            core::hint::spin_loop();
        }
    }

    struct CountingBackoff(Arc<AtomicU64>);

    impl Backoff for CountingBackoff {
        fn backoff(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_guarded_counter_reaches_2n() {
        let total = Arc::new(BackoffMutex::new(0u64));
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..N {
                        let mut guard = total.lock(&ThreadBackoff);
                        let seen = *guard;
                        delay(50);
                        *guard = seen + 1;
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(*total.lock(&ThreadBackoff), 2 * N);
    }

    #[test]
    fn test_unguarded_counter_never_exceeds_2n() {
        // 读改写分成两步，两个线程交错时会丢失更新
        let total = Arc::new(AtomicU64::new(0));
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..N {
                        let seen = total.load(Ordering::Relaxed);
                        delay(50);
                        total.store(seen + 1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        let value = total.load(Ordering::Relaxed);
        assert!(value <= 2 * N);
        log::info!("unguarded counter: {} of {}", value, 2 * N);
    }

    #[test]
    fn test_failed_acquire_backs_off() {
        let mutex = Arc::new(BackoffMutex::new(()));
        let guard = mutex.lock(&ThreadBackoff);
        let backoffs = Arc::new(AtomicU64::new(0));

        let (m, b) = (mutex.clone(), backoffs.clone());
        let waiter = thread::spawn(move || {
            drop(m.lock(&CountingBackoff(b)));
        });

        while backoffs.load(Ordering::SeqCst) == 0 {
            thread::yield_now();
        }
        drop(guard);
        waiter.join().unwrap();
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_try_lock() {
        let mutex = BackoffMutex::new(7);
        let guard = mutex.try_lock().unwrap();
        assert!(mutex.try_lock().is_none());
        drop(guard);
        assert_eq!(mutex.into_inner(), 7);
    }
}
