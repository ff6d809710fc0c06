//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 同步原语 (Synchronization Primitives)
//!
//! 两种锁都建立在同一个原子交换之上：
//! - 自旋锁：获取失败时忙等，不让出 CPU，临界区只能是几条指令
//! - 退避互斥锁：获取失败时让出 CPU 一段固定时间再重试

pub mod mutex;
pub mod spinlock;

pub use mutex::{Backoff, BackoffMutex, BackoffMutexGuard, ThreadBackoff};
pub use spinlock::{RawSpinLock, SpinLock, SpinLockGuard};
