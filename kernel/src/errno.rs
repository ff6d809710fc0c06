//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程管理的可恢复错误
//!
//! 数值沿用 include/uapi/asm-generic/errno.h。内核内部以
//! `Result<T, Errno>` 传递，系统调用层统一折算为 -1 返回给用户。
//! 破坏进程表不变量的情况不在此列，它们直接 panic 停机。

use core::fmt;

/// 可恢复错误代码
///
/// 使用方法：
/// ```rust
/// use burst::errno::Errno;
///
/// fn check(n: i32) -> Result<(), Errno> {
///     if n < 1 {
///         return Err(Errno::InvalidArgument);
///     }
///     Ok(())
/// }
///
/// assert_eq!(check(0), Err(Errno::InvalidArgument));
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// No such process (ESRCH, 3)
    NoSuchProcess = 3,

    /// Interrupted system call (EINTR, 4)
    Interrupted = 4,

    /// No child process (ECHILD, 10)
    NoChild = 10,

    /// Try again (EAGAIN, 11)，进程表没有空闲槽位
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)，内核栈或地址空间分配失败
    OutOfMemory = 12,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Errno::NoSuchProcess => "ESRCH",
            Errno::Interrupted => "EINTR",
            Errno::NoChild => "ECHILD",
            Errno::TryAgain => "EAGAIN",
            Errno::OutOfMemory => "ENOMEM",
            Errno::InvalidArgument => "EINVAL",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

impl std::error::Error for Errno {}

/// 系统调用返回值：成功时的值，失败一律 -1
#[inline]
pub fn syscall_ret(result: Result<i32, Errno>) -> i32 {
    result.unwrap_or(-1)
}
