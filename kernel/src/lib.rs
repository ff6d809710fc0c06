//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Burst: 一个运行在宿主线程上的 xv6 风格进程管理内核
//!
//! - 固定容量的进程表，一把自旋锁保护全部进程状态
//! - 每个 CPU 一个调度循环，FCFS / SJF / HBSJF 三种选择策略
//! - 睡眠/唤醒、fork/exit/wait/kill
//! - burst_time 与时间片簿记
//! - 自旋锁与退避互斥锁

#[macro_use]
pub mod print;

pub mod arch;
pub mod config;
pub mod console;
pub mod errno;
pub mod fs;
pub mod kernel;
pub mod logger;
pub mod machine;
pub mod mm;
pub mod process;
pub mod sched;
pub mod sync;
pub mod syscall;
pub mod trap;

pub use errno::Errno;
pub use kernel::{Kernel, KernelConfig};
pub use machine::{KernelPanic, Machine};
pub use process::{Pid, ProcStat, ProcState, ProcessInfo};
pub use sched::PolicyKind;
pub use sync::{BackoffMutex, SpinLock};
pub use syscall::UserProc;
