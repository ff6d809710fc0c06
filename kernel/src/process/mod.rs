//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程管理模块
//!
//! - `proc`: 进程控制块与状态机
//! - `pid`: PID 分配
//! - `table`: 进程表与槽位分配
//! - `fork`: userinit / fork
//! - `exit`: exit / kill
//! - `wait`: 回收子进程
//! - `info`: getNumProc / getMaxPid / getProcInfo / pstate / procdump

pub mod exit;
pub mod fork;
pub mod info;
pub mod pid;
pub mod proc;
pub mod table;
pub mod wait;

pub use info::{ProcStat, ProcessInfo};
pub use pid::PID_INIT;
pub use proc::{Channel, Pid, Proc, ProcFlags, ProcState, Program, TrapFrame};
pub use table::{ProcTable, TableGuard, TableInner};
