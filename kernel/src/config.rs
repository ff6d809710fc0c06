//! Burst 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "Burst";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// SMP 配置
// ============================================================

/// 模拟的 CPU 数量
pub const MAX_CPUS: usize = 2;

// ============================================================
// 进程配置
// ============================================================

/// 进程表槽位数
pub const NPROC: usize = 64;

/// 每个进程的打开文件数上限
pub const NOFILE: usize = 16;

/// 可同时存在的内核栈数量
pub const KSTACK_LIMIT: usize = 64;

// ============================================================
// 调度器配置
// ============================================================

/// 调度策略（fcfs | sjf | hbsjf）
pub const SCHED_POLICY: &str = "fcfs";

/// 初始全局时间片（滴答数）
pub const TIME_QUANTUM: u32 = 2000;

/// 时钟中断间隔（微秒）
pub const TICK_INTERVAL_US: u64 = 1000;

// ============================================================
// 同步原语配置
// ============================================================

/// 互斥锁退避的滴答数
pub const MUTEX_BACKOFF_TICKS: u64 = 1;

// ============================================================
// 调试配置
// ============================================================

/// 默认日志级别
pub const LOG_LEVEL: &str = "info";
