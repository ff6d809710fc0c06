//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核上下文
//!
//! [`Kernel`] 汇集进程表、Per-CPU 描述符、调度策略与时钟。
//! 所有内核操作都显式地通过它访问共享状态，没有全局可变静态量。

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::arch::context::Reaped;
use crate::arch::cpu::{self, Halted};
use crate::config;
use crate::mm::KernelStacks;
use crate::process::ProcTable;
use crate::sched::percpu::Cpu;
use crate::sched::policy::{PolicyKind, SchedPolicy};
use crate::sync::SpinLock;
use crate::trap::Clock;

/// 启动参数
///
/// 默认值来自 Kernel.toml 生成的编译期常量；启动前可以逐项覆盖，
/// 启动后在整台机器的生命周期内不再改变。
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub ncpu: usize,
    pub nproc: usize,
    pub nofile: usize,
    pub kstack_limit: usize,
    pub policy: PolicyKind,
    pub time_quantum: u32,
    pub tick_interval: Duration,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            ncpu: config::MAX_CPUS,
            nproc: config::NPROC,
            nofile: config::NOFILE,
            kstack_limit: config::KSTACK_LIMIT,
            policy: PolicyKind::configured(),
            time_quantum: config::TIME_QUANTUM,
            tick_interval: Duration::from_micros(config::TICK_INTERVAL_US),
        }
    }
}

impl KernelConfig {
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ncpu(mut self, ncpu: usize) -> Self {
        self.ncpu = ncpu;
        self
    }

    pub fn with_nproc(mut self, nproc: usize) -> Self {
        self.nproc = nproc;
        self
    }

    pub fn with_kstack_limit(mut self, limit: usize) -> Self {
        self.kstack_limit = limit;
        self
    }

    pub fn with_time_quantum(mut self, quantum: u32) -> Self {
        self.time_quantum = quantum;
        self
    }
}

pub struct Kernel {
    config: KernelConfig,
    pub(crate) ptable: ProcTable,
    pub(crate) cpus: Vec<Cpu>,
    pub(crate) policy: Box<dyn SchedPolicy>,
    /// 全局时间片，只会被 set_burst_time 调小
    pub(crate) quantum: AtomicU32,
    pub(crate) ticks: SpinLock<u64>,
    pub(crate) clock: Clock,
    pub(crate) kstacks: KernelStacks,
    halted: Arc<AtomicBool>,
    panic_message: spin::Mutex<Option<String>>,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        assert!(config.ncpu >= 1, "at least one cpu");
        assert!(config.time_quantum >= 1, "time quantum must be positive");

        let halted = Arc::new(AtomicBool::new(false));
        let cpus = (0..config.ncpu).map(|id| Cpu::new(id, &halted)).collect();
        let policy = config.policy.build();
        log::info!(
            "kernel: {} cpus, {} slots, policy {}, quantum {}",
            config.ncpu,
            config.nproc,
            policy.name(),
            config.time_quantum
        );

        Self {
            ptable: ProcTable::new(config.nproc, config.nofile),
            cpus,
            policy,
            quantum: AtomicU32::new(config.time_quantum),
            ticks: SpinLock::new("time", 0),
            clock: Clock::new(config.tick_interval),
            kstacks: KernelStacks::new(config.kstack_limit, halted.clone()),
            halted,
            panic_message: spin::Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn ncpu(&self) -> usize {
        self.cpus.len()
    }

    /// 当前 CPU 的描述符，调用时必须已关中断
    pub fn mycpu(&self) -> &Cpu {
        if cpu::irq_enabled() {
            panic!("mycpu called with interrupts enabled");
        }
        let id = cpu::cpu_id();
        self.cpus
            .get(id)
            .unwrap_or_else(|| panic!("unknown apicid {}", id))
    }

    /// 当前 CPU 上运行的进程槽位
    pub fn myproc(&self) -> Option<usize> {
        cpu::push_off();
        let slot = self.mycpu().proc();
        cpu::pop_off();
        slot
    }

    pub(crate) fn current(&self) -> usize {
        self.myproc()
            .unwrap_or_else(|| panic!("no process on cpu {}", cpu::cpu_id()))
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// 关机：所有调度循环退出，阻塞中的执行流随之展开
    pub fn power_off(&self) {
        if !self.halted.swap(true, Ordering::AcqRel) {
            log::info!("kernel: power off");
        }
    }

    /// 致命错误停机，只记录第一条消息
    pub(crate) fn halt_with(&self, message: String) {
        {
            let mut slot = self.panic_message.lock();
            if slot.is_none() {
                log::error!("kernel panic: {}", message);
                *slot = Some(message);
            }
        }
        self.halted.store(true, Ordering::Release);
    }

    pub fn panic_message(&self) -> Option<String> {
        self.panic_message.lock().clone()
    }

    /// 宿主线程栈展开后的处理
    ///
    /// 回收与停机是正常结束；其余载荷都是内核 panic。
    pub(crate) fn on_thread_unwind(&self, payload: Box<dyn Any + Send>) {
        if payload.is::<Reaped>() || payload.is::<Halted>() {
            return;
        }
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        self.halt_with(message);
    }
}
