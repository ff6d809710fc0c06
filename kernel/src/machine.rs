//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 模拟机启动与关机
//!
//! 启动流程：
//! 1. 初始化日志
//! 2. 建立内核上下文（进程表、CPU 描述符、调度策略）
//! 3. 创建根进程 (userinit)
//! 4. 每个 CPU 启动一个宿主线程进入调度循环
//!
//! 根进程的程序返回即关机。任何线程里的内核 panic 都会让整台机器
//! 停机，[`Machine::wait`] 把第一条 panic 消息交给调用者。

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::arch::cpu;
use crate::errno::Errno;
use crate::kernel::{Kernel, KernelConfig};
use crate::logger;
use crate::syscall::UserProc;

/// 机器因致命错误停机
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelPanic {
    pub message: String,
}

impl fmt::Display for KernelPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kernel panic: {}", self.message)
    }
}

impl std::error::Error for KernelPanic {}

pub struct Machine {
    kernel: Arc<Kernel>,
    cpus: Vec<JoinHandle<()>>,
}

impl Machine {
    /// 启动一台机器，根进程运行 `init`
    pub fn boot<F>(config: KernelConfig, init: F) -> Result<Machine, Errno>
    where
        F: FnOnce(&UserProc) + Send + 'static,
    {
        logger::init();
        log::info!(
            "{} v{} booting",
            crate::config::KERNEL_NAME,
            crate::config::KERNEL_VERSION
        );

        let kernel = Arc::new(Kernel::new(config));
        // 根进程在启动 CPU 上创建
        cpu::bind(kernel.cpus[0].local().clone());
        let root = kernel.userinit(Box::new(init));
        cpu::unbind();
        root?;

        let mut cpus = Vec::with_capacity(kernel.ncpu());
        for id in 0..kernel.ncpu() {
            let k = kernel.clone();
            let spawned = thread::Builder::new()
                .name(format!("cpu{}", id))
                .spawn(move || cpu_main(k, id));
            match spawned {
                Ok(handle) => cpus.push(handle),
                Err(err) => {
                    log::error!("boot: cannot start cpu{}: {}", id, err);
                    let machine = Machine { kernel, cpus };
                    machine.power_off();
                    // 已启动的 CPU 随停机退出
                    let _ = machine.wait();
                    return Err(Errno::OutOfMemory);
                }
            }
        }

        Ok(Machine { kernel, cpus })
    }

    /// 启动并一直运行到关机
    pub fn run<F>(config: KernelConfig, init: F) -> Result<(), KernelPanic>
    where
        F: FnOnce(&UserProc) + Send + 'static,
    {
        Self::boot(config, init)
            .map_err(|err| KernelPanic {
                message: format!("boot failed: {}", err),
            })?
            .wait()
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    pub fn power_off(&self) {
        self.kernel.power_off();
    }

    /// 等待关机，回收所有宿主线程
    pub fn wait(self) -> Result<(), KernelPanic> {
        for handle in self.cpus {
            // 调度线程自己捕获栈展开
            let _ = handle.join();
        }
        self.kernel.kstacks.join_all();
        log::info!("machine halted");

        match self.kernel.panic_message() {
            Some(message) => Err(KernelPanic { message }),
            None => Ok(()),
        }
    }
}

/// CPU 宿主线程入口
fn cpu_main(kernel: Arc<Kernel>, id: usize) {
    cpu::bind(kernel.cpus[id].local().clone());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| kernel.scheduler(id)));
    if let Err(payload) = outcome {
        kernel.on_thread_unwind(payload);
    }
    cpu::unbind();
}
