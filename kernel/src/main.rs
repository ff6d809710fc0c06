//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Burst 启动程序
//!
//! 以 Kernel.toml 配置的策略启动模拟机，根进程 fork 几个声明了
//! 不同 burst_time 的工作进程，打印 pstate，回收全部子进程后关机。

use std::process::ExitCode;

use burst::{kprintln, KernelConfig, Machine, UserProc};

/// 每个工作进程的 (burst_time, 计算轮数)
const WORKERS: [(i32, u32); 3] = [(8, 40), (2, 10), (5, 25)];

fn worker(user: &UserProc, burst: i32, rounds: u32) {
    // burst_time 记在父进程上，由孙进程替工作进程声明
    let helper = user.fork(move |u| {
        u.set_burst_time(burst);
    });
    if helper > 0 {
        user.wait();
    }
    for _ in 0..rounds {
        user.tick();
    }
    kprintln!("worker pid {} (burst {}) done", user.getpid(), burst);
}

fn init(user: &UserProc) {
    for (burst, rounds) in WORKERS {
        if user.fork(move |u| worker(u, burst, rounds)) < 0 {
            kprintln!("init: fork failed");
        }
    }
    user.pstate();
    while user.wait() > 0 {}
    kprintln!("init: all workers reaped, uptime {} ticks", user.uptime());
}

fn main() -> ExitCode {
    match Machine::run(KernelConfig::default(), init) {
        Ok(()) => ExitCode::SUCCESS,
        Err(panic) => {
            eprintln!("{}", panic);
            ExitCode::FAILURE
        }
    }
}
